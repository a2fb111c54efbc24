//! Page models produced by the crawler and the content extractor.

use serde::{Deserialize, Serialize};

/// One fetched HTML fragment belonging to a logical page.
///
/// A page record may aggregate several fragments when related sub-pages are
/// fetched as part of the same logical unit; `index` preserves discovery
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlFragment {
    pub url: String,
    pub html: String,
    pub index: usize,
}

/// A successfully scraped page, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub page_type: String,
    pub html_fragments: Vec<HtmlFragment>,
    pub scraped_at: String,
}

impl PageRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        page_type: impl Into<String>,
        html_fragments: Vec<HtmlFragment>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            page_type: page_type.into(),
            html_fragments,
            scraped_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Plain-text form of a page, derived 1:1 from a [`PageRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedDocument {
    pub url: String,
    pub title: String,
    pub page_type: String,
    pub text: String,
}

/// A page fetch that failed during a crawl.
///
/// Recorded and carried into the run metrics; never aborts the traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

impl FetchFailure {
    pub fn new(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_record_stamps_scrape_time() {
        let page = PageRecord::new("https://e.com/products/a", "A", "products", vec![]);
        assert!(!page.scraped_at.is_empty());
        assert_eq!(page.page_type, "products");
    }

    #[test]
    fn test_fragment_order_preserved() {
        let fragments = vec![
            HtmlFragment {
                url: "https://e.com/products/a".into(),
                html: "<p>root</p>".into(),
                index: 0,
            },
            HtmlFragment {
                url: "https://e.com/products/a/detail".into(),
                html: "<p>detail</p>".into(),
                index: 1,
            },
        ];
        let page = PageRecord::new("https://e.com/products/a", "A", "products", fragments);
        let indices: Vec<usize> = page.html_fragments.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
