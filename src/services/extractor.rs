//! HTML-to-text extraction behind a pluggable interface.
//!
//! The pipeline depends on [`ContentExtractor`] abstractly so the extraction
//! quality can evolve without touching the pipeline's control flow.

use scraper::{Html, Selector};

use crate::error::ExtractError;
use crate::utils::text::{collapse_whitespace, has_meaningful_content};

/// Turns raw page HTML into plain text suitable for chunking.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<String, ExtractError>;
}

/// Default extractor built on the `scraper` crate.
///
/// Prefers the main content region when one is marked up, strips
/// navigation chrome, and collapses the remaining text.
#[derive(Debug, Clone, Default)]
pub struct HtmlTextExtractor;

/// Elements whose text never belongs in the cleaned document.
const CHROME_SELECTOR: &str = "nav, header, footer, aside, script, style, iframe, noscript";

/// Content-region candidates, most specific first.
const CONTENT_SELECTORS: &[&str] = &["main", "article", r#"[role="main"]"#, "body"];

impl HtmlTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn strip_chrome(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        let chrome = Selector::parse(CHROME_SELECTOR).expect("valid selector");

        let mut result = html.to_string();
        for el in doc.select(&chrome) {
            let outer = el.html();
            result = result.replace(&outer, "");
        }
        result
    }
}

impl ContentExtractor for HtmlTextExtractor {
    fn extract(&self, html: &str) -> Result<String, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        // Serialize the content region first so strip_chrome's outer-HTML
        // replacement operates on parser-normalized markup.
        let doc = Html::parse_document(html);
        let mut region = None;
        for sel_str in CONTENT_SELECTORS {
            let sel = Selector::parse(sel_str).expect("valid selector");
            if let Some(el) = doc.select(&sel).next() {
                region = Some(el.inner_html());
                break;
            }
        }
        let Some(region) = region else {
            return Err(ExtractError::EmptyDocument);
        };

        let cleaned = Self::strip_chrome(&region);
        let fragment = Html::parse_fragment(&cleaned);
        let text = fragment
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ");

        let text = collapse_whitespace(&text);
        if !has_meaningful_content(&text) {
            return Err(ExtractError::NoContent);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(s: &str) -> String {
        format!(
            "{} This trailing sentence pads the body far enough past the minimum \
             meaningful-content threshold used by the extractor.",
            s
        )
    }

    #[test]
    fn test_extracts_body_text() {
        let html = format!("<html><body><p>{}</p></body></html>", pad("Product overview."));
        let text = HtmlTextExtractor::new().extract(&html).unwrap();
        assert!(text.starts_with("Product overview."));
    }

    #[test]
    fn test_prefers_main_region() {
        let html = format!(
            "<html><body><div>unrelated sidebar</div><main><p>{}</p></main></body></html>",
            pad("The main region.")
        );
        let text = HtmlTextExtractor::new().extract(&html).unwrap();
        assert!(text.contains("The main region."));
        assert!(!text.contains("unrelated sidebar"));
    }

    #[test]
    fn test_strips_chrome_elements() {
        let html = format!(
            "<html><body><nav>Home | About</nav><script>var x = 1;</script><p>{}</p>\
             <footer>Copyright</footer></body></html>",
            pad("Visible content.")
        );
        let text = HtmlTextExtractor::new().extract(&html).unwrap();
        assert!(text.contains("Visible content."));
        assert!(!text.contains("Home | About"));
        assert!(!text.contains("var x = 1"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_empty_html_is_an_error() {
        assert!(matches!(
            HtmlTextExtractor::new().extract("   "),
            Err(ExtractError::EmptyDocument)
        ));
    }

    #[test]
    fn test_chrome_only_page_has_no_content() {
        let html = "<html><body><nav>Home About Contact Pricing Blog Careers</nav></body></html>";
        assert!(matches!(
            HtmlTextExtractor::new().extract(html),
            Err(ExtractError::NoContent)
        ));
    }
}
