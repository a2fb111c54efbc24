//! Depth-bounded, deduplicating website crawler.
//!
//! Traversal is depth-first over a frontier stack; fetches within one
//! dispatch round run concurrently under a semaphore bound, so completion
//! order is not guaranteed even though discovery order is depth-first.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;
use crate::models::{CrawlConfig, FetchFailure, HtmlFragment, PageRecord};
use crate::utils::url::{matches_page_type, normalize_url};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("siteqa/", env!("CARGO_PKG_VERSION"));

/// Result of one crawl: successfully scraped pages and per-page failures.
///
/// A fetch failure never halts the traversal; the failed page's outbound
/// links are simply never explored.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub pages: Vec<PageRecord>,
    pub failures: Vec<FetchFailure>,
}

impl CrawlOutcome {
    /// Distinct URLs dequeued from the frontier: every one either produced
    /// a page record or a recorded failure.
    pub fn urls_dequeued(&self) -> usize {
        self.pages.len() + self.failures.len()
    }
}

/// Web crawler with scope-aware, bounded-concurrency page fetching.
pub struct Crawler {
    config: CrawlConfig,
    client: Client,
}

impl Crawler {
    /// Create a new crawler with the given configuration.
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Crawl from the seed URLs, following links whose path falls under one
    /// of `page_types`, to at most `max_depth` links from a seed.
    ///
    /// Seeds are always fetched; the page-type filter gates only discovered
    /// links. URLs are deduplicated by their normalized form, so aliases
    /// differing in fragment, trailing slash, or host case are fetched once.
    pub async fn crawl(
        &self,
        seed_urls: &[String],
        page_types: &[String],
        max_depth: u32,
    ) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: Vec<(Url, u32)> = Vec::new();

        // Seeds are pushed in reverse so the first seed is popped first.
        for seed in seed_urls.iter().rev() {
            match Url::parse(seed) {
                Ok(url) => frontier.push((url, 0)),
                Err(e) => {
                    outcome
                        .failures
                        .push(FetchFailure::new(seed, FetchError::InvalidUrl(e.to_string())));
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let delay = Duration::from_millis(self.config.request_delay_ms);

        info!(
            seeds = seed_urls.len(),
            max_depth,
            concurrency = self.config.concurrency,
            "starting crawl"
        );

        while !frontier.is_empty() {
            // Take a dispatch round from the top of the stack, skipping
            // anything already visited. Entries are marked visited at pop
            // time, before their fetch is dispatched.
            let mut batch: Vec<(Url, u32)> = Vec::new();
            while batch.len() < self.config.concurrency {
                let Some((url, depth)) = frontier.pop() else {
                    break;
                };
                let normalized = normalize_url(&url);
                if !visited.insert(normalized) {
                    continue;
                }
                batch.push((url, depth));
            }

            let mut handles = Vec::with_capacity(batch.len());
            for (url, depth) in batch {
                // Pacing between fetch dispatches, not a concurrency bound.
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let client = self.client.clone();
                let sem = semaphore.clone();
                handles.push(tokio::spawn(async move {
                    let _permit = sem.acquire().await.expect("semaphore closed");
                    let result = fetch_page(&client, &url).await;
                    (url, depth, result)
                }));
            }

            for handle in handles {
                let (url, depth, result) = match handle.await {
                    Ok(tuple) => tuple,
                    Err(e) => {
                        warn!(error = %e, "fetch task failed");
                        continue;
                    }
                };

                match result {
                    Ok(html) => {
                        let parsed = parse_page(&url, &html, page_types);
                        debug!(url = %url, depth, links = parsed.links.len(), "page fetched");

                        if depth < max_depth {
                            for link in parsed.links {
                                if visited.contains(&normalize_url(&link)) {
                                    continue;
                                }
                                frontier.push((link, depth + 1));
                            }
                        }

                        outcome.pages.push(PageRecord::new(
                            url.as_str(),
                            parsed.title,
                            parsed.page_type,
                            vec![HtmlFragment {
                                url: url.to_string(),
                                html,
                                index: 0,
                            }],
                        ));
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "fetch failed");
                        outcome.failures.push(FetchFailure::new(url.as_str(), e));
                    }
                }
            }
        }

        info!(
            pages = outcome.pages.len(),
            failures = outcome.failures.len(),
            "crawl completed"
        );

        outcome
    }
}

async fn fetch_page(client: &Client, url: &Url) -> Result<String, FetchError> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout(url.to_string())
        } else {
            FetchError::RequestError(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(FetchError::RequestError)
}

struct ParsedPage {
    title: String,
    page_type: String,
    links: Vec<Url>,
}

/// Extract the title, page type, and admissible outbound links.
///
/// Synchronous on purpose: `scraper::Html` is not `Send`, so it must never
/// be held across an await point inside a spawned fetch task.
fn parse_page(base: &Url, html: &str, page_types: &[String]) -> ParsedPage {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").expect("valid selector");
    let h1_sel = Selector::parse("h1").expect("valid selector");
    let title = doc
        .select(&title_sel)
        .next()
        .or_else(|| doc.select(&h1_sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| base.to_string());

    let link_sel = Selector::parse("a[href]").expect("valid selector");
    let links: Vec<Url> = doc
        .select(&link_sel)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .filter(|link| link.host_str() == base.host_str())
        .filter(|link| matches_page_type(link, page_types))
        .collect();

    ParsedPage {
        title,
        page_type: page_type_of(base, page_types),
        links,
    }
}

/// The page-type section a URL falls under, or "general" when none match
/// (seed pages are fetched regardless of the filter).
fn page_type_of(url: &Url, page_types: &[String]) -> String {
    page_types
        .iter()
        .find(|pt| matches_page_type(url, std::slice::from_ref(pt)))
        .map(|pt| pt.trim_matches('/').to_string())
        .unwrap_or_else(|| "general".to_string())
}
