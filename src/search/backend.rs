//! Search backends.
//!
//! Provides DuckDuckGo (zero-config, HTML scraping) and Brave Search (API
//! key required) as interchangeable [`SearchBackend`] implementations. Both
//! return structured [`Snippet`] lists with typed [`SearchError`] failures;
//! retry and timeout policy live in the wrapping [`super::SearchClient`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::Snippet;
use crate::error::SearchError;

const DDG_BASE_URL: &str = "https://lite.duckduckgo.com/lite/";
const BRAVE_BASE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// One outbound search request. Implementations perform a single attempt;
/// the caller owns retries and deadlines.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>, SearchError>;
}

// ---------------------------------------------------------------------------
// DuckDuckGo
// ---------------------------------------------------------------------------

/// Search DuckDuckGo via the lite HTML endpoint.
///
/// Sends a GET request to `https://lite.duckduckgo.com/lite/` and parses
/// result links, titles, and excerpts from the table-based HTML layout
/// using CSS selectors.
pub struct DuckDuckGo {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0")
            .build()
            .map_err(|e| SearchError::Transport(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url: DDG_BASE_URL.to_string(),
        })
    }

    /// Point at a different endpoint. Used by tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGo {
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>, SearchError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("DuckDuckGo request failed: {e}")))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited {
                retry_after: parse_retry_after(resp.headers()),
            });
        }
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let html = resp
            .text()
            .await
            .map_err(|e| SearchError::Transport(format!("failed to read DDG response: {e}")))?;

        Ok(parse_ddg_lite_html(&html, max_results))
    }
}

/// Parse DuckDuckGo Lite HTML to extract search results.
///
/// The DDG lite page uses a table layout where result rows contain:
/// - A link (`<a>`) with the result URL and title text
/// - A subsequent row with the excerpt text in a `<td>` with class `result-snippet`
fn parse_ddg_lite_html(html: &str, max_results: usize) -> Vec<Snippet> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);

    let link_selector = Selector::parse("a.result-link").unwrap();
    let excerpt_selector = Selector::parse("td.result-snippet").unwrap();

    let links: Vec<_> = document.select(&link_selector).collect();
    let excerpts: Vec<_> = document.select(&excerpt_selector).collect();

    let mut snippets = Vec::new();

    for (i, link) in links.iter().enumerate() {
        if snippets.len() >= max_results {
            break;
        }

        let title = link.text().collect::<String>().trim().to_string();
        let url = link.value().attr("href").unwrap_or("").trim().to_string();

        // Skip empty/invalid results
        if title.is_empty() || url.is_empty() {
            continue;
        }

        let excerpt = excerpts
            .get(i)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        snippets.push(Snippet {
            title,
            url,
            excerpt,
        });
    }

    snippets
}

// ---------------------------------------------------------------------------
// Brave Search
// ---------------------------------------------------------------------------

/// Search using the Brave Search REST API.
///
/// Requires a valid API key (`X-Subscription-Token` header). The JSON
/// response is validated against a strict schema; results come from the
/// `web.results` array.
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Deserialize)]
struct BraveResult {
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

impl BraveSearch {
    pub fn new(api_key: String) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SearchError::Transport(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: BRAVE_BASE_URL.to_string(),
        })
    }

    /// Point at a different endpoint. Used by tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchBackend for BraveSearch {
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Snippet>, SearchError> {
        let resp = self
            .client
            .get(&self.base_url)
            .header("X-Subscription-Token", &self.api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", &max_results.to_string())])
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("Brave request failed: {e}")))?;

        let status = resp.status();

        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited {
                retry_after: parse_retry_after(resp.headers()),
            });
        }
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let body: BraveResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::MalformedPayload(format!("Brave response: {e}")))?;

        let snippets = body
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .map(|r| Snippet {
                title: r.title,
                url: r.url,
                excerpt: r.description,
            })
            .collect();

        Ok(snippets)
    }
}

/// Read a `Retry-After` seconds value from response headers, if present.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
