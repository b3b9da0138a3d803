//! Web search backed by the DuckDuckGo HTML endpoint.

use crate::error::{Result, SleuthError};
use crate::llm::create_http_client;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DUCKDUCKGO_HTML: &str = "https://html.duckduckgo.com/html/";

/// Trait for web search backends.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Return up to `max_results` result URLs for `query`.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>>;
}

/// Scrapes result links from DuckDuckGo's HTML-only page.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    endpoint: String,
    user_agent: String,
}

impl DuckDuckGoSearch {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_http_client(timeout)?,
            endpoint: DUCKDUCKGO_HTML.to_string(),
            user_agent: user_agent.to_string(),
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|e| SleuthError::Search(format!("Invalid search URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SleuthError::Search(format!(
                "Search endpoint returned {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        let urls = extract_result_links(&html, max_results);
        debug!("Found {} result links", urls.len());
        Ok(urls)
    }
}

/// Pull result URLs out of a DuckDuckGo HTML results page.
///
/// Redirect links (`/l/?uddg=...`) are unwrapped, ads and duplicates skipped.
pub fn extract_result_links(html: &str, max_results: usize) -> Vec<String> {
    static ANCHOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"<a[^>]*class="[^"]*result__a[^"]*"[^>]*>"#).unwrap());
    static HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).unwrap());

    let mut urls: Vec<String> = Vec::new();
    for tag in ANCHOR_RE.find_iter(html) {
        if urls.len() >= max_results {
            break;
        }
        let Some(raw) = HREF_RE.captures(tag.as_str()).and_then(|c| c.get(1)) else {
            continue;
        };
        if let Some(target) = resolve_link(raw.as_str()) {
            if !urls.contains(&target) {
                urls.push(target);
            }
        }
    }
    urls
}

fn resolve_link(raw: &str) -> Option<String> {
    let raw = raw.replace("&amp;", "&");
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw
    };

    let parsed = Url::parse(&absolute).ok()?;
    let host = parsed.host_str()?;

    let target = if host.ends_with("duckduckgo.com") {
        if parsed.path() != "/l/" {
            return None;
        }
        let (_, value) = parsed.query_pairs().find(|(key, _)| key == "uddg")?;
        Url::parse(&value).ok()?
    } else {
        parsed
    };

    match target.scheme() {
        "http" | "https" => Some(target.to_string()),
        _ => None,
    }
}
