//! Page and PDF fetching.
//!
//! Pages are reduced to readable text with a handful of regex passes. PDFs
//! are downloaded to a temporary file and converted by `pdftotext`
//! (poppler-utils), the same way external media tools are driven elsewhere.

use crate::error::{Result, SleuthError};
use crate::llm::create_http_client;
use async_trait::async_trait;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Trait for retrieving document text from a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch an HTML (or plain text) page and return its readable text.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Fetch a PDF and return its extracted text.
    async fn fetch_pdf(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher using reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_http_client(timeout)?,
            user_agent: user_agent.to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| SleuthError::Fetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(SleuthError::Fetch(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("html"))
            .unwrap_or(true);

        let body = response.text().await?;
        debug!("Fetched {} bytes", body.len());

        if is_html {
            Ok(html_to_text(&body))
        } else {
            Ok(body)
        }
    }

    #[instrument(skip(self))]
    async fn fetch_pdf(&self, url: &str) -> Result<String> {
        let bytes = self.get(url).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(SleuthError::Fetch(format!("{} returned an empty body", url)));
        }
        debug!("Downloaded {} byte PDF", bytes.len());

        let mut file = tempfile::Builder::new()
            .prefix("sleuth-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;

        pdf_to_text(file.path()).await
    }
}

/// Extract the text of a local PDF with `pdftotext`.
#[instrument]
pub async fn pdf_to_text(path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SleuthError::ToolNotFound("pdftotext".to_string())
            } else {
                SleuthError::ToolFailed(format!("pdftotext: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SleuthError::ToolFailed(format!("pdftotext: {}", stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

static HIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|head|svg)\b.*?</(script|style|noscript|head|svg)>").unwrap()
});
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|section|article|blockquote)>").unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Reduce an HTML document to its visible text, one block per line.
pub fn html_to_text(html: &str) -> String {
    let text = HIDDEN_RE.replace_all(html, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = BREAK_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, " ");
    let text = decode_entities(&text);

    let lines: Vec<String> = text
        .lines()
        .map(|line| SPACE_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_strips_markup() {
        let html = r#"<html><head><title>T</title><style>body { color: red; }</style></head>
<body>
  <script>var x = "<p>not text</p>";</script>
  <h1>Rust   Ownership</h1>
  <p>Values have <b>one</b> owner.<br/>Borrowing is &quot;cheap&quot; &amp; safe.</p>
  <!-- hidden comment -->
  <ul><li>Move</li><li>Copy</li></ul>
</body></html>"#;

        let text = html_to_text(html);
        assert_eq!(
            text,
            "Rust Ownership\nValues have one owner.\nBorrowing is \"cheap\" & safe.\nMove\nCopy"
        );
    }

    #[test]
    fn test_html_to_text_on_plain_text() {
        assert_eq!(html_to_text("just words"), "just words");
        assert_eq!(html_to_text("<div>   </div>"), "");
    }

    #[test]
    fn test_html_to_text_is_stable_across_calls() {
        let page = "<p>first&nbsp;line</p><script>skip()</script><p>second</p>";
        let first = html_to_text(page);
        for _ in 0..50 {
            assert_eq!(html_to_text(page), first);
        }
        assert_eq!(first, "first line\nsecond");
    }

    #[test]
    fn test_decode_entities_order() {
        // "&amp;lt;" must decode to the literal "&lt;", not "<"
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[tokio::test]
    async fn test_pdf_to_text_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = pdf_to_text(&dir.path().join("nope.pdf")).await;
        assert!(matches!(
            result,
            Err(SleuthError::ToolNotFound(_)) | Err(SleuthError::ToolFailed(_))
        ));
    }
}
