use async_trait::async_trait;
use regex::Regex;

use docsnip_core::config::FetchSettings;
use docsnip_core::error::{Error, FetchError, Result};
use docsnip_core::traits::PageFetcher;

/// Reduces an HTML document to its visible text.
///
/// Drops `<script>`/`<style>` blocks and every tag, decodes the common
/// entities and collapses whitespace runs to single spaces.
pub struct HtmlCleaner {
    blocks: Regex,
    tags: Regex,
    spaces: Regex,
}

impl HtmlCleaner {
    pub fn new() -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            blocks: Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>")?,
            tags: Regex::new(r"(?s)<[^>]+>")?,
            spaces: Regex::new(r"\s+")?,
        })
    }

    pub fn clean(&self, html: &str) -> String {
        let text = self.blocks.replace_all(html, " ");
        let text = self.tags.replace_all(&text, " ");
        let text = decode_entities(&text);
        self.spaces.replace_all(&text, " ").trim().to_string()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn looks_like_html(content_type: Option<&str>, body: &str) -> bool {
    if let Some(ct) = content_type {
        return ct.to_ascii_lowercase().contains("html");
    }
    let head = body.trim_start().chars().take(256).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Plain GET fetcher. HTML responses are cleaned to text, anything else is
/// returned as served.
pub struct HttpFetcher {
    client: reqwest::Client,
    cleaner: HtmlCleaner,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.client_timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;
        let cleaner = HtmlCleaner::new().map_err(|e| Error::Operation(e.to_string()))?;
        Ok(Self { client, cleaner })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| FetchError::Network(e.to_string()))?;
        let text = if looks_like_html(content_type.as_deref(), &body) {
            self.cleaner.clean(&body)
        } else {
            body.trim().to_string()
        };
        if text.is_empty() {
            return Err(FetchError::EmptyExtraction);
        }
        Ok(text)
    }
}
