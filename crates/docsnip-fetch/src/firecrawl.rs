use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use docsnip_core::config::FetchSettings;
use docsnip_core::error::{Error, FetchError, Result};
use docsnip_core::traits::PageFetcher;

/// Fetches pages through the Firecrawl scrape API and returns their markdown.
pub struct FirecrawlFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<ScrapeData>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

impl FirecrawlFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let api_key = settings.firecrawl_key().ok_or_else(|| {
            Error::InvalidConfig("firecrawl provider needs fetch.firecrawl_api_key or FIRECRAWL_API_KEY".into())
        })?;
        let client = reqwest::Client::builder()
            .timeout(settings.client_timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;
        let endpoint = format!("{}/v1/scrape", settings.firecrawl_base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint, api_key })
    }
}

fn markdown_from(response: ScrapeResponse) -> std::result::Result<String, FetchError> {
    if !response.success {
        return Err(FetchError::Provider(
            response.error.unwrap_or_else(|| "scrape reported failure".to_string()),
        ));
    }
    match response.data.and_then(|d| d.markdown) {
        Some(md) if !md.trim().is_empty() => Ok(md),
        _ => Err(FetchError::EmptyExtraction),
    }
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    fn name(&self) -> &str {
        "firecrawl"
    }

    async fn fetch_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({ "url": url, "formats": ["markdown"] }))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Provider(format!("unreadable scrape response: {}", e)))?;
        markdown_from(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ScrapeResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn extracts_markdown_from_success() {
        let body = parse(r##"{"success":true,"data":{"markdown":"# Billing\nRefunds take a week.","metadata":{}}}"##);
        assert_eq!(markdown_from(body).unwrap(), "# Billing\nRefunds take a week.");
    }

    #[test]
    fn empty_markdown_is_empty_extraction() {
        let body = parse(r#"{"success":true,"data":{"markdown":"   "}}"#);
        assert!(matches!(markdown_from(body), Err(FetchError::EmptyExtraction)));
        let body = parse(r#"{"success":true,"data":{}}"#);
        assert!(matches!(markdown_from(body), Err(FetchError::EmptyExtraction)));
    }

    #[test]
    fn provider_failure_carries_message() {
        let body = parse(r#"{"success":false,"error":"blocked by robots.txt"}"#);
        match markdown_from(body) {
            Err(FetchError::Provider(msg)) => assert_eq!(msg, "blocked by robots.txt"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let settings = FetchSettings { firecrawl_api_key: Some("  ".into()), ..FetchSettings::default() };
        if std::env::var("FIRECRAWL_API_KEY").is_err() {
            assert!(matches!(FirecrawlFetcher::new(&settings), Err(Error::InvalidConfig(_))));
        }
    }
}
