//! Page fetching for product data scraping

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::FetchConfig;
use crate::{Error, Result};

/// Retrieves the HTML of a product page
#[async_trait]
pub trait ProductFetcher: Send + Sync {
    async fn fetch_html(&self, url: &Url) -> Result<String>;
}

/// reqwest-backed fetcher with a fixed per-request timeout
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProductFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &Url) -> Result<String> {
        debug!("Fetching product page {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Parse and restrict a caller supplied URL to http(s)
pub fn parse_page_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|e| Error::InvalidArgument(format!("'{input}' is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::InvalidArgument(format!(
            "unsupported URL scheme '{scheme}', expected http or https"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_url_accepts_http_and_https() {
        assert!(parse_page_url("https://shop.example.com/p/123").is_ok());
        assert!(parse_page_url(" http://localhost:8080/item ").is_ok());
    }

    #[test]
    fn test_parse_page_url_rejects_other_schemes() {
        for bad in ["file:///etc/passwd", "ftp://example.com/x", "not a url", ""] {
            let err = parse_page_url(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_http_fetcher_builds_from_default_config() {
        assert!(HttpFetcher::new(&FetchConfig::default()).is_ok());
    }
}
