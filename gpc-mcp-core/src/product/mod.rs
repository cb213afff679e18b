//! Structured product data scraped from web pages

mod extract;
mod fetch;

pub use extract::extract_jsonld;
pub use fetch::{HttpFetcher, ProductFetcher, parse_page_url};

use serde_json::Value;

use crate::{Error, Result};

/// Fetch `url` and return the first JSON-LD record on the page.
///
/// A page without any JSON-LD yields [`Error::NoStructuredData`].
pub async fn jsonld_product_data(fetcher: &dyn ProductFetcher, url: &str) -> Result<Value> {
    let url = parse_page_url(url)?;
    let html = fetcher.fetch_html(&url).await?;
    extract_jsonld(&html)
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoStructuredData(url.to_string()))
}
