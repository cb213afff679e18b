//! Product page scraping tool

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::Result;
use crate::mcp::{McpTool, McpToolResult};
use crate::product::{ProductFetcher, jsonld_product_data};

/// Returns the first JSON-LD record embedded in a product page
pub struct McpJsonLdProductDataTool {
    fetcher: Arc<dyn ProductFetcher>,
}

impl McpJsonLdProductDataTool {
    pub fn new(fetcher: Arc<dyn ProductFetcher>) -> Self {
        Self { fetcher }
    }
}

#[derive(Debug, Deserialize)]
struct ProductDataArgs {
    url: String,
}

#[async_trait]
impl McpTool for McpJsonLdProductDataTool {
    fn name(&self) -> &str {
        "get_jsonld_product_data"
    }

    fn description(&self) -> &str {
        "get the JSON-LD structured data embedded in a product page"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "http or https URL of the product page"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<McpToolResult> {
        let args: ProductDataArgs = serde_json::from_value(arguments).map_err(|e| {
            crate::Error::InvalidArgument(format!("Invalid get_jsonld_product_data arguments: {e}"))
        })?;

        info!("Fetching product data from {}", args.url);
        let data = jsonld_product_data(self.fetcher.as_ref(), &args.url).await?;
        McpToolResult::json(&data)
    }
}
