//! MCP tool wrappers for the GPC taxonomy

#[macro_use]
mod macros;

mod brick;
mod hierarchy;
mod product;
mod search;

use std::sync::Arc;

use serde_json::Value;

pub use brick::{
    McpGetBrickObjectTool, McpGetBrickSiblingTool, McpGetClassCodeForBrickTool,
    McpGetClassObjectForBrickTool, McpGetFamilyCodeForBrickTool, McpGetSegmentCodeForBrickTool,
};
pub use hierarchy::{
    McpGetBricksForClassTool, McpGetClassObjectTool, McpGetClassesForFamilyTool,
    McpGetFamiliesForSegmentTool, McpGetFamilyObjectTool, McpGetSegmentObjectTool,
    McpGetSegmentsTool,
};
pub use product::McpJsonLdProductDataTool;
pub use search::{McpSearchBricksTool, McpSearchClassesTool, SearchRange};

use crate::mcp::McpServer;
use crate::product::ProductFetcher;
use crate::taxonomy::{Code, TaxonomySource};
use crate::{Error, Result};

/// Input schema for a tool taking a single code argument
pub(crate) fn code_schema(arg: &str, description: &str) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        arg.to_string(),
        serde_json::json!({
            "type": ["string", "integer"],
            "description": description
        }),
    );
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": [arg]
    })
}

/// Pull a code out of the call arguments through `Code`'s own
/// deserializer, so strings and integers are accepted alike
pub(crate) fn code_argument(arguments: &Value, field: &str) -> Result<Code> {
    let value = arguments
        .get(field)
        .ok_or_else(|| Error::InvalidArgument(format!("missing field `{field}`")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| Error::InvalidArgument(format!("invalid `{field}`: {e}")))
}

/// Register every GPC tool on `server`
pub async fn register_gpc_tools(
    server: &McpServer,
    taxonomy: Arc<dyn TaxonomySource>,
    fetcher: Arc<dyn ProductFetcher>,
) {
    let t = || Arc::clone(&taxonomy);

    server.register_tool(Arc::new(McpGetBrickObjectTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetClassCodeForBrickTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetFamilyCodeForBrickTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetSegmentCodeForBrickTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetClassObjectForBrickTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetBrickSiblingTool::new(t()))).await;

    server.register_tool(Arc::new(McpGetBricksForClassTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetClassObjectTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetClassesForFamilyTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetFamilyObjectTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetFamiliesForSegmentTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetSegmentObjectTool::new(t()))).await;
    server.register_tool(Arc::new(McpGetSegmentsTool::new(t()))).await;

    for range in [SearchRange::All, SearchRange::InClass, SearchRange::InFamily] {
        server.register_tool(Arc::new(McpSearchBricksTool::new(t(), range))).await;
    }
    server.register_tool(Arc::new(McpSearchClassesTool::new(t()))).await;
    server.register_tool(Arc::new(McpSearchClassesTool::in_family(t()))).await;

    server.register_tool(Arc::new(McpJsonLdProductDataTool::new(fetcher))).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::{JsonRpcRequest, McpTool};
    use crate::taxonomy::Taxonomy;
    use async_trait::async_trait;
    use reqwest::Url;

    const SCHEMA: &str = r#"{
        "Schema": [
            { "Level": 1, "Code": "50000000", "Title": "Food/Beverage", "Childs": [
                { "Level": 2, "Code": "50160000",
                  "Title": "Confectionery/Sugar Sweetening Products", "Childs": [
                    { "Level": 3, "Code": "50161800", "Title": "Confectionery Products", "Childs": [
                        { "Level": 4, "Code": "10000044",
                          "Title": "Chocolate and Chocolate/Sugar Candy Combinations" },
                        { "Level": 4, "Code": "10000045", "Title": "Sugar Candy" }
                    ] },
                    { "Level": 3, "Code": "50161600",
                      "Title": "Sugars/Sugar Substitute Products", "Childs": [
                        { "Level": 4, "Code": "10000040", "Title": "Sugar/Sugar Substitutes" }
                    ] }
                ] }
            ] }
        ]
    }"#;

    struct NoPages;

    #[async_trait]
    impl ProductFetcher for NoPages {
        async fn fetch_html(&self, _url: &Url) -> Result<String> {
            Ok(String::new())
        }
    }

    async fn server() -> McpServer {
        let taxonomy: Arc<dyn TaxonomySource> = Arc::new(Taxonomy::from_json(SCHEMA).unwrap());
        let server = McpServer::new("GPC Service", "test");
        register_gpc_tools(&server, taxonomy, Arc::new(NoPages)).await;
        server
    }

    async fn call(server: &McpServer, name: &str, arguments: Value) -> Value {
        let request = JsonRpcRequest::new("tools/call")
            .with_id(1)
            .with_params(serde_json::json!({ "name": name, "arguments": arguments }));
        server.handle_request(request).await.result.unwrap()
    }

    fn payload(result: &Value) -> Value {
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_code_argument_accepts_string_and_integer() {
        let args = serde_json::json!({ "a": "10000045", "b": 10000045 });
        assert_eq!(code_argument(&args, "a").unwrap().as_str(), "10000045");
        assert_eq!(code_argument(&args, "b").unwrap().as_str(), "10000045");
    }

    #[test]
    fn test_code_argument_rejects_bad_values() {
        let args = serde_json::json!({ "neg": -5, "list": [1], "short": "123" });
        for field in ["neg", "list", "short", "missing"] {
            assert!(
                matches!(code_argument(&args, field), Err(Error::InvalidArgument(_))),
                "{field} should be rejected"
            );
        }
    }

    #[test]
    fn test_code_argument_reports_field_and_value() {
        let args = serde_json::json!({ "brick_code": "123" });
        let err = code_argument(&args, "brick_code").unwrap_err().to_string();
        assert!(err.contains("brick_code"), "{err}");
        assert!(err.contains("123"), "{err}");
    }

    #[test]
    fn test_code_schema_shape() {
        let schema = code_schema("brick_code", "Eight digit GPC brick code");
        assert_eq!(schema["required"], serde_json::json!(["brick_code"]));
        assert_eq!(
            schema["properties"]["brick_code"]["type"],
            serde_json::json!(["string", "integer"])
        );
    }

    #[tokio::test]
    async fn test_registers_full_tool_table() {
        let server = server().await;
        let names = server.tool_names().await;
        assert_eq!(names.len(), 19);
        for name in [
            "get_brick_object",
            "get_brick_sibling",
            "get_segments",
            "search_for_classes_in_family",
            "get_jsonld_product_data",
        ] {
            assert!(names.iter().any(|n| n == name), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_brick_lookup_chain() {
        let server = server().await;
        let args = serde_json::json!({ "brick_code": 10000045 });
        let brick = payload(&call(&server, "get_brick_object", args).await);
        let args = serde_json::json!({ "brick_code": "10000045" });
        let class_code = payload(&call(&server, "get_class_code_for_brick", args).await);
        assert_eq!(brick["class_code"], class_code);
        assert_eq!(class_code, "50161800");
    }

    #[tokio::test]
    async fn test_siblings_include_brick() {
        let server = server().await;
        let args = serde_json::json!({ "brick_code": "10000044" });
        let siblings = payload(&call(&server, "get_brick_sibling", args).await);
        let codes: Vec<&str> = siblings
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["brick_code"].as_str().unwrap())
            .collect();
        assert!(codes.contains(&"10000044"));
        assert!(codes.contains(&"10000045"));
        assert!(!codes.contains(&"10000040"));
    }

    #[tokio::test]
    async fn test_unknown_code_is_error_result() {
        let server = server().await;
        let args = serde_json::json!({ "brick_code": "99999999" });
        let result = call(&server, "get_brick_object", args).await;
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"].as_str().unwrap().contains("99999999"));
    }

    #[tokio::test]
    async fn test_search_in_class_stays_in_class() {
        let server = server().await;
        let bricks = payload(
            &call(
                &server,
                "search_for_bricks_in_class",
                serde_json::json!({ "query": "sugar", "class_code": "50161800" }),
            )
            .await,
        );
        let bricks = bricks.as_array().unwrap();
        assert!(!bricks.is_empty());
        assert!(bricks.iter().all(|b| b["class_code"] == "50161800"));
    }

    #[tokio::test]
    async fn test_get_segments_takes_no_arguments() {
        let tool = McpGetSegmentsTool::new(Arc::new(Taxonomy::from_json(SCHEMA).unwrap()));
        let result = tool.execute(Value::Null).await.unwrap();
        let segments: Value = serde_json::from_str(&result.text_content()).unwrap();
        assert_eq!(segments[0]["segment_code"], "50000000");
    }
}
