//! Macro for generating single-code taxonomy lookup tools
//!
//! Most GPC tools take one code argument, ask the taxonomy for something and
//! return it as JSON. `define_lookup_tool!` generates the struct, constructor
//! and `McpTool` impl for such a tool.

/// Generates a lookup tool backed by a [`TaxonomySource`](crate::taxonomy::TaxonomySource)
///
/// # Arguments
///
/// * `name` - The struct name (e.g., `McpGetBrickObjectTool`)
/// * `tool` - The tool name exposed over MCP (e.g., `"get_brick_object"`)
/// * `description` - Tool description shown to clients
/// * `arg` - Name of the single code argument (e.g., `brick_code`)
/// * `arg_description` - Description of that argument
/// * `lookup` - Closure-like expression from `(source, code)` to a `Result`
///
/// # Example
///
/// ```ignore
/// define_lookup_tool! {
///     name: McpGetBrickObjectTool,
///     tool: "get_brick_object",
///     description: "get information regarding one gpc brick",
///     arg: brick_code,
///     arg_description: "Eight digit GPC brick code",
///     lookup: |source, code| source.brick(&code)
/// }
/// ```
macro_rules! define_lookup_tool {
    (
        $(#[$meta:meta])*
        name: $name:ident,
        tool: $tool_name:expr,
        description: $description:expr,
        arg: $arg:ident,
        arg_description: $arg_description:expr,
        lookup: |$source:ident, $code:ident| $lookup:expr
    ) => {
        $(#[$meta])*
        pub struct $name {
            taxonomy: std::sync::Arc<dyn $crate::taxonomy::TaxonomySource>,
        }

        impl $name {
            pub fn new(taxonomy: std::sync::Arc<dyn $crate::taxonomy::TaxonomySource>) -> Self {
                Self { taxonomy }
            }
        }

        #[async_trait::async_trait]
        impl $crate::mcp::McpTool for $name {
            fn name(&self) -> &str {
                $tool_name
            }

            fn description(&self) -> &str {
                $description
            }

            fn input_schema(&self) -> serde_json::Value {
                $crate::mcp::tools::code_schema(stringify!($arg), $arg_description)
            }

            async fn execute(
                &self,
                arguments: serde_json::Value,
            ) -> $crate::Result<$crate::mcp::McpToolResult> {
                let $code = $crate::mcp::tools::code_argument(&arguments, stringify!($arg))?;
                let $source = self.taxonomy.as_ref();
                let value = $lookup?;
                $crate::mcp::McpToolResult::json(&value)
            }
        }
    };
}
