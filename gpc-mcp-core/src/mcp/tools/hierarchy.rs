//! Class, family and segment lookup tools

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::mcp::{McpTool, McpToolResult};
use crate::taxonomy::TaxonomySource;

// ============================================================================
// Class
// ============================================================================

define_lookup_tool! {
    name: McpGetBricksForClassTool,
    tool: "get_bricks_for_class",
    description: "get all bricks for a given class",
    arg: class_code,
    arg_description: "Eight digit GPC class code",
    lookup: |source, code| source.bricks_for_class(&code)
}

define_lookup_tool! {
    name: McpGetClassObjectTool,
    tool: "get_class_object",
    description: "get information regarding one gpc class",
    arg: class_code,
    arg_description: "Eight digit GPC class code",
    lookup: |source, code| source.class(&code)
}

// ============================================================================
// Family
// ============================================================================

define_lookup_tool! {
    name: McpGetClassesForFamilyTool,
    tool: "get_classes_for_family",
    description: "get all classes for a given family",
    arg: family_code,
    arg_description: "Eight digit GPC family code",
    lookup: |source, code| source.classes_for_family(&code)
}

define_lookup_tool! {
    name: McpGetFamilyObjectTool,
    tool: "get_family_object",
    description: "get information regarding one gpc family",
    arg: family_code,
    arg_description: "Eight digit GPC family code",
    lookup: |source, code| source.family(&code)
}

// ============================================================================
// Segment
// ============================================================================

define_lookup_tool! {
    name: McpGetFamiliesForSegmentTool,
    tool: "get_families_for_segment",
    description: "get all families for a given segment",
    arg: segment_code,
    arg_description: "Eight digit GPC segment code",
    lookup: |source, code| source.families_for_segment(&code)
}

define_lookup_tool! {
    name: McpGetSegmentObjectTool,
    tool: "get_segment_object",
    description: "get information regarding one gpc segment",
    arg: segment_code,
    arg_description: "Eight digit GPC segment code",
    lookup: |source, code| source.segment(&code)
}

/// Lists every segment; takes no arguments
pub struct McpGetSegmentsTool {
    taxonomy: Arc<dyn TaxonomySource>,
}

impl McpGetSegmentsTool {
    pub fn new(taxonomy: Arc<dyn TaxonomySource>) -> Self {
        Self { taxonomy }
    }
}

#[async_trait]
impl McpTool for McpGetSegmentsTool {
    fn name(&self) -> &str {
        "get_segments"
    }

    fn description(&self) -> &str {
        "get all segments"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: Value) -> Result<McpToolResult> {
        McpToolResult::json(&self.taxonomy.segments()?)
    }
}
