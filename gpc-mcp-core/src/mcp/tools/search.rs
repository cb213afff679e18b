//! Free-text search tools over bricks and classes

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::Result;
use crate::mcp::{McpTool, McpToolResult};
use crate::taxonomy::{Code, SearchScope, TaxonomySource};

/// Which part of the tree a search tool covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRange {
    All,
    InClass,
    InFamily,
}

impl SearchRange {
    fn scope_argument(self) -> Option<&'static str> {
        match self {
            SearchRange::All => None,
            SearchRange::InClass => Some("class_code"),
            SearchRange::InFamily => Some("family_code"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    class_code: Option<Code>,
    #[serde(default)]
    family_code: Option<Code>,
}

fn parse_args(tool: &str, arguments: Value) -> Result<SearchArgs> {
    serde_json::from_value(arguments)
        .map_err(|e| crate::Error::InvalidArgument(format!("Invalid {tool} arguments: {e}")))
}

fn required(tool: &str, field: &str, value: Option<Code>) -> Result<Code> {
    value.ok_or_else(|| {
        crate::Error::InvalidArgument(format!("Invalid {tool} arguments: missing field `{field}`"))
    })
}

fn search_schema(range: SearchRange, what: &str) -> Value {
    let mut properties = serde_json::json!({
        "query": {
            "type": "string",
            "description": format!("Free text to match against {what} titles and definitions")
        }
    });
    let mut required = vec!["query"];
    if let Some(field) = range.scope_argument() {
        properties[field] = serde_json::json!({
            "type": ["string", "integer"],
            "description": "Eight digit GPC code limiting the search"
        });
        required.push(field);
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

// ============================================================================
// McpSearchBricksTool
// ============================================================================

/// Brick search, optionally scoped to a class or family
pub struct McpSearchBricksTool {
    taxonomy: Arc<dyn TaxonomySource>,
    range: SearchRange,
}

impl McpSearchBricksTool {
    pub fn new(taxonomy: Arc<dyn TaxonomySource>, range: SearchRange) -> Self {
        Self { taxonomy, range }
    }
}

#[async_trait]
impl McpTool for McpSearchBricksTool {
    fn name(&self) -> &str {
        match self.range {
            SearchRange::All => "search_for_bricks",
            SearchRange::InClass => "search_for_bricks_in_class",
            SearchRange::InFamily => "search_for_bricks_in_family",
        }
    }

    fn description(&self) -> &str {
        match self.range {
            SearchRange::All => "search for bricks",
            SearchRange::InClass => "search for bricks in a class",
            SearchRange::InFamily => "search for bricks in a family",
        }
    }

    fn input_schema(&self) -> Value {
        search_schema(self.range, "brick")
    }

    async fn execute(&self, arguments: Value) -> Result<McpToolResult> {
        let tool = self.name();
        let args = parse_args(tool, arguments)?;
        let scope = match self.range {
            SearchRange::All => SearchScope::All,
            SearchRange::InClass => {
                SearchScope::Class(required(tool, "class_code", args.class_code)?)
            }
            SearchRange::InFamily => {
                SearchScope::Family(required(tool, "family_code", args.family_code)?)
            }
        };

        let bricks = self.taxonomy.search_bricks(&args.query, scope)?;
        McpToolResult::json(&bricks)
    }
}

// ============================================================================
// McpSearchClassesTool
// ============================================================================

/// Class search, optionally scoped to a family
pub struct McpSearchClassesTool {
    taxonomy: Arc<dyn TaxonomySource>,
    in_family: bool,
}

impl McpSearchClassesTool {
    pub fn new(taxonomy: Arc<dyn TaxonomySource>) -> Self {
        Self {
            taxonomy,
            in_family: false,
        }
    }

    pub fn in_family(taxonomy: Arc<dyn TaxonomySource>) -> Self {
        Self {
            taxonomy,
            in_family: true,
        }
    }

    fn range(&self) -> SearchRange {
        if self.in_family {
            SearchRange::InFamily
        } else {
            SearchRange::All
        }
    }
}

#[async_trait]
impl McpTool for McpSearchClassesTool {
    fn name(&self) -> &str {
        if self.in_family {
            "search_for_classes_in_family"
        } else {
            "search_for_classes"
        }
    }

    fn description(&self) -> &str {
        if self.in_family {
            "search for classes in a family"
        } else {
            "search for classes"
        }
    }

    fn input_schema(&self) -> Value {
        search_schema(self.range(), "class")
    }

    async fn execute(&self, arguments: Value) -> Result<McpToolResult> {
        let tool = self.name();
        let args = parse_args(tool, arguments)?;
        let family = if self.in_family {
            Some(required(tool, "family_code", args.family_code)?)
        } else {
            None
        };

        let classes = self.taxonomy.search_classes(&args.query, family.as_ref())?;
        McpToolResult::json(&classes)
    }
}
