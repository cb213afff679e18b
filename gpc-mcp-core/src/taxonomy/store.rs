//! In-memory taxonomy loaded from a GS1 GPC JSON export

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::search::{Query, rank};
use super::types::{Brick, Class, Code, Family, Segment};
use super::{SearchScope, TaxonomySource};
use crate::{Error, Result};

const SEGMENT_LEVEL: u8 = 1;
const FAMILY_LEVEL: u8 = 2;
const CLASS_LEVEL: u8 = 3;
const BRICK_LEVEL: u8 = 4;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(rename = "Schema")]
    schema: Vec<RawNode>,
}

/// One node of the export. Codes stay untyped here so that attribute
/// levels below bricks never have to satisfy the eight digit rule.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "Level")]
    level: u8,
    #[serde(rename = "Code")]
    code: Value,
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Definition", default)]
    definition: Option<String>,
    #[serde(rename = "Active", default = "default_active")]
    active: bool,
    #[serde(rename = "Childs", default)]
    childs: Vec<RawNode>,
}

fn default_active() -> bool {
    true
}

impl RawNode {
    fn code(&self) -> Result<Code> {
        let code: Code = serde_json::from_value(self.code.clone()).map_err(|e| {
            Error::Taxonomy(format!("invalid code {} at level {}: {e}", self.code, self.level))
        })?;
        Ok(code)
    }

    fn definition(&self) -> Option<String> {
        self.definition
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    }

    fn expect_level(&self, level: u8) -> Result<()> {
        if self.level != level {
            return Err(Error::Taxonomy(format!(
                "node {} has level {} where level {level} was expected",
                self.code, self.level
            )));
        }
        Ok(())
    }
}

/// The whole four-level tree, indexed by code at every level
#[derive(Debug, Default)]
pub struct Taxonomy {
    segment_order: Vec<Code>,
    segments: HashMap<Code, Segment>,
    families: HashMap<Code, Family>,
    classes: HashMap<Code, Class>,
    bricks: HashMap<Code, Brick>,
    families_by_segment: HashMap<Code, Vec<Code>>,
    classes_by_family: HashMap<Code, Vec<Code>>,
    bricks_by_class: HashMap<Code, Vec<Code>>,
    class_order: Vec<Code>,
    brick_order: Vec<Code>,
    max_results: usize,
}

impl Taxonomy {
    pub const DEFAULT_MAX_RESULTS: usize = 25;

    /// Load a GS1 GPC JSON export from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Taxonomy(format!("failed to read {}: {e}", path.display()))
        })?;
        let taxonomy = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            segments = taxonomy.segments.len(),
            families = taxonomy.families.len(),
            classes = taxonomy.classes.len(),
            bricks = taxonomy.bricks.len(),
            "Loaded GPC taxonomy"
        );
        Ok(taxonomy)
    }

    /// Parse a GS1 GPC JSON export
    pub fn from_json(content: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(content)
            .map_err(|e| Error::Taxonomy(format!("malformed schema file: {e}")))?;

        let mut taxonomy = Self {
            max_results: Self::DEFAULT_MAX_RESULTS,
            ..Self::default()
        };
        for node in file.schema.iter().filter(|n| n.active) {
            taxonomy.add_segment(node)?;
        }
        Ok(taxonomy)
    }

    /// Cap on the number of search hits returned
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    fn add_segment(&mut self, node: &RawNode) -> Result<()> {
        node.expect_level(SEGMENT_LEVEL)?;
        let segment_code = node.code()?;
        let segment = Segment {
            segment_code: segment_code.clone(),
            title: node.title.clone(),
            definition: node.definition(),
        };
        if self.segments.insert(segment_code.clone(), segment).is_some() {
            return Err(duplicate("segment", &segment_code));
        }
        self.segment_order.push(segment_code.clone());
        self.families_by_segment.insert(segment_code.clone(), Vec::new());

        for child in node.childs.iter().filter(|n| n.active) {
            self.add_family(child, &segment_code)?;
        }
        Ok(())
    }

    fn add_family(&mut self, node: &RawNode, segment_code: &Code) -> Result<()> {
        node.expect_level(FAMILY_LEVEL)?;
        let family_code = node.code()?;
        let family = Family {
            family_code: family_code.clone(),
            title: node.title.clone(),
            definition: node.definition(),
            segment_code: segment_code.clone(),
        };
        if self.families.insert(family_code.clone(), family).is_some() {
            return Err(duplicate("family", &family_code));
        }
        self.families_by_segment
            .entry(segment_code.clone())
            .or_default()
            .push(family_code.clone());
        self.classes_by_family.insert(family_code.clone(), Vec::new());

        for child in node.childs.iter().filter(|n| n.active) {
            self.add_class(child, &family_code, segment_code)?;
        }
        Ok(())
    }

    fn add_class(
        &mut self,
        node: &RawNode,
        family_code: &Code,
        segment_code: &Code,
    ) -> Result<()> {
        node.expect_level(CLASS_LEVEL)?;
        let class_code = node.code()?;
        let class = Class {
            class_code: class_code.clone(),
            title: node.title.clone(),
            definition: node.definition(),
            family_code: family_code.clone(),
            segment_code: segment_code.clone(),
        };
        if self.classes.insert(class_code.clone(), class).is_some() {
            return Err(duplicate("class", &class_code));
        }
        self.classes_by_family
            .entry(family_code.clone())
            .or_default()
            .push(class_code.clone());
        self.class_order.push(class_code.clone());
        self.bricks_by_class.insert(class_code.clone(), Vec::new());

        for child in node.childs.iter().filter(|n| n.active) {
            self.add_brick(child, &class_code, family_code, segment_code)?;
        }
        Ok(())
    }

    fn add_brick(
        &mut self,
        node: &RawNode,
        class_code: &Code,
        family_code: &Code,
        segment_code: &Code,
    ) -> Result<()> {
        node.expect_level(BRICK_LEVEL)?;
        let brick_code = node.code()?;
        let brick = Brick {
            brick_code: brick_code.clone(),
            title: node.title.clone(),
            definition: node.definition(),
            class_code: class_code.clone(),
            family_code: family_code.clone(),
            segment_code: segment_code.clone(),
        };
        if self.bricks.insert(brick_code.clone(), brick).is_some() {
            return Err(duplicate("brick", &brick_code));
        }
        self.bricks_by_class
            .entry(class_code.clone())
            .or_default()
            .push(brick_code.clone());
        self.brick_order.push(brick_code);

        // Attribute types and values (levels 5 and 6) are not modelled.
        Ok(())
    }

    fn collect<T: Clone>(index: &HashMap<Code, T>, codes: &[Code]) -> Vec<T> {
        codes.iter().filter_map(|c| index.get(c)).cloned().collect()
    }
}

fn duplicate(kind: &str, code: &Code) -> Error {
    Error::Taxonomy(format!("duplicate {kind} code {code}"))
}

impl TaxonomySource for Taxonomy {
    fn brick(&self, code: &Code) -> Result<Brick> {
        self.bricks
            .get(code)
            .cloned()
            .ok_or_else(|| Error::not_found("Brick", code))
    }

    fn class(&self, code: &Code) -> Result<Class> {
        self.classes
            .get(code)
            .cloned()
            .ok_or_else(|| Error::not_found("Class", code))
    }

    fn family(&self, code: &Code) -> Result<Family> {
        self.families
            .get(code)
            .cloned()
            .ok_or_else(|| Error::not_found("Family", code))
    }

    fn segment(&self, code: &Code) -> Result<Segment> {
        self.segments
            .get(code)
            .cloned()
            .ok_or_else(|| Error::not_found("Segment", code))
    }

    fn segments(&self) -> Result<Vec<Segment>> {
        Ok(Self::collect(&self.segments, &self.segment_order))
    }

    fn bricks_for_class(&self, code: &Code) -> Result<Vec<Brick>> {
        let codes = self
            .bricks_by_class
            .get(code)
            .ok_or_else(|| Error::not_found("Class", code))?;
        Ok(Self::collect(&self.bricks, codes))
    }

    fn classes_for_family(&self, code: &Code) -> Result<Vec<Class>> {
        let codes = self
            .classes_by_family
            .get(code)
            .ok_or_else(|| Error::not_found("Family", code))?;
        Ok(Self::collect(&self.classes, codes))
    }

    fn families_for_segment(&self, code: &Code) -> Result<Vec<Family>> {
        let codes = self
            .families_by_segment
            .get(code)
            .ok_or_else(|| Error::not_found("Segment", code))?;
        Ok(Self::collect(&self.families, codes))
    }

    fn search_bricks(&self, query: &str, scope: SearchScope) -> Result<Vec<Brick>> {
        let query = Query::parse(query);
        let candidates: Vec<&Brick> = match &scope {
            SearchScope::All => self
                .brick_order
                .iter()
                .filter_map(|c| self.bricks.get(c))
                .collect(),
            SearchScope::Class(class_code) => {
                let codes = self
                    .bricks_by_class
                    .get(class_code)
                    .ok_or_else(|| Error::not_found("Class", class_code))?;
                codes.iter().filter_map(|c| self.bricks.get(c)).collect()
            }
            SearchScope::Family(family_code) => {
                if !self.families.contains_key(family_code) {
                    return Err(Error::not_found("Family", family_code));
                }
                self.brick_order
                    .iter()
                    .filter_map(|c| self.bricks.get(c))
                    .filter(|b| &b.family_code == family_code)
                    .collect()
            }
        };

        let hits = rank(&query, candidates, self.max_results);
        debug!(terms = ?query.terms(), ?scope, hits = hits.len(), "Brick search");
        Ok(hits)
    }

    fn search_classes(&self, query: &str, family: Option<&Code>) -> Result<Vec<Class>> {
        let query = Query::parse(query);
        let candidates: Vec<&Class> = match family {
            None => self
                .class_order
                .iter()
                .filter_map(|c| self.classes.get(c))
                .collect(),
            Some(family_code) => {
                let codes = self
                    .classes_by_family
                    .get(family_code)
                    .ok_or_else(|| Error::not_found("Family", family_code))?;
                codes.iter().filter_map(|c| self.classes.get(c)).collect()
            }
        };

        let hits = rank(&query, candidates, self.max_results);
        debug!(terms = ?query.terms(), family = ?family, hits = hits.len(), "Class search");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "Schema": [
            {
                "Level": 1, "Code": "50000000", "Title": "Food/Beverage",
                "Childs": [
                    {
                        "Level": 2, "Code": 50160000, "Title": "Confectionery",
                        "Childs": [
                            {
                                "Level": 3, "Code": "50161800", "Title": "Confectionery Products",
                                "Definition": "  ",
                                "Childs": [
                                    {
                                        "Level": 4, "Code": "10000044",
                                        "Title": "Chocolate Candy",
                                        "Definition": "Chocolate based sweets.",
                                        "Childs": [
                                            {
                                                "Level": 5, "Code": "20000123",
                                                "Title": "Type of Chocolate",
                                                "Childs": [
                                                    { "Level": 6, "Code": "30001", "Title": "Dark" }
                                                ]
                                            }
                                        ]
                                    },
                                    { "Level": 4, "Code": "10000045", "Title": "Sugar Candy" },
                                    {
                                        "Level": 4, "Code": "10000099",
                                        "Title": "Retired Candy", "Active": false
                                    }
                                ]
                            }
                        ]
                    }
                ]
            },
            { "Level": 1, "Code": "53000000", "Title": "Beauty/Personal Care/Hygiene" }
        ]
    }"#;

    fn code(s: &str) -> Code {
        Code::parse(s).unwrap()
    }

    #[test]
    fn test_load_builds_hierarchy() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        assert_eq!(taxonomy.brick_count(), 2);

        let brick = taxonomy.brick(&code("10000044")).unwrap();
        assert_eq!(brick.class_code, code("50161800"));
        assert_eq!(brick.family_code, code("50160000"));
        assert_eq!(brick.segment_code, code("50000000"));
        assert_eq!(brick.definition.as_deref(), Some("Chocolate based sweets."));
    }

    #[test]
    fn test_blank_definition_is_none() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        assert!(taxonomy.class(&code("50161800")).unwrap().definition.is_none());
    }

    #[test]
    fn test_inactive_nodes_are_skipped() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        let err = taxonomy.brick(&code("10000099")).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Brick", .. }));
    }

    #[test]
    fn test_segments_keep_source_order() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        let codes: Vec<String> = taxonomy
            .segments()
            .unwrap()
            .into_iter()
            .map(|s| s.segment_code.to_string())
            .collect();
        assert_eq!(codes, ["50000000", "53000000"]);
    }

    #[test]
    fn test_childless_segment_has_empty_family_list() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        assert!(
            taxonomy
                .families_for_segment(&code("53000000"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_child_lists_fail_for_unknown_parent() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        assert!(taxonomy.bricks_for_class(&code("99999999")).is_err());
        assert!(taxonomy.classes_for_family(&code("99999999")).is_err());
        assert!(taxonomy.families_for_segment(&code("99999999")).is_err());
    }

    #[test]
    fn test_duplicate_code_is_rejected() {
        let schema = r#"{"Schema": [
            {"Level": 1, "Code": "50000000", "Title": "A"},
            {"Level": 1, "Code": "50000000", "Title": "B"}
        ]}"#;
        let err = Taxonomy::from_json(schema).unwrap_err();
        assert!(err.to_string().contains("duplicate segment code 50000000"));
    }

    #[test]
    fn test_wrong_level_is_rejected() {
        let schema = r#"{"Schema": [
            {"Level": 1, "Code": "50000000", "Title": "A", "Childs": [
                {"Level": 3, "Code": "50161800", "Title": "Skipped a level"}
            ]}
        ]}"#;
        assert!(matches!(
            Taxonomy::from_json(schema),
            Err(Error::Taxonomy(_))
        ));
    }

    #[test]
    fn test_invalid_code_is_rejected() {
        let schema = r#"{"Schema": [{"Level": 1, "Code": "5000", "Title": "A"}]}"#;
        assert!(matches!(
            Taxonomy::from_json(schema),
            Err(Error::Taxonomy(_))
        ));
    }

    #[test]
    fn test_scoped_search() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        let hits = taxonomy
            .search_bricks("candy", SearchScope::Class(code("50161800")))
            .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = taxonomy
            .search_bricks("chocolate", SearchScope::Family(code("50160000")))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].brick_code, code("10000044"));

        let err = taxonomy
            .search_bricks("candy", SearchScope::Family(code("99999999")))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "Family", .. }));
    }

    #[test]
    fn test_search_respects_max_results() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap().with_max_results(1);
        let hits = taxonomy.search_bricks("candy", SearchScope::All).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_class_search() {
        let taxonomy = Taxonomy::from_json(SCHEMA).unwrap();
        let hits = taxonomy.search_classes("confectionery", None).unwrap();
        assert_eq!(hits.len(), 1);
        let hits = taxonomy
            .search_classes("confectionery", Some(&code("50160000")))
            .unwrap();
        assert_eq!(hits[0].class_code, code("50161800"));
    }
}
