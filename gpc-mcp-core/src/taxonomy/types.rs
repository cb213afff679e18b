//! GPC entity types

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A normalized eight digit GPC code.
///
/// Callers may send codes either as JSON strings (`"10000045"`) or as plain
/// integers (`10000045`). Both forms are coerced here, once, before any
/// lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCode", into = "String")]
pub struct Code(String);

pub const CODE_LEN: usize = 8;

impl Code {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.len() != CODE_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidArgument(format!(
                "'{input}' is not a valid GPC code (expected {CODE_LEN} digits)"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Text(String),
    Number(u64),
}

impl TryFrom<RawCode> for Code {
    type Error = Error;

    fn try_from(raw: RawCode) -> Result<Self> {
        match raw {
            RawCode::Text(s) => Self::parse(&s),
            RawCode::Number(n) => Self::parse(&n.to_string()),
        }
    }
}

/// Top level of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub segment_code: Code,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub family_code: Code,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub segment_code: Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub class_code: Code,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub family_code: Code,
    pub segment_code: Code,
}

/// Most granular node of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brick {
    pub brick_code: Code,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    pub class_code: Code,
    pub family_code: Code,
    pub segment_code: Code,
}

/// Common view over entities that take part in text search
pub trait Searchable {
    fn code(&self) -> &Code;
    fn title(&self) -> &str;
    fn definition(&self) -> Option<&str>;
}

impl Searchable for Brick {
    fn code(&self) -> &Code {
        &self.brick_code
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }
}

impl Searchable for Class {
    fn code(&self) -> &Code {
        &self.class_code
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }
}
