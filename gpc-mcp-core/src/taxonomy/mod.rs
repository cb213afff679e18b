//! GPC taxonomy: Segment → Family → Class → Brick
//!
//! Tools only talk to [`TaxonomySource`]. [`Taxonomy`] is the in-memory
//! implementation backed by a GS1 GPC JSON export.

mod search;
mod store;
mod types;

pub use search::{Query, rank};
pub use store::Taxonomy;
pub use types::{Brick, CODE_LEN, Class, Code, Family, Searchable, Segment};

use crate::Result;

/// Restricts a brick search to part of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    All,
    Class(Code),
    Family(Code),
}

/// Read-only access to the taxonomy.
///
/// Lookups fail with [`crate::Error::NotFound`] when a code is unknown at the
/// requested level. List results keep source order.
pub trait TaxonomySource: Send + Sync {
    fn brick(&self, code: &Code) -> Result<Brick>;

    fn class(&self, code: &Code) -> Result<Class>;

    fn family(&self, code: &Code) -> Result<Family>;

    fn segment(&self, code: &Code) -> Result<Segment>;

    fn segments(&self) -> Result<Vec<Segment>>;

    fn bricks_for_class(&self, code: &Code) -> Result<Vec<Brick>>;

    fn classes_for_family(&self, code: &Code) -> Result<Vec<Class>>;

    fn families_for_segment(&self, code: &Code) -> Result<Vec<Family>>;

    /// Free-text search over bricks; results carry no duplicate codes
    fn search_bricks(&self, query: &str, scope: SearchScope) -> Result<Vec<Brick>>;

    /// Free-text search over classes, optionally within one family
    fn search_classes(&self, query: &str, family: Option<&Code>) -> Result<Vec<Class>>;

    fn class_code_for_brick(&self, code: &Code) -> Result<Code> {
        Ok(self.brick(code)?.class_code)
    }

    fn family_code_for_brick(&self, code: &Code) -> Result<Code> {
        Ok(self.brick(code)?.family_code)
    }

    fn segment_code_for_brick(&self, code: &Code) -> Result<Code> {
        Ok(self.brick(code)?.segment_code)
    }

    fn class_for_brick(&self, code: &Code) -> Result<Class> {
        let brick = self.brick(code)?;
        self.class(&brick.class_code)
    }

    /// Every brick in the same class, the queried brick included
    fn brick_siblings(&self, code: &Code) -> Result<Vec<Brick>> {
        let brick = self.brick(code)?;
        self.bricks_for_class(&brick.class_code)
    }
}
