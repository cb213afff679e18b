//! gpc-mcp-core: GS1 Global Product Classification tools over MCP

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod mcp;
pub mod product;
pub mod taxonomy;

pub use error::{Error, Result};
