//! Error types for gpc-mcp-core

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using the gpc-mcp Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for gpc-mcp
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(gpc_mcp::config))]
    Config(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(gpc_mcp::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(gpc_mcp::serde))]
    Serde(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    #[diagnostic(code(gpc_mcp::toml))]
    Toml(#[from] toml::de::Error),

    #[error("Invalid taxonomy data: {0}")]
    #[diagnostic(
        code(gpc_mcp::taxonomy),
        help("the taxonomy file must be a GS1 GPC JSON export with Level 1-4 nodes")
    )]
    Taxonomy(String),

    #[error("{kind} not found: {code}")]
    #[diagnostic(code(gpc_mcp::not_found))]
    NotFound { kind: &'static str, code: String },

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(gpc_mcp::invalid_argument))]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(gpc_mcp::http))]
    Http(#[from] reqwest::Error),

    #[error("No JSON-LD structured data found at {0}")]
    #[diagnostic(code(gpc_mcp::no_structured_data))]
    NoStructuredData(String),

    #[error("Transport error: {0}")]
    #[diagnostic(code(gpc_mcp::transport))]
    Transport(String),

    #[error("JSON-RPC error {code}: {message}")]
    #[diagnostic(code(gpc_mcp::rpc))]
    Rpc { code: i32, message: String },
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, code: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            code: code.to_string(),
        }
    }
}
