//! Configuration types for the gpc-mcp server and client

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CONFIG_FILE: &str = "gpc-mcp.toml";

/// Listener and route configuration for the SSE transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub sse_path: String,
    pub message_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            sse_path: "/sse".to_string(),
            message_path: "/messages/".to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the GPC schema file lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    pub path: PathBuf,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/gpc-sample.json"),
        }
    }
}

/// Text search tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 25 }
    }
}

/// Outbound HTTP settings for product page scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("gpc-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Client connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/sse".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete gpc-mcp configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpcConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl GpcConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from default locations with cascade:
    /// 1. ./gpc-mcp.toml (local override)
    /// 2. ~/.gpc-mcp/config.toml (global defaults)
    /// 3. Built-in defaults
    pub fn load_default() -> crate::Result<Self> {
        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        candidates.extend(Self::global_config_path());
        Self::load_first(&candidates)
    }

    /// Load the first candidate that exists. An existing candidate that
    /// fails to load is an error.
    pub fn load_first(candidates: &[PathBuf]) -> crate::Result<Self> {
        for path in candidates {
            if !path.exists() {
                continue;
            }
            return Self::from_file(path).map_err(|e| {
                crate::Error::Config(format!("failed to load {}: {e}", path.display()))
            });
        }
        Ok(Self::default())
    }

    /// Load an explicit file if given, otherwise fall back to the cascade.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path).map_err(|e| {
                crate::Error::Config(format!("failed to load {}: {e}", path.display()))
            })?,
            None => Self::load_default()?,
        };
        config.expand_env_vars();
        Ok(config)
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".gpc-mcp").join("config.toml"))
    }

    /// Expand a `${VAR}` taxonomy path from the environment
    pub fn expand_env_vars(&mut self) {
        let Some(path) = self.taxonomy.path.to_str() else {
            return;
        };
        if path.starts_with("${") && path.ends_with('}') {
            let var_name = &path[2..path.len() - 1];
            if let Ok(value) = std::env::var(var_name) {
                self.taxonomy.path = PathBuf::from(value);
            }
        }
    }
}
