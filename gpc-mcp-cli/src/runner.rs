//! Subcommand runners

use std::sync::Arc;

use anyhow::{Context, Result};
use gpc_mcp_core::config::GpcConfig;
use gpc_mcp_core::mcp::tools::register_gpc_tools;
use gpc_mcp_core::mcp::{McpServer, SseClient, SseMcpServer, serve_stdio};
use gpc_mcp_core::product::HttpFetcher;
use gpc_mcp_core::taxonomy::Taxonomy;
use serde_json::Value;
use tracing::info;

use crate::args::{CallArgs, ServeArgs, Transport};

const SERVER_NAME: &str = "GPC Service";

/// Load the taxonomy and serve every tool until interrupted
pub async fn serve(mut config: GpcConfig, args: ServeArgs) -> Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(path) = args.taxonomy {
        config.taxonomy.path = path;
    }

    let taxonomy = Taxonomy::from_file(&config.taxonomy.path)
        .with_context(|| format!("loading {}", config.taxonomy.path.display()))?
        .with_max_results(config.search.max_results);
    let fetcher = HttpFetcher::new(&config.fetch)?;

    let server = Arc::new(McpServer::new(SERVER_NAME, env!("CARGO_PKG_VERSION")));
    register_gpc_tools(&server, Arc::new(taxonomy), Arc::new(fetcher)).await;

    match args.transport {
        Transport::Stdio => {
            info!("Serving MCP over stdio");
            serve_stdio(server).await?;
        }
        Transport::Sse => {
            let sse = SseMcpServer::start(server, &config.server).await?;
            info!("Clients can connect at {}", sse.sse_url());
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl+C")?;
            info!("Shutting down");
            sse.shutdown().await;
        }
    }
    Ok(())
}

/// Connect, run one call (or list the tools), and report whether it succeeded
pub async fn call(config: GpcConfig, args: CallArgs) -> Result<bool> {
    let url = args.url.unwrap_or_else(|| config.client.url.clone());
    let client = SseClient::connect(&url, config.client.timeout())
        .await
        .with_context(|| format!("connecting to {url}"))?;
    client.initialize().await?;

    if args.list {
        for tool in client.list_tools().await? {
            println!("{}\t{}", tool.name, tool.description);
        }
        client.close();
        return Ok(true);
    }

    let arguments: Value =
        serde_json::from_str(&args.args).context("--args must be a JSON object")?;
    let result = client.call_tool(&args.tool, arguments).await?;
    client.close();

    println!("{}", result.text_content());
    Ok(!result.is_error())
}
