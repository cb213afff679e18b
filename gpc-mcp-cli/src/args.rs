//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "gpc-mcp")]
#[command(author, version, about = "GS1 Global Product Classification tools over MCP")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "GPC_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the GPC tools
    Serve(ServeArgs),
    /// Call a tool on a running server
    Call(CallArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Sse,
    Stdio,
}

#[derive(Debug, clap::Args)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// GS1 GPC JSON export to load (overrides config)
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,

    /// How clients reach the server
    #[arg(long, value_enum, default_value = "sse")]
    pub transport: Transport,
}

#[derive(Debug, clap::Args)]
pub struct CallArgs {
    /// Event stream URL of the server (overrides config)
    #[arg(long)]
    pub url: Option<String>,

    /// Tool to invoke
    #[arg(long, default_value = "search_for_bricks")]
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(long, default_value = r#"{"query":"chocolate"}"#)]
    pub args: String,

    /// List the server's tools instead of calling one
    #[arg(long)]
    pub list: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_defaults() {
        let args = Args::parse_from(["gpc-mcp", "call"]);
        let Command::Call(call) = args.command else {
            panic!("expected call");
        };
        assert_eq!(call.tool, "search_for_bricks");
        assert_eq!(call.args, r#"{"query":"chocolate"}"#);
        assert!(call.url.is_none());
        assert!(!call.list);
    }

    #[test]
    fn test_serve_overrides() {
        let args = Args::parse_from([
            "gpc-mcp", "-vv", "serve", "--port", "9000", "--transport", "stdio",
        ]);
        assert_eq!(args.verbose, 2);
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.port, Some(9000));
        assert_eq!(serve.transport, Transport::Stdio);
    }
}
