//! MCP stdio transport layer

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::Result;
use crate::mcp::McpServer;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, error_codes};

/// Next non-blank line, trimmed, or `None` at EOF
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Ok(None); // EOF
        }

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.to_string()));
        }
    }
}

/// Read a JSON-RPC message from a buffered reader.
/// MCP uses newline-delimited JSON; blank lines are skipped.
pub async fn read_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<Option<JsonRpcRequest>> {
    match read_line(reader).await? {
        Some(line) => Ok(Some(serde_json::from_str(&line)?)),
        None => Ok(None),
    }
}

/// Write a JSON-RPC response to a writer
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}

/// Serve requests from `reader` until EOF, answering on `writer`.
///
/// Requests are handled one at a time, in arrival order. A line that is not
/// JSON gets a parse error, JSON that is not a request gets an invalid
/// request error, and the loop continues.
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = reader;
    while let Some(line) = read_line(&mut reader).await? {
        let value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(e) => {
                debug!("Malformed MCP message on stdio: {}", e);
                let response = JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                );
                write_message(&mut writer, &response).await?;
                continue;
            }
        };

        let id = value.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                debug!("Invalid MCP request on stdio: {}", e);
                let response = JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                );
                write_message(&mut writer, &response).await?;
                continue;
            }
        };

        if let Some(response) = server.handle_message(request).await {
            write_message(&mut writer, &response).await?;
        }
    }
    debug!("MCP stdio input closed");
    Ok(())
}

/// Serve on the process's stdin/stdout
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<()> {
    info!("MCP server reading from stdio");
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
