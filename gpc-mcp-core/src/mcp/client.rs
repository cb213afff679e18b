//! MCP client for the SSE transport

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Url;
use reqwest_eventsource::{Event, EventSource, retry};
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::mcp::event_stream::{ENDPOINT_EVENT, MESSAGE_EVENT};
use crate::mcp::protocol::{
    JsonRpcRequest, JsonRpcResponse, McpToolCall, McpToolDefinition, McpToolResult,
    PROTOCOL_VERSION,
};
use crate::{Error, Result};

type Pending = Arc<Mutex<HashMap<i64, oneshot::Sender<JsonRpcResponse>>>>;

/// A connected MCP session over server-sent events
pub struct SseClient {
    http: reqwest::Client,
    message_url: Url,
    pending: Pending,
    next_id: AtomicI64,
    timeout: Duration,
    reader: JoinHandle<()>,
}

impl SseClient {
    /// Open the event stream at `sse_url` and wait for the server to
    /// announce its message endpoint.
    pub async fn connect(sse_url: &str, timeout: Duration) -> Result<Self> {
        let sse_url = Url::parse(sse_url)
            .map_err(|e| Error::InvalidArgument(format!("'{sse_url}' is not a valid URL: {e}")))?;

        let http = reqwest::Client::new();
        let mut events = EventSource::new(
            http.get(sse_url.clone())
                .header("Accept", "text/event-stream"),
        )
        .map_err(|e| Error::Transport(format!("cannot open event stream: {e}")))?;
        // A reconnect would start a new session the server knows nothing about
        events.set_retry_policy(Box::new(retry::Never));

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let endpoint =
            match tokio::time::timeout(timeout, wait_for_endpoint(&mut events, &pending)).await {
                Ok(endpoint) => endpoint?,
                Err(_) => {
                    events.close();
                    return Err(Error::Transport(
                        "timed out waiting for the endpoint event".to_string(),
                    ));
                }
            };
        debug!("Connected to MCP event stream at {}", sse_url);

        let message_url = sse_url.join(&endpoint).map_err(|e| {
            Error::Transport(format!("server announced an invalid endpoint '{endpoint}': {e}"))
        })?;
        debug!("MCP message endpoint is {}", message_url);

        let reader = tokio::spawn(read_events(events, Arc::clone(&pending)));

        Ok(Self {
            http,
            message_url,
            pending,
            next_id: AtomicI64::new(1),
            timeout,
            reader,
        })
    }

    /// Perform the MCP handshake
    pub async fn initialize(&self) -> Result<Value> {
        let result = self
            .request(
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "gpc-mcp",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                })),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    pub async fn list_tools(&self) -> Result<Vec<McpToolDefinition>> {
        let mut result = self.request("tools/list", None).await?;
        let tools = result
            .get_mut("tools")
            .map(Value::take)
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(tools)?)
    }

    /// Invoke one tool. A tool-level failure comes back as a result with
    /// `isError` set, not as an `Err`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult> {
        let call = McpToolCall {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .request("tools/call", Some(serde_json::to_value(call)?))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Drop the event stream, which ends the server-side session
    pub fn close(self) {
        drop(self);
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut request = JsonRpcRequest::new(method).with_id(id);
        request.params = params;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if let Err(e) = self.post(&request).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Err(Error::Transport(format!(
                    "event stream closed while waiting for '{method}'"
                )));
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(Error::Transport(format!(
                    "timed out waiting for '{method}' response"
                )));
            }
        };
        response.into_result()
    }

    async fn notify(&self, method: &str) -> Result<()> {
        self.post(&JsonRpcRequest::new(method)).await
    }

    async fn post(&self, request: &JsonRpcRequest) -> Result<()> {
        let response = self
            .http
            .post(self.message_url.clone())
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "message endpoint returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

impl Drop for SseClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Consume events until the server names its message endpoint. Responses
/// that arrive first are routed as usual.
async fn wait_for_endpoint(events: &mut EventSource, pending: &Pending) -> Result<String> {
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Open) => debug!("MCP event stream open"),
            Ok(Event::Message(message)) if message.event == ENDPOINT_EVENT => {
                return Ok(message.data);
            }
            Ok(Event::Message(message)) => {
                route_event(pending, &message.event, &message.data).await;
            }
            Err(e) => {
                events.close();
                return Err(Error::Transport(format!(
                    "event stream failed before the endpoint was announced: {e}"
                )));
            }
        }
    }
    Err(Error::Transport(
        "event stream closed before the endpoint was announced".to_string(),
    ))
}

async fn read_events(mut events: EventSource, pending: Pending) {
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Open) => {}
            Ok(Event::Message(message)) => {
                route_event(&pending, &message.event, &message.data).await;
            }
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(e) => {
                warn!("MCP event stream error: {}", e);
                break;
            }
        }
    }
    events.close();
    debug!("MCP event stream ended");
    // Dropping the senders wakes every waiter with a closed-channel error
    pending.lock().await.clear();
}

async fn route_event(pending: &Pending, event: &str, data: &str) {
    if event != MESSAGE_EVENT {
        debug!("Ignoring '{}' event", event);
        return;
    }
    let response: JsonRpcResponse = match serde_json::from_str(data) {
        Ok(r) => r,
        Err(e) => {
            warn!("Unparseable MCP message event: {}", e);
            return;
        }
    };
    let Some(id) = response.id.as_ref().and_then(Value::as_i64) else {
        debug!("Ignoring MCP message without a numeric id");
        return;
    };
    match pending.lock().await.remove(&id) {
        Some(tx) => {
            let _ = tx.send(response);
        }
        None => debug!("No request waiting for response {}", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_route_event_wakes_matching_request() {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(4, tx);

        route_event(&pending, ENDPOINT_EVENT, "/messages/?session_id=x").await;
        route_event(&pending, MESSAGE_EVENT, "not json").await;
        route_event(&pending, MESSAGE_EVENT, r#"{"jsonrpc":"2.0","id":9,"result":{}}"#).await;
        assert_eq!(pending.lock().await.len(), 1);

        route_event(&pending, MESSAGE_EVENT, r#"{"jsonrpc":"2.0","id":4,"result":"ok"}"#).await;
        assert!(pending.lock().await.is_empty());
        assert_eq!(rx.await.unwrap().into_result().unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_connect_fails_when_nothing_listens() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result =
            SseClient::connect(&format!("http://{addr}/sse"), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
