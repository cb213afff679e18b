//! SSE transport for the MCP server
//!
//! A client opens `GET /sse` and receives an `endpoint` event naming the URL
//! to POST its JSON-RPC messages to. Each POST is acknowledged with `202` and
//! the response is delivered as a `message` event on the client's stream.
//! `GET /health` answers `OK` for liveness checks.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::mcp::McpServer;
use crate::mcp::event_stream::{ENDPOINT_EVENT, MESSAGE_EVENT, encode_event, keep_alive};
use crate::mcp::protocol::JsonRpcRequest;
use crate::{Error, Result};

pub const HEALTH_PATH: &str = "/health";
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const SESSION_BUFFER: usize = 64;
/// Largest JSON-RPC message accepted on the message route
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

type SseBody = UnsyncBoxBody<Bytes, Infallible>;

/// Per-connection state shared by every request handler
struct SseState {
    server: Arc<McpServer>,
    sessions: RwLock<HashMap<String, mpsc::Sender<Bytes>>>,
    sse_path: String,
    message_path: String,
    /// Flips to `true` once the server shuts down; ends every session
    closing: watch::Sender<bool>,
}

/// HTTP server exposing an [`McpServer`] over server-sent events.
pub struct SseMcpServer {
    local_addr: SocketAddr,
    sse_path: String,
    state: Arc<SseState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SseMcpServer {
    /// Bind to `config.host:config.port` and start accepting connections.
    ///
    /// Port `0` picks an ephemeral port; read it back with
    /// [`local_addr()`](Self::local_addr).
    pub async fn start(server: Arc<McpServer>, config: &ServerConfig) -> Result<Self> {
        for path in [&config.sse_path, &config.message_path] {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "route '{path}' must start with '/'"
                )));
            }
        }

        let listener = TcpListener::bind(config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        info!("MCP SSE server listening on {}", local_addr);

        let state = Arc::new(SseState {
            server,
            sessions: RwLock::new(HashMap::new()),
            sse_path: config.sse_path.clone(),
            message_path: config.message_path.clone(),
            closing: watch::Sender::new(false),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            Self::accept_loop(listener, accept_state, shutdown_rx).await;
        });

        Ok(Self {
            local_addr,
            sse_path: config.sse_path.clone(),
            state,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// URL a local client should connect to (e.g. `http://127.0.0.1:8000/sse`).
    pub fn sse_url(&self) -> String {
        let mut addr = self.local_addr;
        if addr.ip().is_unspecified() {
            addr.set_ip([127, 0, 0, 1].into());
        }
        format!("http://{}{}", addr, self.sse_path)
    }

    /// Stop accepting connections, wait for the accept loop to exit, then
    /// end every open event stream.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("MCP SSE accept loop ended abnormally: {}", e);
        }

        self.state.closing.send_replace(true);
        let open = {
            let mut sessions = self.state.sessions.write().await;
            let open = sessions.len();
            sessions.clear();
            open
        };
        info!("MCP SSE server stopped, closed {} session(s)", open);
    }

    /// Number of sessions with an open event stream
    pub async fn session_count(&self) -> usize {
        self.state.sessions.read().await.len()
    }

    async fn accept_loop(
        listener: TcpListener,
        state: Arc<SseState>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!("MCP SSE connection from {}", addr);
                            let state = Arc::clone(&state);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let state = Arc::clone(&state);
                                    route(state, req)
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("MCP SSE connection closed: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("MCP SSE accept error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("MCP SSE server shutting down");
                    break;
                }
            }
        }
    }
}

fn same_path(actual: &str, expected: &str) -> bool {
    actual.trim_end_matches('/') == expected.trim_end_matches('/')
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Build a plain text response with the given status code and body.
fn text_response(status: StatusCode, body: &'static str) -> Response<SseBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(body.as_bytes())).boxed_unsync())
        .unwrap_or_else(|_| {
            warn!("Failed to build HTTP response, returning empty 500");
            let mut resp = Response::new(Full::new(Bytes::new()).boxed_unsync());
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}

async fn route(
    state: Arc<SseState>,
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<Response<SseBody>, hyper::Error> {
    let path = req.uri().path().to_string();

    if same_path(&path, HEALTH_PATH) {
        return Ok(match *req.method() {
            Method::GET | Method::HEAD => text_response(StatusCode::OK, "OK"),
            _ => text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
        });
    }

    if same_path(&path, &state.sse_path) {
        return Ok(match *req.method() {
            Method::GET => open_stream(state).await,
            _ => text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
        });
    }

    if same_path(&path, &state.message_path) {
        if req.method() != Method::POST {
            return Ok(text_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed",
            ));
        }
        return handle_post(state, req).await;
    }

    Ok(text_response(StatusCode::NOT_FOUND, "Not Found"))
}

/// Register a new session and return its event stream.
async fn open_stream(state: Arc<SseState>) -> Response<SseBody> {
    let session_id = Uuid::new_v4().simple().to_string();
    let (tx, rx) = mpsc::channel::<Bytes>(SESSION_BUFFER);

    let endpoint = format!("{}?session_id={}", state.message_path, session_id);
    if tx.try_send(encode_event(ENDPOINT_EVENT, &endpoint)).is_err() {
        return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }

    state
        .sessions
        .write()
        .await
        .insert(session_id.clone(), tx.clone());
    debug!("Opened MCP session {}", session_id);

    // Keeps the connection warm and drops the session once the client is gone
    let keep_alive_state = Arc::clone(&state);
    let mut closing = state.closing.subscribe();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(KEEP_ALIVE_INTERVAL);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = closing.changed() => break,
                _ = ticker.tick() => {
                    if tx.send(keep_alive()).await.is_err() {
                        break;
                    }
                }
            }
        }
        keep_alive_state.sessions.write().await.remove(&session_id);
        debug!("Closed MCP session {}", session_id);
    });

    let stream = ReceiverStream::new(rx).map(|bytes| Ok::<_, Infallible>(Frame::data(bytes)));
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/event-stream")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .body(StreamBody::new(stream).boxed_unsync())
        .unwrap_or_else(|_| {
            warn!("Failed to build SSE response");
            let mut resp = Response::new(Full::new(Bytes::new()).boxed_unsync());
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}

/// Accept one JSON-RPC message for a session and dispatch it in the background.
async fn handle_post(
    state: Arc<SseState>,
    req: Request<hyper::body::Incoming>,
) -> std::result::Result<Response<SseBody>, hyper::Error> {
    let Some(session_id) = query_param(req.uri().query(), "session_id") else {
        return Ok(text_response(StatusCode::BAD_REQUEST, "session_id is required"));
    };

    let tx = state.sessions.read().await.get(&session_id).cloned();
    let Some(tx) = tx else {
        return Ok(text_response(StatusCode::NOT_FOUND, "Could not find session"));
    };

    let body = match Limited::new(req.into_body(), MAX_MESSAGE_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            debug!("Rejected MCP message over {} bytes", MAX_MESSAGE_BYTES);
            return Ok(text_response(StatusCode::PAYLOAD_TOO_LARGE, "Message too large"));
        }
        Err(e) => {
            debug!("Failed to read MCP message body: {}", e);
            return Ok(text_response(StatusCode::BAD_REQUEST, "Could not read message"));
        }
    };
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            debug!("Rejected unparseable MCP message: {}", e);
            return Ok(text_response(StatusCode::BAD_REQUEST, "Could not parse message"));
        }
    };

    let server = Arc::clone(&state.server);
    tokio::spawn(async move {
        let Some(response) = server.handle_message(request).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(json) => {
                if tx.send(encode_event(MESSAGE_EVENT, &json)).await.is_err() {
                    warn!("MCP session {} closed before its response was sent", session_id);
                }
            }
            Err(e) => error!("Failed to serialize MCP response: {}", e),
        }
    });

    Ok(text_response(StatusCode::ACCEPTED, "Accepted"))
}
