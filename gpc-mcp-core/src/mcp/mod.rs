//! MCP (Model Context Protocol) server and client
//!
//! Serves the GPC tools over SSE or stdio, and calls them over SSE.

mod client;
mod event_stream;
mod protocol;
mod server;
mod sse;
mod transport;
pub mod tools;

pub use client::SseClient;
pub use event_stream::{ENDPOINT_EVENT, MESSAGE_EVENT, encode_event};
pub use protocol::*;
pub use server::*;
pub use sse::{HEALTH_PATH, MAX_MESSAGE_BYTES, SseMcpServer};
pub use transport::*;
