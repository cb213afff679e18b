//! `text/event-stream` framing for the SSE server

use hyper::body::Bytes;

/// Event announcing where the client must POST its messages
pub const ENDPOINT_EVENT: &str = "endpoint";
/// Event carrying one JSON-RPC response
pub const MESSAGE_EVENT: &str = "message";

/// Encode a named event. Multi-line data is split across `data:` fields.
pub fn encode_event(event: &str, data: &str) -> Bytes {
    let mut frame = format!("event: {event}\n");
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line.strip_suffix('\r').unwrap_or(line));
        frame.push('\n');
    }
    frame.push('\n');
    Bytes::from(frame)
}

/// Comment frame used to keep idle connections open
pub fn keep_alive() -> Bytes {
    Bytes::from_static(b": ping\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_event() {
        let frame = encode_event(ENDPOINT_EVENT, "/messages/?session_id=abc");
        assert_eq!(
            &frame[..],
            b"event: endpoint\ndata: /messages/?session_id=abc\n\n"
        );
    }

    #[test]
    fn test_encode_multiline_data() {
        let frame = encode_event(MESSAGE_EVENT, "a\r\nb");
        assert_eq!(&frame[..], b"event: message\ndata: a\ndata: b\n\n");
    }

    #[test]
    fn test_keep_alive_is_a_comment() {
        assert!(keep_alive().starts_with(b":"));
        assert!(keep_alive().ends_with(b"\n\n"));
    }
}
