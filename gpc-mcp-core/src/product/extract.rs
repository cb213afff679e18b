//! JSON-LD extraction from HTML

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

#[allow(clippy::expect_used)] // Static initialization with hardcoded regex - panic is appropriate
static SCRIPT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>")
        .expect("Hardcoded script regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static JSONLD_TYPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)type\s*=\s*["']?\s*application/ld\+json\b"#)
        .expect("Hardcoded JSON-LD type regex pattern should be valid")
});

/// Every JSON-LD record embedded in `html`, in document order.
///
/// Top-level arrays are flattened into their elements. A `@graph` container
/// stays one record so its `@context` and nodes travel together. Blocks that
/// are not valid JSON are skipped.
pub fn extract_jsonld(html: &str) -> Vec<Value> {
    let mut records = Vec::new();

    for captures in SCRIPT_REGEX.captures_iter(html) {
        let attrs = captures.get(1).map_or("", |m| m.as_str());
        if !JSONLD_TYPE_REGEX.is_match(attrs) {
            continue;
        }
        let body = captures.get(2).map_or("", |m| m.as_str());
        let body = strip_wrappers(body);
        if body.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(items)) => records.extend(items),
            Ok(value) => records.push(value),
            Err(e) => debug!("Skipping unparseable JSON-LD block: {}", e),
        }
    }

    records
}

/// Drop comment and CDATA wrappers some CMSs put around script bodies
fn strip_wrappers(body: &str) -> &str {
    let mut body = body.trim();
    for prefix in ["<!--", "//<![CDATA[", "<![CDATA["] {
        if let Some(rest) = body.strip_prefix(prefix) {
            body = rest.trim_start();
        }
    }
    for suffix in ["-->", "//]]>", "]]>"] {
        if let Some(rest) = body.strip_suffix(suffix) {
            body = rest.trim_end();
        }
    }
    body
}
