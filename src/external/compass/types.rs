//! Wire types for the Compass API envelopes.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Standard envelope wrapping every JSON endpoint response.
///
/// `status` other than `"ok"` is the sole error signal carried in a body.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub response: Option<Map<String, Value>>,
}

impl ApiEnvelope {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// The `response` object, or an empty map when absent
    pub fn into_response(self) -> Map<String, Value> {
        self.response.unwrap_or_default()
    }
}

/// Picks the upload URL out of the `file/getUrl` response: `url` preferred,
/// `upload_url` as fallback when `url` is empty or absent.
pub fn extract_upload_url(meta: &Map<String, Value>) -> Option<String> {
    meta.get("url")
        .and_then(non_empty_str)
        .or_else(|| meta.get("upload_url").and_then(non_empty_str))
}

/// Picks the file identifier out of the upload response, which uses a
/// different envelope than the JSON API: either a bare `file_id` or one
/// nested under `response`, checked in that order. Numeric identifiers are
/// rendered as strings.
pub fn extract_file_id(body: &Value) -> Option<String> {
    let candidate = match body.get("file_id") {
        None | Some(Value::Null) => body.get("response").and_then(|r| r.get("file_id")),
        found => found,
    };

    match candidate {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
