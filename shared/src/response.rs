//! Backend response envelopes
//!
//! List endpoints wrap their rows as `{ "data": [...] }`. Failed requests
//! carry a `detail` field that is either a plain message or a list of
//! validation entries:
//!
//! ```json
//! { "detail": "Order not found" }
//! { "detail": [{ "loc": ["body", "order"], "msg": "field required" }] }
//! ```

use serde::{Deserialize, Serialize};

/// `{ "data": [...] }` list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message extracted from `detail`.
    ///
    /// Validation lists are flattened to their `msg` entries joined with `", "`.
    /// Entries without a `msg` are rendered as raw JSON.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(entries) => Some(
                entries
                    .iter()
                    .map(|e| match e.get("msg").and_then(|m| m.as_str()) {
                        Some(msg) => msg.to_string(),
                        None => e.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
