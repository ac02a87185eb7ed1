//! Property Exchange envelope.
//!
//! The application-layer convention carried inside SysEx7 payloads: a JSON
//! object with a `propertyId` discriminator, an optional `body`, and (on
//! responses) the upstream HTTP status. Request ids end in `.request`;
//! the matching response swaps the suffix for `.result`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property id suffix naming a request operation.
pub const REQUEST_SUFFIX: &str = ".request";

/// Property id suffix naming the matching response.
pub const RESULT_SUFFIX: &str = ".result";

/// A Property Exchange message.
///
/// `status` and `body` are omitted from the wire when absent; responses
/// always carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub property_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Envelope {
    /// Create a request envelope.
    pub fn request(property_id: impl Into<String>, body: Value) -> Self {
        Self {
            property_id: property_id.into(),
            status: None,
            body: Some(body),
        }
    }

    /// Create a response envelope carrying an HTTP status and body.
    pub fn result(property_id: impl Into<String>, status: u16, body: Value) -> Self {
        Self {
            property_id: property_id.into(),
            status: Some(status),
            body: Some(body),
        }
    }

    /// Parse an envelope from reassembled payload bytes.
    ///
    /// Returns `None` for anything that is not UTF-8, not a JSON object,
    /// or missing a string `propertyId`. Malformed wire input is dropped,
    /// never an error.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    /// Serialize to UTF-8 JSON bytes for chunking.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// `true` when the property id names a request operation.
    pub fn is_request(&self) -> bool {
        self.property_id.ends_with(REQUEST_SUFFIX)
    }
}

/// Derive the response property id for a request property id.
///
/// `persist.get.request` becomes `persist.get.result`; ids without the
/// request suffix come back unchanged.
pub fn result_property_id(request_id: &str) -> String {
    match request_id.strip_suffix(REQUEST_SUFFIX) {
        Some(prefix) => format!("{prefix}{RESULT_SUFFIX}"),
        None => request_id.to_string(),
    }
}
