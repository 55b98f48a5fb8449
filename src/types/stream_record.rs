//! Wire representation of one NDJSON streaming record.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One line of an `application/x-ndjson` streaming response body.
///
/// Non-terminal records carry an incremental content fragment, either nested
/// under `message.content` or as a flat `content` field. The terminal record
/// is marked `done: true` and optionally carries a `sources` payload and an
/// in-band `error` string. Records exist only transiently while a line is
/// decoded; they are never persisted.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StreamRecord {
    /// Marks the terminal record of the stream.
    #[serde(default)]
    pub done: bool,
    /// Nested message shape, matching the upstream chat wire format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<RecordMessage>,
    /// Flat alternate content shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Opaque citations payload, present only on the terminal record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<serde_json::Value>,
    /// In-band generation failure reported by the service on a terminal record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model that produced this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Timestamp the service attached to this record.
    #[serde(default, with = "crate::utils::time", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

/// The nested `message` object of a [`StreamRecord`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RecordMessage {
    /// Role of the message author, `assistant` on every observed record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Incremental content fragment.
    #[serde(default)]
    pub content: String,
}

impl StreamRecord {
    /// Returns the content fragment of a non-terminal record, preferring the
    /// nested `message.content` shape over the flat `content` field. Empty
    /// fragments are treated as absent.
    pub fn content_fragment(&self) -> Option<&str> {
        if let Some(message) = &self.message {
            if !message.content.is_empty() {
                return Some(&message.content);
            }
        }
        match self.content.as_deref() {
            Some(content) if !content.is_empty() => Some(content),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_shape() {
        let record: StreamRecord =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"partial"},"done":false}"#)
                .unwrap();
        assert!(!record.done);
        assert_eq!(record.content_fragment(), Some("partial"));
    }

    #[test]
    fn parses_flat_shape() {
        let record: StreamRecord = serde_json::from_str(r#"{"content":"partial"}"#).unwrap();
        assert_eq!(record.content_fragment(), Some("partial"));
    }

    #[test]
    fn nested_shape_wins() {
        let record: StreamRecord =
            serde_json::from_str(r#"{"message":{"content":"nested"},"content":"flat"}"#).unwrap();
        assert_eq!(record.content_fragment(), Some("nested"));
    }

    #[test]
    fn empty_nested_falls_back_to_flat() {
        let record: StreamRecord =
            serde_json::from_str(r#"{"message":{"content":""},"content":"flat"}"#).unwrap();
        assert_eq!(record.content_fragment(), Some("flat"));
    }

    #[test]
    fn parses_terminal_record() {
        let record: StreamRecord = serde_json::from_str(
            r#"{"model":"llama3.1:latest","created_at":"2024-05-01T12:30:00+00:00Z","message":{"role":"assistant","content":""},"sources":["IEC 61850-7-2 §9.1"],"done":true}"#,
        )
        .unwrap();
        assert!(record.done);
        assert!(record.sources.is_some());
        assert!(record.content_fragment().is_none());
        assert!(record.created_at.is_some());
    }

    #[test]
    fn unknown_fields_ignored() {
        let record: StreamRecord =
            serde_json::from_str(r#"{"content":"x","eval_count":42}"#).unwrap();
        assert_eq!(record.content_fragment(), Some("x"));
    }
}
