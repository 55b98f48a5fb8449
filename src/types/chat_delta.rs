//! Incremental output units produced by the stream consumer.

use serde::{Deserialize, Serialize};

/// Payload of one delta: an incremental text fragment, or the citations
/// payload carried by the terminal record.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeltaContent {
    /// An incremental fragment of generated text.
    Text(String),
    /// The opaque citations payload from the terminal record.
    Sources(serde_json::Value),
}

/// Nested message wrapper mirroring the delta payload.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DeltaMessage {
    /// Same payload as the enclosing delta's `content`.
    pub content: DeltaContent,
}

/// One incremental unit surfaced to the caller while a response streams.
///
/// The payload is mirrored into the nested `message.content` field so
/// consumers written against the upstream chat wire shape keep working;
/// both fields always hold the same value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChatDelta {
    /// The text or citations payload for this step.
    pub content: DeltaContent,
    /// Legacy nested shape mirroring `content`.
    pub message: DeltaMessage,
}

impl ChatDelta {
    /// Creates a text delta.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_content(DeltaContent::Text(content.into()))
    }

    /// Creates the final citations delta.
    pub fn sources(sources: serde_json::Value) -> Self {
        Self::from_content(DeltaContent::Sources(sources))
    }

    fn from_content(content: DeltaContent) -> Self {
        Self {
            message: DeltaMessage {
                content: content.clone(),
            },
            content,
        }
    }

    /// Returns the text fragment, if this is a text delta.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            DeltaContent::Text(text) => Some(text),
            DeltaContent::Sources(_) => None,
        }
    }

    /// Returns the citations payload, if this is the final sources delta.
    pub fn as_sources(&self) -> Option<&serde_json::Value> {
        match &self.content {
            DeltaContent::Text(_) => None,
            DeltaContent::Sources(sources) => Some(sources),
        }
    }

    /// Returns true if this delta carries the citations payload.
    pub fn is_sources(&self) -> bool {
        matches!(self.content, DeltaContent::Sources(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_delta_mirrors_message() {
        let delta = ChatDelta::text("hello");
        assert_eq!(delta.as_text(), Some("hello"));
        assert_eq!(delta.content, delta.message.content);
        assert!(!delta.is_sources());
    }

    #[test]
    fn sources_delta() {
        let delta = ChatDelta::sources(json!(["doc a", "doc b"]));
        assert!(delta.is_sources());
        assert_eq!(delta.as_sources(), Some(&json!(["doc a", "doc b"])));
        assert!(delta.as_text().is_none());
    }

    #[test]
    fn serializes_legacy_shape() {
        let delta = ChatDelta::text("x");
        let value = serde_json::to_value(&delta).unwrap();
        assert_eq!(value, json!({"content": "x", "message": {"content": "x"}}));
    }
}
