//! Non-streaming chat and comparison responses.

use serde::{Deserialize, Serialize};

/// A complete, non-streaming reply from the chat or compare endpoints.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ChatResponse {
    /// The full generated answer.
    pub response: String,
    /// Citations backing the answer, when the service provides them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_sources() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"response":"answer","sources":["doc"]}"#).unwrap();
        assert_eq!(response.response, "answer");
        assert_eq!(response.sources.as_deref(), Some(&["doc".to_string()][..]));
    }

    #[test]
    fn parses_without_sources() {
        let response: ChatResponse = serde_json::from_str(r#"{"response":"answer"}"#).unwrap();
        assert!(response.sources.is_none());
    }
}
