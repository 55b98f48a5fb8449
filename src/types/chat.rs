//! Chat transcript entities.

use serde::{Deserialize, Serialize};

/// One message of a chat transcript, tagged by author role.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    /// A message typed by the user.
    User {
        /// Message text.
        content: String,
    },
    /// A reply generated by the assistant.
    Assistant {
        /// Reply text, accumulated from streamed deltas.
        content: String,
        /// Chain-of-thought text, when the model exposes one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
        /// Model that generated the reply.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// A system instruction.
    System {
        /// Instruction text.
        content: String,
    },
    /// A terminal error bubble shown in place of a reply. Only transport-
    /// and body-level failures produce one; malformed individual stream
    /// lines never do.
    Error {
        /// Error text.
        content: String,
    },
}

impl ChatMessage {
    /// Returns the message text regardless of role.
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::User { content }
            | ChatMessage::Assistant { content, .. }
            | ChatMessage::System { content }
            | ChatMessage::Error { content } => content,
        }
    }
}

/// Token usage recorded for a chat.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TokenUsage {
    /// Tokens consumed by prompts.
    #[serde(rename = "inTokens")]
    pub in_tokens: u64,
    /// Tokens produced by replies.
    #[serde(rename = "outTokens")]
    pub out_tokens: u64,
}

/// One stored conversation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Chat {
    /// Caller-assigned identifier, unique within a history store.
    pub id: String,
    /// Display title, when one has been set.
    pub title: Option<String>,
    /// Accumulated token usage.
    pub token: TokenUsage,
    /// Messages in arrival order.
    pub conversation: Vec<ChatMessage>,
}

impl Chat {
    /// Creates an empty chat with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            token: TokenUsage::default(),
            conversation: Vec::new(),
        }
    }

    /// Sets the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a message to the conversation.
    pub fn push(&mut self, message: ChatMessage) {
        self.conversation.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_roles_tag_serialization() {
        let message = ChatMessage::Assistant {
            content: "hi".to_string(),
            reasoning: None,
            model: Some("llama3.1:latest".to_string()),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "hi");
        assert_eq!(value["model"], "llama3.1:latest");
        assert!(value.get("reasoning").is_none());
    }

    #[test]
    fn error_messages_round_trip() {
        let message = ChatMessage::Error {
            content: "Connection error: refused".to_string(),
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(message, back);
    }

    #[test]
    fn token_usage_wire_names() {
        let usage = TokenUsage {
            in_tokens: 3,
            out_tokens: 7,
        };
        let value = serde_json::to_value(usage).unwrap();
        assert_eq!(value, serde_json::json!({"inTokens": 3, "outTokens": 7}));
    }

    #[test]
    fn chat_accumulates_messages() {
        let mut chat = Chat::new("c-1").with_title("grounding rules");
        chat.push(ChatMessage::User {
            content: "q".to_string(),
        });
        chat.push(ChatMessage::Assistant {
            content: "a".to_string(),
            reasoning: None,
            model: None,
        });
        assert_eq!(chat.conversation.len(), 2);
        assert_eq!(chat.conversation[1].content(), "a");
    }
}
