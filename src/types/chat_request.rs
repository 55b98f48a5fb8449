//! Request payload for chat queries.

use serde::{Deserialize, Serialize};

/// Parameters for a chat query against the RAG service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChatRequest {
    /// The user's query text.
    pub query: String,
    /// Model to generate with; the service picks its default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Document collection to retrieve from. Must be non-empty; the client
    /// rejects requests without a selected collection before issuing them.
    pub collection_name: String,
}

impl ChatRequest {
    /// Creates a chat request for the given query and collection.
    pub fn new(query: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            model: None,
            collection_name: collection_name.into(),
        }
    }

    /// Sets the model to generate with.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
