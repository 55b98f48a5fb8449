//! Request payload for document comparison.

use serde::{Deserialize, Serialize};

/// Parameters for comparing two documents against the RAG service.
///
/// Comparison responses stream over the same NDJSON record contract as chat;
/// only the endpoint and payload differ.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CompareRequest {
    /// Full text of the first document.
    pub file1_content: String,
    /// Display name of the first document.
    pub file1_name: String,
    /// Full text of the second document.
    pub file2_content: String,
    /// Display name of the second document.
    pub file2_name: String,
    /// Comparison mode understood by the service.
    pub mode: String,
    /// Model to generate with; the service picks its default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Document collection to retrieve context from. Must be non-empty.
    pub collection_name: String,
}

impl CompareRequest {
    /// Creates a comparison request for the given documents and collection.
    pub fn new(
        file1: (impl Into<String>, impl Into<String>),
        file2: (impl Into<String>, impl Into<String>),
        mode: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Self {
        let (file1_name, file1_content) = file1;
        let (file2_name, file2_content) = file2;
        Self {
            file1_content: file1_content.into(),
            file1_name: file1_name.into(),
            file2_content: file2_content.into(),
            file2_name: file2_name.into(),
            mode: mode.into(),
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
