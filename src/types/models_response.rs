//! Reply of the model listing endpoint.

use serde::{Deserialize, Serialize};

/// Models available for chat and comparison requests.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ModelsResponse {
    /// Model identifiers as the service reports them.
    pub models: Vec<String>,
}
