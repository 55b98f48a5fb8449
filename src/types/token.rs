//! Bearer token pair issued by the authentication service.

use serde::{Deserialize, Serialize};

/// Access token returned by sign-in and refresh.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Token {
    /// The bearer access token (a JWT).
    pub access_token: String,
    /// Token scheme, always `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token, when the service issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}
