//! User account entities for the authentication service.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A user account as reported by the authentication service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct User {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Whether the account may sign in. Inactive accounts authenticate but
    /// are rejected by every protected endpoint.
    #[serde(default)]
    pub active: bool,
    /// Role name, `agent` by default, `admin` for administrators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Account creation time.
    #[serde(default, with = "crate::utils::time", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

/// Payload for creating a new account via sign-up.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Plaintext password; the service stores only a hash.
    pub password: String,
}

impl NewUser {
    /// Creates a sign-up payload.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user() {
        let user: User = serde_json::from_str(
            r#"{"id":"665f1c2e","username":"admin","email":"admin@example.com","active":true,"role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(user.username, "admin");
        assert!(user.active);
        assert_eq!(user.role.as_deref(), Some("admin"));
    }

    #[test]
    fn inactive_by_default() {
        let user: User =
            serde_json::from_str(r#"{"username":"u","email":"u@example.com"}"#).unwrap();
        assert!(!user.active);
    }
}
