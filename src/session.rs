//! Explicit session state for authenticated requests.
//!
//! The session owns the bearer token pair and its expiry, with an explicit
//! install/refresh/expire lifecycle. Each client holds its own session;
//! concurrent streams on one client share a sign-in, and independent
//! clients share nothing.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::types::Token;

/// Claims the session reads out of the access token.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Expiry as a unix timestamp.
    exp: i64,
    /// Subject (the username); unused but kept for diagnostics.
    #[serde(default)]
    #[allow(dead_code)]
    sub: Option<String>,
}

#[derive(Clone, Debug)]
struct SessionTokens {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: OffsetDateTime,
}

/// Bearer token state for one client.
#[derive(Clone, Debug, Default)]
pub struct Session {
    tokens: Option<SessionTokens>,
}

impl Session {
    /// Creates an unauthenticated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session holding the given token.
    pub fn from_token(token: Token) -> Result<Self> {
        let mut session = Self::new();
        session.install(token)?;
        Ok(session)
    }

    /// Installs a freshly issued token pair, replacing any previous one.
    ///
    /// The access token must be a JWT with a readable `exp` claim; a token
    /// whose expiry cannot be determined is rejected rather than stored.
    pub fn install(&mut self, token: Token) -> Result<()> {
        let expires_at = jwt_expiry(&token.access_token)?;
        self.tokens = Some(SessionTokens {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
        });
        Ok(())
    }

    /// Drops the token pair, returning the session to the unauthenticated
    /// state.
    pub fn expire(&mut self) {
        self.tokens = None;
    }

    /// Returns the `Authorization` header value while the access token is
    /// unexpired; `None` otherwise.
    pub fn bearer(&self) -> Option<String> {
        let tokens = self.tokens.as_ref()?;
        if tokens.expires_at > OffsetDateTime::now_utc() {
            Some(format!("Bearer {}", tokens.access_token))
        } else {
            None
        }
    }

    /// Returns the refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref()?.refresh_token.as_deref()
    }

    /// Returns true when no usable access token is held.
    pub fn is_expired(&self) -> bool {
        self.bearer().is_none()
    }

    /// Returns the access token expiry, if a token is held.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.tokens.as_ref().map(|tokens| tokens.expires_at)
    }
}

/// Extracts the expiry from a JWT access token without verifying its
/// signature. Validation is the service's job; the client only needs to
/// know when to stop presenting the token.
fn jwt_expiry(token: &str) -> Result<OffsetDateTime> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(Error::authentication("access token is not a JWT"));
    };

    let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|err| {
        Error::authentication(format!("access token payload is not base64url: {err}"))
    })?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|err| {
        Error::authentication(format!("access token payload is not valid JSON: {err}"))
    })?;
    OffsetDateTime::from_unix_timestamp(claims.exp)
        .map_err(|err| Error::authentication(format!("access token expiry out of range: {err}")))
}
