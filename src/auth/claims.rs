/// JWT Claims structure
///
/// The payload of an access token: who the subject is, the role they held at
/// issuance, and the validity window (RFC 7519 `iat`/`exp`/`iss`).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Role;
use crate::error::TokenError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub username: String,
    /// Role captured at issuance, not re-read from the store
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create claims valid from `now` for `ttl_hours`.
    ///
    /// Pure in its inputs: the same arguments always produce the same claims.
    ///
    /// # Errors
    /// `TokenError::Signing` if `now + ttl_hours` is not a representable time
    pub fn new(
        user_id: Uuid,
        username: &str,
        role: Role,
        ttl_hours: i64,
        issuer: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        let expires_at = Duration::try_hours(ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                TokenError::Signing(format!("token lifetime of {} hours is out of range", ttl_hours))
            })?;

        Ok(Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: issuer.to_string(),
        })
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| TokenError::InvalidClaims("subject is not a user id".to_string()))
    }

    /// Expired means `exp` lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp < now.timestamp()
    }
}
