//! Access gate decisions.
//!
//! A request moves through
//! `Anonymous -> TokenPresented -> Authenticated{role} -> Authorized`,
//! and any failed step ends in a `Rejection`. Stage 1 (`authenticate`) covers
//! the first two transitions, stage 2 (`authorize`) the last. Both are pure so
//! the middleware only has to translate results into responses.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::auth::{check_expiry_at, extract_claims, verify_signature};
use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::error::TokenError;

/// What a route demands of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Any caller holding a valid token.
    Authenticated,
    Admin,
}

/// Identity attached to the request once authentication succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    /// As embedded in the token at issuance; may lag behind the store.
    pub role: Role,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingHeader,
    MalformedHeader,
    Token(TokenError),
    Expired,
    NotAllowed,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MissingHeader => "UNAUTHORIZED",
            Rejection::MalformedHeader => "UNAUTHORIZED",
            Rejection::Token(_) => "TOKEN_INVALID",
            Rejection::Expired => "TOKEN_EXPIRED",
            Rejection::NotAllowed => "NOT_ALLOWED",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingHeader => f.write_str("Authorization header is required"),
            Rejection::MalformedHeader => f.write_str("Invalid authorization header"),
            Rejection::Token(e) => write!(f, "{}", e),
            Rejection::Expired => write!(f, "{}", TokenError::Expired),
            Rejection::NotAllowed => f.write_str("User not allowed"),
        }
    }
}

impl From<TokenError> for Rejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Rejection::Expired,
            other => Rejection::Token(other),
        }
    }
}

/// `Anonymous -> TokenPresented`: pull the token out of `Bearer <token>`.
///
/// The scheme is matched case-insensitively and exactly one space-separated
/// token must follow it.
pub fn bearer_token(header: Option<&str>) -> Result<&str, Rejection> {
    let header = match header {
        Some(h) if !h.trim().is_empty() => h,
        _ => return Err(Rejection::MissingHeader),
    };

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() =>
        {
            Ok(token)
        }
        _ => Err(Rejection::MalformedHeader),
    }
}

/// Stage 1: header shape, then signature, then expiry, then typed claims.
pub fn authenticate(
    header: Option<&str>,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<AuthenticatedUser, Rejection> {
    let token = bearer_token(header)?;

    verify_signature(token, config)?;

    if !check_expiry_at(token, config, now)? {
        return Err(Rejection::Expired);
    }

    let claims = extract_claims(token, config)?;
    let user_id = claims.user_id()?;

    Ok(AuthenticatedUser {
        user_id,
        username: claims.username,
        role: claims.role,
        expires_at: claims.exp,
    })
}

/// Stage 2: `None` means stage 1 never attached an identity.
pub fn authorize(user: Option<&AuthenticatedUser>, required: Privilege) -> Result<(), Rejection> {
    let user = user.ok_or(Rejection::NotAllowed)?;

    match required {
        Privilege::Authenticated => Ok(()),
        Privilege::Admin if user.role.is_admin() => Ok(()),
        Privilege::Admin => Err(Rejection::NotAllowed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_access_token_at;
    use chrono::Duration;

    fn config() -> JwtSettings {
        JwtSettings {
            secret: "gate-test-secret-with-enough-entropy".to_string(),
            access_token_expiry_hours: 1,
            issuer: "gate-test".to_string(),
        }
    }

    fn bearer(role: Role, issued: DateTime<Utc>) -> (Uuid, String) {
        let user_id = Uuid::new_v4();
        let token = generate_access_token_at(user_id, "janedoe", role, &config(), issued).unwrap();
        (user_id, format!("Bearer {}", token))
    }

    #[test]
    fn missing_header_is_rejected() {
        assert_eq!(bearer_token(None), Err(Rejection::MissingHeader));
        assert_eq!(bearer_token(Some("")), Err(Rejection::MissingHeader));
        assert_eq!(
            Rejection::MissingHeader.to_string(),
            "Authorization header is required"
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in ["foo", "Bearer", "Bearer ", "Basic dXNlcjpwYXNz", "BearerToken", "Bearer a b"] {
            assert_eq!(
                bearer_token(Some(header)),
                Err(Rejection::MalformedHeader),
                "header {:?}",
                header
            );
        }
        assert_eq!(
            Rejection::MalformedHeader.to_string(),
            "Invalid authorization header"
        );
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(Some("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("BEARER abc")), Ok("abc"));
    }

    #[test]
    fn garbage_token_is_an_invalid_token() {
        let result = authenticate(Some("Bearer not.a.jwt"), &config(), Utc::now());
        assert!(matches!(result, Err(Rejection::Token(TokenError::Invalid(_)))));
    }

    #[test]
    fn expired_token_is_rejected_after_signature_check() {
        let issued = Utc::now() - Duration::hours(2);
        let (_, header) = bearer(Role::Admin, issued);

        assert_eq!(
            authenticate(Some(&header), &config(), Utc::now()),
            Err(Rejection::Expired)
        );
        assert_eq!(Rejection::Expired.to_string(), "JWT has expired");
    }

    #[test]
    fn valid_token_authenticates_with_embedded_role() {
        let issued = Utc::now();
        let (user_id, header) = bearer(Role::User, issued);

        let user = authenticate(Some(&header), &config(), issued + Duration::minutes(30)).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.username, "janedoe");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn authorization_matrix() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            username: "janedoe".to_string(),
            role: Role::User,
            expires_at: 0,
        };
        let admin = AuthenticatedUser {
            role: Role::Admin,
            ..user.clone()
        };

        assert_eq!(authorize(Some(&user), Privilege::Authenticated), Ok(()));
        assert_eq!(authorize(Some(&admin), Privilege::Authenticated), Ok(()));
        assert_eq!(authorize(Some(&admin), Privilege::Admin), Ok(()));
        assert_eq!(
            authorize(Some(&user), Privilege::Admin),
            Err(Rejection::NotAllowed)
        );
        assert_eq!(authorize(None, Privilege::Admin), Err(Rejection::NotAllowed));
        assert_eq!(
            authorize(None, Privilege::Authenticated),
            Err(Rejection::NotAllowed)
        );
        assert_eq!(Rejection::NotAllowed.to_string(), "User not allowed");
    }
}
