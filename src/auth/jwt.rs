/// JWT Token Issuance and Verification
///
/// Verification is split into three steps so callers can order them:
/// signature first (`verify_signature`), then expiry (`check_expiry`), then
/// typed claims (`extract_claims`). Expiry is evaluated against a caller
/// supplied clock rather than inside `jsonwebtoken`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::error::TokenError;

/// HMAC family accepted on verification; anything else is rejected.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Generate an access token for a user, valid from now
///
/// # Errors
/// Returns `TokenError::Signing` if the signer rejects the key or claims, or
/// the configured lifetime overflows
pub fn generate_access_token(
    user_id: Uuid,
    username: &str,
    role: Role,
    config: &JwtSettings,
) -> Result<String, TokenError> {
    generate_access_token_at(user_id, username, role, config, Utc::now())
}

/// Generate an access token as if issued at `now`
pub fn generate_access_token_at(
    user_id: Uuid,
    username: &str,
    role: Role,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let claims = Claims::new(
        user_id,
        username,
        role,
        config.access_token_expiry_hours,
        &config.issuer,
        now,
    )?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "JWT signing failed");
        TokenError::Signing(e.to_string())
    })
}

fn validation(config: &JwtSettings) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    validation.set_issuer(&[&config.issuer]);
    // exp is checked by `check_expiry` against an explicit clock
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    validation
}

fn decode_untyped(token: &str, config: &JwtSettings) -> Result<HashMap<String, Value>, TokenError> {
    decode::<HashMap<String, Value>>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation(config),
    )
    .map(|data| data.claims)
    .map_err(|e| TokenError::Invalid(e.to_string()))
}

/// Check the token's signature, algorithm and issuer. Expiry is not checked.
pub fn verify_signature(token: &str, config: &JwtSettings) -> Result<(), TokenError> {
    decode_untyped(token, config).map(|_| ())
}

/// `Ok(false)` once the token's `exp` lies strictly before now
pub fn check_expiry(token: &str, config: &JwtSettings) -> Result<bool, TokenError> {
    check_expiry_at(token, config, Utc::now())
}

/// Like `check_expiry`, evaluated at `now`
///
/// # Errors
/// A missing or non-numeric `exp` claim is `TokenError::MissingExpiry`
pub fn check_expiry_at(
    token: &str,
    config: &JwtSettings,
    now: DateTime<Utc>,
) -> Result<bool, TokenError> {
    let claims = decode_untyped(token, config)?;

    let exp = claims
        .get("exp")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or(TokenError::MissingExpiry)?;

    Ok(exp >= now.timestamp())
}

/// Decode the typed claims of a signed token
///
/// # Errors
/// - `InvalidClaims` if a claim has the wrong type (e.g. a numeric role)
/// - `Invalid` for any signature or format problem
pub fn extract_claims(token: &str, config: &JwtSettings) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation(config),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::Json(_) => TokenError::InvalidClaims(e.to_string()),
        _ => TokenError::Invalid(e.to_string()),
    })
}
