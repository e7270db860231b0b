/// Error handling
///
/// Domain errors for each layer (validation, credentials, tokens, passwords,
/// store) roll up into `AppError`, which owns the mapping to HTTP status codes
/// and the JSON error body. Store failures are logged in full and answered
/// with a generic message.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Malformed request input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyField(&'static str),
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
}

/// Registration and login failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("email already in use")]
    DuplicateEmail,
    #[error("user name already taken")]
    DuplicateUsername,
    /// Login never says whether the user or the password was wrong.
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("registration conflicted with a concurrent registration, please retry")]
    RegistrationConflict,
}

/// Token verification failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("JWT has expired")]
    Expired,
    #[error("token has no valid expiry claim")]
    MissingExpiry,
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Password hashing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password does not match")]
    Mismatch,
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
    #[error("failed to hash password: {0}")]
    HashingFailure(String),
}

/// Unique fields guarded by the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
    BootstrapAdmin,
}

/// Credential store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated on {0:?}")]
    UniqueViolation(UniqueField),
    #[error("store operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            // A mismatch is only ever reported as a generic login failure.
            PasswordError::Mismatch | PasswordError::MalformedHash(_) => {
                AppError::Credential(CredentialError::InvalidCredentials)
            }
            PasswordError::HashingFailure(msg) => AppError::Internal(msg),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// JSON error body shared by handlers and the access gate
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with server logs
    pub error_id: String,
    /// Human-readable error message
    pub error: String,
    /// Error code for client-side handling
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, error: String, code: &str, status: StatusCode) -> Self {
        Self {
            error_id,
            error,
            code: code.to_string(),
            status: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Credential(e) => match e {
                CredentialError::DuplicateEmail => "DUPLICATE_EMAIL",
                CredentialError::DuplicateUsername => "DUPLICATE_USERNAME",
                CredentialError::InvalidCredentials => "INVALID_CREDENTIALS",
                CredentialError::UserNotFound => "USER_NOT_FOUND",
                CredentialError::RegistrationConflict => "REGISTRATION_CONFLICT",
            },
            AppError::Token(TokenError::Expired) => "TOKEN_EXPIRED",
            AppError::Token(_) => "TOKEN_INVALID",
            AppError::Store(StoreError::Timeout(_)) => "STORE_TIMEOUT",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The message sent to the client. Store and internal details stay in logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Store(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Token(TokenError::Signing(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Credential(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Credential error");
            }
            AppError::Token(TokenError::Signing(e)) => {
                tracing::error!(error_id = error_id, error = %e, "Token signing failed");
            }
            AppError::Token(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Token error");
            }
            AppError::Store(e) => {
                tracing::error!(error_id = error_id, error = %e, "Credential store error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Credential(e) => match e {
                CredentialError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                CredentialError::RegistrationConflict => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            self.public_message(),
            self.code(),
            status,
        ))
    }
}
