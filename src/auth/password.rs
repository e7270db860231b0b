/// Password Hashing and Verification
///
/// bcrypt with a configurable work factor. Input policy (length, emptiness)
/// is enforced by `validators` before anything reaches this module.

use bcrypt::{hash, verify};

use crate::error::PasswordError;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `HashingFailure` if bcrypt rejects the cost or cannot produce a salt
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    hash(password, cost).map_err(|e| PasswordError::HashingFailure(e.to_string()))
}

/// Verify a password against its stored hash
///
/// # Errors
/// - `Mismatch` if the password does not correspond to the hash
/// - `MalformedHash` if the stored hash cannot be parsed
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), PasswordError> {
    match verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PasswordError::Mismatch),
        Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
    }
}
