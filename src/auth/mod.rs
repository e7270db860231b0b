/// Authentication module
///
/// Password hashing, access token issuance and token verification.

mod claims;
mod jwt;
mod password;

pub use claims::Claims;
pub use jwt::check_expiry;
pub use jwt::check_expiry_at;
pub use jwt::extract_claims;
pub use jwt::generate_access_token;
pub use jwt::generate_access_token_at;
pub use jwt::verify_signature;
pub use password::hash_password;
pub use password::verify_password;
