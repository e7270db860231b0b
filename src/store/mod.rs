//! Credential store.
//!
//! `UserRepository` is the capability the account use cases depend on; the
//! concrete store is picked at startup and injected.

mod memory;
mod postgres;

pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::error::StoreError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn count_all(&self) -> Result<u64, StoreError>;

    /// Fails with `UniqueViolation` if the email or username is taken, or if
    /// `user.bootstrap_admin` is set and a bootstrap admin already exists.
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Sets the role. Writing the role a user already has leaves the record
    /// untouched, `updated_at` included.
    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), StoreError>;

    async fn list_all(&self) -> Result<Vec<User>, StoreError>;
}
