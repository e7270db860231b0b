use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserRepository;
use crate::domain::{Role, User};
use crate::error::{StoreError, UniqueField};

/// Process-local store. Each write holds the lock for its whole
/// check-and-insert, so uniqueness holds under concurrent registrations.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(UniqueField::Email));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation(UniqueField::Username));
        }
        if user.bootstrap_admin && users.iter().any(|u| u.bootstrap_admin) {
            return Err(StoreError::UniqueViolation(UniqueField::BootstrapAdmin));
        }

        users.push(user.clone());
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;

        if user.role != role {
            user.role = role;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        let mut users = self.users.read().await.clone();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;

    fn user(username: &str, email: &str, first: bool) -> User {
        NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
        }
        .into_user(first, Utc::now())
    }

    #[tokio::test]
    async fn insert_and_lookup() {
        let repo = InMemoryUserRepository::new();
        let alice = user("alice01", "alice@example.com", true);
        repo.insert(&alice).await.unwrap();

        assert_eq!(repo.count_all().await.unwrap(), 1);
        assert_eq!(
            repo.find_by_username("alice01").await.unwrap().map(|u| u.id),
            Some(alice.id)
        );
        assert_eq!(
            repo.find_by_email("alice@example.com").await.unwrap().map(|u| u.id),
            Some(alice.id)
        );
        assert!(repo.find_by_id(alice.id).await.unwrap().is_some());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_fields_are_enforced() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("alice01", "alice@example.com", true)).await.unwrap();

        let dup_email = repo.insert(&user("alice02", "alice@example.com", false)).await;
        assert!(matches!(
            dup_email,
            Err(StoreError::UniqueViolation(UniqueField::Email))
        ));

        let dup_name = repo.insert(&user("alice01", "other@example.com", false)).await;
        assert!(matches!(
            dup_name,
            Err(StoreError::UniqueViolation(UniqueField::Username))
        ));

        let second_bootstrap = repo.insert(&user("bobby01", "bob@example.com", true)).await;
        assert!(matches!(
            second_bootstrap,
            Err(StoreError::UniqueViolation(UniqueField::BootstrapAdmin))
        ));

        assert_eq!(repo.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_role_is_idempotent() {
        let repo = InMemoryUserRepository::new();
        let bob = user("bobby01", "bob@example.com", false);
        repo.insert(&bob).await.unwrap();

        repo.update_role(bob.id, Role::Admin).await.unwrap();
        let promoted = repo.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(promoted.role, Role::Admin);

        repo.update_role(bob.id, Role::Admin).await.unwrap();
        let again = repo.find_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(again.role, Role::Admin);
        assert_eq!(again.updated_at, promoted.updated_at);
    }

    #[tokio::test]
    async fn update_role_of_unknown_user() {
        let repo = InMemoryUserRepository::new();
        let result = repo.update_role(Uuid::new_v4(), Role::Admin).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
