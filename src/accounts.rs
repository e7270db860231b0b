/// Account use cases
///
/// Registration, login and promotion on top of an injected `UserRepository`.
/// Every store call is bounded by the configured deadline and bcrypt work runs
/// on the blocking pool.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{generate_access_token, hash_password, verify_password};
use crate::configuration::JwtSettings;
use crate::domain::{NewUser, Role, User};
use crate::error::{AppError, CredentialError, StoreError, UniqueField};
use crate::store::UserRepository;
use crate::validators::{
    is_valid_email, is_valid_name, is_valid_password, is_valid_username, require_field,
};

/// Raw registration data as received from the client
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A stored user together with the token issued at sign-up
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub access_token: String,
}

#[derive(Clone)]
pub struct Accounts {
    repo: Arc<dyn UserRepository>,
    jwt: JwtSettings,
    timeout: Duration,
    bcrypt_cost: u32,
}

impl Accounts {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        jwt: JwtSettings,
        timeout: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            repo,
            jwt,
            timeout,
            bcrypt_cost,
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    /// Registers a user and issues their first access token.
    ///
    /// The first user in an empty store becomes `ADMIN`, everyone after that
    /// starts as `USER`. A registration that loses the race for the
    /// first-user grant is stored as a regular `USER` instead.
    ///
    /// # Errors
    /// - `Validation` for malformed fields
    /// - `DuplicateEmail` / `DuplicateUsername` when taken
    pub async fn register(&self, input: RegisterInput) -> Result<Registration, AppError> {
        let first_name = is_valid_name("first_name", &input.first_name)?;
        let last_name = is_valid_name("last_name", &input.last_name)?;
        let username = is_valid_username(&input.username)?;
        let email = is_valid_email(&input.email)?;
        is_valid_password(&input.password)?;

        let email_taken = self.bounded(self.repo.find_by_email(&email)).await?;
        let username_taken = self.bounded(self.repo.find_by_username(&username)).await?;
        if email_taken.is_some() {
            return Err(CredentialError::DuplicateEmail.into());
        }
        if username_taken.is_some() {
            return Err(CredentialError::DuplicateUsername.into());
        }

        let first_user = self.bounded(self.repo.count_all()).await? == 0;

        let password_hash = self.hash(input.password).await?;

        let new_user = NewUser {
            first_name,
            last_name,
            username,
            email,
            password_hash,
        };
        let now = Utc::now();

        let user = match self.insert(new_user.clone().into_user(first_user, now)).await {
            // Another registration took the bootstrap grant between count and insert.
            Err(StoreError::UniqueViolation(UniqueField::BootstrapAdmin)) => {
                tracing::info!("Lost the first-user race, registering as a regular user");
                self.insert(new_user.into_user(false, now)).await
            }
            other => other,
        }
        .map_err(|e| match e {
            StoreError::UniqueViolation(UniqueField::Email) => {
                AppError::from(CredentialError::DuplicateEmail)
            }
            StoreError::UniqueViolation(UniqueField::Username) => {
                AppError::from(CredentialError::DuplicateUsername)
            }
            StoreError::UniqueViolation(UniqueField::BootstrapAdmin) => {
                AppError::from(CredentialError::RegistrationConflict)
            }
            other => AppError::from(other),
        })?;

        let access_token = generate_access_token(user.id, &user.username, user.role, &self.jwt)?;

        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            "User registered"
        );

        Ok(Registration { user, access_token })
    }

    /// Checks a username/password pair and issues an access token.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        require_field("username", username)?;
        require_field("password", password)?;

        let user = self
            .bounded(self.repo.find_by_username(username))
            .await?
            .ok_or(CredentialError::InvalidCredentials)?;

        let password = password.to_string();
        let password_hash = user.password_hash.clone();
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;

        let token = generate_access_token(user.id, &user.username, user.role, &self.jwt)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Grants `ADMIN` to a user and returns the stored record. Promoting an
    /// admin is a no-op.
    pub async fn promote(&self, user_id: Uuid) -> Result<User, AppError> {
        let before = self
            .bounded(self.repo.find_by_id(user_id))
            .await?
            .ok_or(CredentialError::UserNotFound)?;

        self.bounded(self.repo.update_role(user_id, Role::Admin))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AppError::from(CredentialError::UserNotFound),
                other => AppError::from(other),
            })?;

        let user = self
            .bounded(self.repo.find_by_id(user_id))
            .await?
            .ok_or(CredentialError::UserNotFound)?;

        if before.role != Role::Admin {
            tracing::info!(user_id = %user_id, "User promoted to admin");
        }
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.bounded(self.repo.list_all()).await?)
    }

    async fn insert(&self, user: User) -> Result<User, StoreError> {
        self.bounded(self.repo.insert(&user)).await?;
        Ok(user)
    }

    async fn hash(&self, password: String) -> Result<String, AppError> {
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))??;
        Ok(hash)
    }
}
