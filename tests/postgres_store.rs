//! Credential store tests against a real Postgres.
//!
//! Each test migrates a fresh database named after a random UUID, using the
//! `database` section of `configuration.yaml`. Run with
//! `cargo test --test postgres_store -- --ignored` once Postgres is up.

use chrono::Utc;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use taskgate::configuration::{get_configuration, DatabaseSettings};
use taskgate::domain::{NewUser, Role, User};
use taskgate::error::{StoreError, UniqueField};
use taskgate::store::{PgUserRepository, UserRepository};
use uuid::Uuid;

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.")
}

async fn spawn_repository() -> PgUserRepository {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();

    let pool = configure_database(&configuration.database).await;
    let repo = PgUserRepository::new(pool);
    repo.migrate().await.expect("Failed to migrate the database.");
    repo
}

fn user(username: &str, email: &str, first: bool) -> User {
    NewUser {
        first_name: "Barbara".to_string(),
        last_name: "Liskov".to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$hash".to_string(),
    }
    .into_user(first, Utc::now())
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn insert_and_lookup_round_trip() {
    let repo = spawn_repository().await;
    assert_eq!(repo.count_all().await.unwrap(), 0);

    let barbara = user("barbara", "barbara@example.com", true);
    repo.insert(&barbara).await.unwrap();

    assert_eq!(repo.count_all().await.unwrap(), 1);

    let by_name = repo.find_by_username("barbara").await.unwrap().unwrap();
    assert_eq!(by_name.id, barbara.id);
    assert_eq!(by_name.role, Role::Admin);
    assert!(by_name.bootstrap_admin);

    let by_email = repo.find_by_email("barbara@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, barbara.id);

    assert!(repo.find_by_id(barbara.id).await.unwrap().is_some());
    assert!(repo.find_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicate_email_and_username_are_unique_violations() {
    let repo = spawn_repository().await;
    repo.insert(&user("barbara", "barbara@example.com", true))
        .await
        .unwrap();

    let result = repo.insert(&user("barbie1", "barbara@example.com", false)).await;
    assert!(matches!(
        result,
        Err(StoreError::UniqueViolation(UniqueField::Email))
    ));

    let result = repo.insert(&user("barbara", "other@example.com", false)).await;
    assert!(matches!(
        result,
        Err(StoreError::UniqueViolation(UniqueField::Username))
    ));

    assert_eq!(repo.count_all().await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn only_one_bootstrap_admin_is_stored() {
    let repo = spawn_repository().await;
    repo.insert(&user("barbara", "barbara@example.com", true))
        .await
        .unwrap();

    let result = repo.insert(&user("alan001", "alan@example.com", true)).await;
    assert!(matches!(
        result,
        Err(StoreError::UniqueViolation(UniqueField::BootstrapAdmin))
    ));

    // Non-bootstrap rows are unaffected by the partial index.
    repo.insert(&user("alan001", "alan@example.com", false))
        .await
        .unwrap();
    assert_eq!(repo.count_all().await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn update_role_is_idempotent() {
    let repo = spawn_repository().await;
    repo.insert(&user("barbara", "barbara@example.com", true))
        .await
        .unwrap();
    let alan = user("alan001", "alan@example.com", false);
    repo.insert(&alan).await.unwrap();

    repo.update_role(alan.id, Role::Admin).await.unwrap();
    let promoted = repo.find_by_id(alan.id).await.unwrap().unwrap();
    assert_eq!(promoted.role, Role::Admin);

    repo.update_role(alan.id, Role::Admin).await.unwrap();
    let again = repo.find_by_id(alan.id).await.unwrap().unwrap();
    assert_eq!(again.role, Role::Admin);
    assert_eq!(again.updated_at, promoted.updated_at);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn update_role_of_unknown_user_is_not_found() {
    let repo = spawn_repository().await;

    let result = repo.update_role(Uuid::new_v4(), Role::Admin).await;
    assert!(matches!(result, Err(StoreError::NotFound)));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn list_all_returns_users_in_creation_order() {
    let repo = spawn_repository().await;
    let first = user("barbara", "barbara@example.com", true);
    repo.insert(&first).await.unwrap();
    let second = user("alan001", "alan@example.com", false);
    repo.insert(&second).await.unwrap();

    let users = repo.list_all().await.unwrap();
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}
