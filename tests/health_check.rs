//! Integration tests for the taskgate server

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use taskgate::accounts::Accounts;
use taskgate::configuration::JwtSettings;
use taskgate::startup::run;
use taskgate::store::InMemoryUserRepository;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let jwt_config = JwtSettings {
        secret: "health-check-secret".to_string(),
        access_token_expiry_hours: 1,
        issuer: "taskgate-test".to_string(),
    };
    let accounts = Accounts::new(
        Arc::new(InMemoryUserRepository::new()),
        jwt_config.clone(),
        Duration::from_secs(5),
        4,
    );
    let server = run(listener, accounts, jwt_config).expect("Failed to create server");

    let _ = tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .header("Authorization", "Bearer garbage")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
}
