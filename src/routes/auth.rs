/// Authentication Routes
///
/// Public endpoints: registration and login. Both answer with a bearer token.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{Accounts, RegisterInput};
use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
    pub role: Role,
    pub access_token: String,
}

#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// POST /auth/register
///
/// Creates the account and signs the caller in. The first account ever
/// registered is an administrator.
///
/// # Errors
/// - 400: invalid fields, email or username already taken
/// - 409: lost a race for the first (admin) registration
/// - 500: store or hashing failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    accounts: web::Data<Accounts>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let registration = accounts
        .register(RegisterInput {
            first_name: form.first_name,
            last_name: form.last_name,
            username: form.username,
            email: form.email,
            password: form.password,
        })
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "user created".to_string(),
        user_id: registration.user.id,
        role: registration.user.role,
        access_token: registration.access_token,
    }))
}

/// POST /auth/login
///
/// # Errors
/// - 400: username or password missing
/// - 401: "incorrect username or password", whichever of the two was wrong
pub async fn login(
    form: web::Json<LoginRequest>,
    accounts: web::Data<Accounts>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let access_token = accounts.login(&form.username, &form.password).await?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry_seconds(),
    }))
}
