use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::AuthenticatedUser;
use crate::accounts::Accounts;
use crate::domain::Role;
use crate::error::{AppError, ValidationError};

/// Caller identity exactly as the token states it
#[derive(Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub expires_at: i64,
}

/// GET /api/me
pub async fn current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    let user = user.into_inner();
    HttpResponse::Ok().json(CurrentUserResponse {
        user_id: user.user_id,
        username: user.username,
        role: user.role,
        expires_at: user.expires_at,
    })
}

/// GET /api/users (admin only)
pub async fn list_users(accounts: web::Data<Accounts>) -> Result<HttpResponse, AppError> {
    let users = accounts.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// PUT /api/users/{id}/promote (admin only)
///
/// Idempotent: promoting an administrator answers 200 and changes nothing.
pub async fn promote_user(
    path: web::Path<String>,
    accounts: web::Data<Accounts>,
    caller: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let user_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| ValidationError::InvalidFormat("user id"))?;

    let user = accounts.promote(user_id).await?;
    tracing::info!(
        promoted_by = %caller.user_id,
        user_id = %user.id,
        "Promotion request completed"
    );

    Ok(HttpResponse::Ok().json(user))
}
