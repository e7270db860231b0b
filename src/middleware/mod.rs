/// Middleware module
///
/// The two access gate stages. Every rejection aborts the pipeline with a
/// 401 before the protected handler runs.

mod authentication;
mod authorization;

pub use authentication::Authentication;
pub use authorization::Authorization;

use actix_web::{error::InternalError, http::StatusCode, Error, HttpResponse};
use futures::future::LocalBoxFuture;

use crate::access::Rejection;
use crate::error::ErrorResponse;

fn reject<R: 'static>(rejection: Rejection, path: &str) -> LocalBoxFuture<'static, Result<R, Error>> {
    let error_id = uuid::Uuid::new_v4().to_string();
    tracing::warn!(
        error_id = %error_id,
        path = path,
        reason = %rejection,
        "Access gate rejected request"
    );

    let response = HttpResponse::Unauthorized().json(ErrorResponse::new(
        error_id,
        rejection.to_string(),
        rejection.code(),
        StatusCode::UNAUTHORIZED,
    ));

    Box::pin(async move { Err(InternalError::from_response(rejection, response).into()) })
}
