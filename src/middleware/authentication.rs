/// Access gate stage 1: authentication
///
/// Validates the bearer token from the Authorization header and injects the
/// resulting `AuthenticatedUser` into request extensions for downstream
/// stages and handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::access::{authenticate, Rejection};
use crate::configuration::JwtSettings;
use crate::middleware::reject;

/// Must wrap every route that requires a caller identity.
pub struct Authentication {
    jwt_config: Rc<JwtSettings>,
}

impl Authentication {
    pub fn new(jwt_config: JwtSettings) -> Self {
        Self {
            jwt_config: Rc::new(jwt_config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthenticationService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
        }))
    }
}

pub struct AuthenticationService<S> {
    service: Rc<S>,
    jwt_config: Rc<JwtSettings>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let header = match req.headers().get(AUTHORIZATION) {
            None => None,
            Some(value) => match value.to_str() {
                Ok(value) => Some(value),
                Err(_) => return reject(Rejection::MalformedHeader, req.path()),
            },
        };

        match authenticate(header, &self.jwt_config, chrono::Utc::now()) {
            Ok(user) => {
                tracing::debug!(
                    user_id = %user.user_id,
                    role = %user.role,
                    "JWT validated successfully"
                );
                req.extensions_mut().insert(user);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(rejection) => reject(rejection, req.path()),
        }
    }
}
