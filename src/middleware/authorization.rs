/// Access gate stage 2: authorization
///
/// Compares the identity attached by `Authentication` with the privilege the
/// scope requires. Must be wrapped inside `Authentication` so that it runs
/// after it.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::access::{authorize, AuthenticatedUser, Privilege};
use crate::middleware::reject;

pub struct Authorization {
    required: Privilege,
}

impl Authorization {
    pub fn new(required: Privilege) -> Self {
        Self { required }
    }

    pub fn admin() -> Self {
        Self::new(Privilege::Admin)
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authorization
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthorizationService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthorizationService {
            service: Rc::new(service),
            required: self.required,
        }))
    }
}

pub struct AuthorizationService<S> {
    service: Rc<S>,
    required: Privilege,
}

impl<S, B> Service<ServiceRequest> for AuthorizationService<S>
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
        let decision = authorize(
            req.extensions().get::<AuthenticatedUser>(),
            self.required,
        );

        match decision {
            Ok(()) => {
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(rejection) => reject(rejection, req.path()),
        }
    }
}
