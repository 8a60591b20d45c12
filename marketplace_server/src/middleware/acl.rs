//! Access control list middleware for the marketplace server.
//! This middleware can be placed on any route or service that sits behind the
//! [`JwtMiddlewareFactory`](super::JwtMiddlewareFactory).
//!
//! It checks the claims that the JWT middleware left in the request extensions against the roles required for the
//! route. If the user has every required role, the request is allowed to continue. Otherwise a 403 Forbidden response
//! is returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use marketplace_engine::db_types::Role;

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let claims = req.extensions().get::<JwtClaims>().cloned();
            let claims = claims.ok_or_else(|| {
                warn!("🔑️ No JWT claims found in request extensions. Is the ACL outside the JWT middleware?");
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            if required_roles.iter().all(|role| claims.roles.contains(role)) {
                service.call(req).await
            } else {
                debug!("🔑️ User #{} tried to access {} without the required roles", claims.sub, req.path());
                let err = AuthError::InsufficientPermissions(format!("This route requires {required_roles:?}"));
                Err(ServerError::AuthenticationError(err).into())
            }
        })
    }
}
