//! Access token middleware.
//!
//! Wrap a scope with [`JwtMiddlewareFactory`] to require a valid access token on every route inside it. The middleware
//! 1. reads the token from the `Authorization: Bearer` or `mkt_access_token` header,
//! 2. verifies its signature and expiry,
//! 3. checks that the account still exists and has not been disabled, and
//! 4. stores the [`JwtClaims`] in the request extensions for handlers and the ACL middleware.
//!
//! The account check uses the `AuthApi<B>` registered as app data, so `B` must match the backend the app was built
//! with.

use std::{marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use marketplace_engine::{AuthApi, AuthApiError, AuthManagement};

use crate::{
    auth::{token_from_request, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory<B> {
    issuer: TokenIssuer,
    _backend: PhantomData<B>,
}

impl<B> JwtMiddlewareFactory<B> {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer, _backend: PhantomData }
    }
}

impl<S, Body, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory<B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<Body>;
    type Transform = JwtMiddlewareService<S, B>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { issuer: self.issuer.clone(), service: Rc::new(service), _backend: PhantomData })
    }
}

pub struct JwtMiddlewareService<S, B> {
    issuer: TokenIssuer,
    service: Rc<S>,
    _backend: PhantomData<B>,
}

impl<S, Body, B> Service<ServiceRequest> for JwtMiddlewareService<S, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<Body>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let issuer = self.issuer.clone();
        Box::pin(async move {
            let token = token_from_request(req.request()).ok_or_else(|| {
                debug!("🔑️ No access token on request to {}", req.path());
                ServerError::AuthenticationError(AuthError::MissingToken)
            })?;
            let claims = issuer.verify_token(&token).map_err(|e| {
                debug!("🔑️ Rejected access token on request to {}. {e}", req.path());
                ServerError::AuthenticationError(e)
            })?;
            let api = req.app_data::<web::Data<AuthApi<B>>>().cloned().ok_or_else(|| {
                error!("🔑️ The JWT middleware needs AuthApi app data, but none is registered for this backend");
                ServerError::InitializeError("Authentication backend is not configured".into())
            })?;
            match api.active_user(claims.sub).await {
                Ok(_) => {},
                Err(AuthApiError::AccountDisabled) => {
                    info!("🔑️ Refusing request from disabled account #{}", claims.sub);
                    return Err(ServerError::AuthenticationError(AuthError::AccountDisabled).into());
                },
                Err(AuthApiError::UserNotFound(_)) => {
                    warn!("🔑️ Token for user #{} refers to a missing account", claims.sub);
                    return Err(ServerError::AuthenticationError(AuthError::AccountNotFound).into());
                },
                Err(e) => return Err(ServerError::from(e).into()),
            }
            trace!("🔑️ Access token for user #{} accepted", claims.sub);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
