//! Access tokens.
//!
//! Users log in with a password and receive an HS256-signed JWT. The token must accompany every request to the `/api`
//! scope, either as `Authorization: Bearer <token>` or in the `mkt_access_token` header. The
//! [`JwtMiddlewareFactory`](crate::middleware::JwtMiddlewareFactory) validates it and stores the [`JwtClaims`] in the
//! request extensions, where handlers pick them up by taking a `JwtClaims` argument.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use marketplace_engine::db_types::{Actor, Role, Roles, UserWithRoles};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "mkt_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id. Serialized as a string, as is customary for the `sub` claim.
    #[serde(with = "user_id_string")]
    pub sub: i64,
    pub username: String,
    pub roles: Roles,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(user_id: i64, username: S, roles: Roles, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self { sub: user_id, username: username.into(), roles, iat: now.timestamp(), exp: (now + lifetime).timestamp() }
    }

    pub fn user_id(&self) -> i64 {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.sub, &self.roles)
    }
}

mod user_id_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<i64>().map_err(D::Error::custom)
    }
}

/// Claims are placed in the request extensions by the JWT middleware. A handler that asks for them on a route outside
/// the middleware gets a 401.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// Claims for routes where authentication is optional. A missing or invalid token yields `None`.
#[derive(Debug, Clone, Default)]
pub struct OptionalClaims(pub Option<JwtClaims>);

impl OptionalClaims {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|c| c.sub)
    }
}

impl FromRequest for OptionalClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<JwtClaims>() {
            return ready(Ok(Self(Some(claims.clone()))));
        }
        let claims = match (token_from_request(req), req.app_data::<web::Data<TokenIssuer>>()) {
            (Some(token), Some(issuer)) => issuer
                .verify_token(&token)
                .map_err(|e| debug!("🔑️ Ignoring an invalid token on an optionally authenticated route. {e}"))
                .ok(),
            (Some(_), None) => {
                warn!("🔑️ No token issuer is configured. Treating the request as anonymous.");
                None
            },
            (None, _) => None,
        };
        ready(Ok(Self(claims)))
    }
}

/// Reads the access token from the `Authorization` header, falling back to the `mkt_access_token` header.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string());
    bearer.filter(|t| !t.is_empty()).or_else(|| {
        req.headers()
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.token_lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT check the user's credentials. This must be done prior to calling `issue_token`.
    pub fn issue_token(&self, user: &UserWithRoles) -> Result<(String, JwtClaims), AuthError> {
        let claims = JwtClaims::new(user.user.id, user.user.username.as_str(), user.roles.clone(), self.lifetime);
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(format!("Could not sign token. {e}")))
    }

    /// Checks the signature and expiry of the token, and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims)
    }
}
