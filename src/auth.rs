//! Token verification and permission gating.
//!
//! Token issuance, refresh and revocation live in the accounts service; this
//! core only verifies bearer tokens and checks module permissions, and uses
//! the actor id to stamp audit fields.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Permission string constants for compile-time safety
pub mod consts {
    pub const INVENTORY_READ: &str = "inventory:read";
    pub const INVENTORY_FULL: &str = "inventory:full";
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: opaque actor id
    pub sub: String,
    /// Granted permission strings (`module:action`)
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Expiry as a unix timestamp
    pub exp: usize,
}

/// The authenticated actor attached to a request after verification.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub permissions: Vec<String>,
}

impl AuthenticatedUser {
    /// `module:full` implies `module:read`; `*` grants everything.
    pub fn is_authorized(&self, permission: &str) -> bool {
        if self
            .permissions
            .iter()
            .any(|p| p == permission || p == "*")
        {
            return true;
        }
        match permission.split_once(':') {
            Some((module, "read")) => {
                let full = format!("{module}:full");
                self.permissions.iter().any(|p| *p == full)
            }
            _ => false,
        }
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("Missing authentication".into()))
    }
}

/// Verifies bearer tokens against the shared secret.
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| ServiceError::Unauthorized(format!("Invalid token: {}", err)))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Outer middleware that makes the verifier available to permission checks.
pub async fn inject_verifier(
    State(verifier): State<Arc<AuthVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(verifier);
    next.run(request).await
}

/// Permission middleware: authenticates the bearer token and checks that the
/// actor holds the required permission before the request proceeds.
pub async fn permission_middleware(
    State(required_permission): State<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let verifier = request
        .extensions()
        .get::<Arc<AuthVerifier>>()
        .cloned()
        .ok_or_else(|| ServiceError::InternalError("Auth verifier not configured".into()))?;

    let token = bearer_token(request.headers())
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".into()))?;
    let claims = verifier.verify(token)?;

    let user = AuthenticatedUser {
        id: claims.sub,
        permissions: claims.permissions,
    };

    if !user.is_authorized(&required_permission) {
        return Err(ServiceError::Forbidden(format!(
            "Requires permission {}",
            required_permission
        )));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub trait AuthRouterExt {
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
    }
}
