// Authentication and authorization middleware for protected routes

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{Role, User, UserResponse},
    repository::UserRepository,
    revocation::TokenRevocationStore,
    token::TokenService,
};

/// Authenticated principal attached to the request by `authenticate`
///
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<AuthenticatedUser> for UserResponse {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.user_id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Extract the token from an Authorization header value, if it uses the Bearer scheme
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Bearer-token authentication pipeline
///
/// extract token → reject if revoked → verify signature/expiry → load user.
pub struct Authenticator {
    tokens: Arc<TokenService>,
    revocations: Arc<dyn TokenRevocationStore>,
    users: Arc<dyn UserRepository>,
}

impl Authenticator {
    pub fn new(
        tokens: Arc<TokenService>,
        revocations: Arc<dyn TokenRevocationStore>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            tokens,
            revocations,
            users,
        }
    }

    /// Run the pipeline against a raw Authorization header value
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedUser, AuthError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        // A revoked token never authenticates, even if still signed and unexpired
        if self.revocations.is_revoked(token).await? {
            return Err(AuthError::TokenRevoked);
        }

        let claims = self.tokens.verify(token)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthenticatedUser::from(user))
    }
}

/// Middleware that authenticates the request and attaches `AuthenticatedUser`
///
/// Rejects with 401 before any downstream handler runs.
pub async fn authenticate(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let user = authenticator
        .authenticate(authorization.as_deref())
        .await
        .map_err(|e| {
            if !e.is_server_error() {
                warn!("Authentication failed for endpoint {}: {}", endpoint, e);
            }
            e
        })?;

    debug!(
        "Authenticated user_id={} role={} endpoint={}",
        user.user_id, user.role, endpoint
    );
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Authorization gate restricting a route to a set of roles
///
/// Must be layered inside `authenticate`; without a principal it rejects with 401.
#[derive(Debug, Clone)]
pub struct RequireRoles {
    allowed: Arc<[Role]>,
}

impl RequireRoles {
    pub fn new(allowed: &[Role]) -> Self {
        Self {
            allowed: Arc::from(allowed),
        }
    }

    /// Create a gate that requires the ADMIN role
    pub fn admin() -> Self {
        Self::new(&[Role::Admin])
    }

    /// Pure role check over an optional principal
    pub fn check(&self, principal: Option<&AuthenticatedUser>) -> Result<(), AuthError> {
        let user = principal.ok_or(AuthError::Unauthenticated)?;
        if self.allowed.contains(&user.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Middleware function that validates role-based access
    pub async fn middleware(self, request: Request, next: Next) -> Result<Response, AuthError> {
        {
            let principal = request.extensions().get::<AuthenticatedUser>();
            if let Err(e) = self.check(principal) {
                let endpoint = request.uri().path();
                match principal {
                    Some(user) => warn!(
                        "Authorization failed: user_id={}, role={}, allowed={:?}, endpoint={}",
                        user.user_id, user.role, self.allowed, endpoint
                    ),
                    None => warn!("Role gate reached without authenticated user, endpoint={}", endpoint),
                }
                return Err(e);
            }
        }

        Ok(next.run(request).await)
    }
}
