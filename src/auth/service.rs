// Authentication service - register, login and logout use cases

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::{
        LoginRequest, LoginResponse, LoginUser, LogoutResponse, NewUser, RegisterRequest,
        RegisterResponse, Role,
    },
    password::PasswordService,
    repository::UserRepository,
    revocation::TokenRevocationStore,
    token::TokenService,
};

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    revocations: Arc<dyn TokenRevocationStore>,
    password_service: PasswordService,
    token_service: Arc<TokenService>,
    bootstrap_admin: bool,
}

impl AuthService {
    /// Create a new AuthService
    ///
    /// `bootstrap_admin` enables the development-only rule that promotes the very
    /// first registered user to ADMIN.
    pub fn new(
        users: Arc<dyn UserRepository>,
        revocations: Arc<dyn TokenRevocationStore>,
        password_service: PasswordService,
        token_service: Arc<TokenService>,
        bootstrap_admin: bool,
    ) -> Self {
        Self {
            users,
            revocations,
            password_service,
            token_service,
            bootstrap_admin,
        }
    }

    /// Register a new user
    ///
    /// 1. Reject an email that is already registered
    /// 2. Hash the password off the async runtime
    /// 3. Pick the role (TEAM_MEMBER, or ADMIN for the first user in bootstrap mode)
    /// 4. Persist and issue a token
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AuthError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            debug!("Registration rejected, email already registered: {}", request.email);
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = self.hash_password(request.password).await?;

        let role = if self.bootstrap_admin && self.users.count_users().await? == 0 {
            warn!("Bootstrap mode: promoting first registered user {} to ADMIN", request.email);
            Role::Admin
        } else {
            Role::TeamMember
        };

        let user = self
            .users
            .create(NewUser {
                email: request.email,
                name: request.name,
                password_hash,
                role,
            })
            .await?;

        let token = self.token_service.issue(&user)?;

        info!("Registered user_id={} role={}", user.id, user.role);
        Ok(RegisterResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            token,
        })
    }

    /// Login a user
    ///
    /// Unknown email and wrong password produce the same `InvalidCredentials` error.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = match self.users.find_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                debug!("Login failed: unknown email");
                // Same Argon2 cost as a wrong password, so timing does not reveal the account
                let hasher = self.password_service.clone();
                tokio::task::spawn_blocking(move || hasher.verify_without_account(&request.password))
                    .await
                    .map_err(|e| {
                        AuthError::Internal(format!("password verification task failed: {}", e))
                    })?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify_password(request.password, user.password_hash.clone()).await? {
            debug!("Login failed: wrong password for user_id={}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.token_service.issue(&user)?;

        info!("User logged in: user_id={}", user.id);
        Ok(LoginResponse {
            user: LoginUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
            token,
        })
    }

    /// Logout by revoking the presented token until its own expiry
    ///
    /// Accepts the raw token or a full "Bearer <token>" header value. A token that
    /// already fails verification is treated as logged out; store failures propagate.
    pub async fn logout(&self, raw_token: &str) -> Result<LogoutResponse, AuthError> {
        let token = strip_bearer(raw_token);

        match self.token_service.verify(token) {
            Ok(claims) => {
                self.revocations
                    .add(token, claims.sub, claims.expires_at())
                    .await?;
                info!("User logged out: user_id={}", claims.sub);
            }
            Err(AuthError::InvalidToken) => {
                debug!("Logout with an already invalid token, nothing to revoke");
            }
            Err(e) => return Err(e),
        }

        Ok(LogoutResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.password_service.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.password_service.clone();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))
    }
}

/// Strip an optional "Bearer " scheme prefix (scheme is case-insensitive)
pub fn strip_bearer(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}
