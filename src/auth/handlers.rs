// HTTP handlers for authentication endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, RegisterResponse,
        UserResponse,
    },
};
use crate::extract::JsonBody;
use crate::AppState;

/// Register a new user
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input data", body = String, example = json!({"error": "Request validation failed"})),
        (status = 409, description = "Email already registered", body = String, example = json!({"error": "User with this email already exists"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthError> {
    request.validate()?;
    let response = state.auth_service.register(request).await?;
    Ok(Json(response))
}

/// Login a user
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid input data", body = String, example = json!({"error": "Request validation failed"})),
        (status = 401, description = "Invalid credentials", body = String, example = json!({"error": "Invalid email or password"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    request.validate()?;
    let response = state.auth_service.login(request).await?;
    Ok(Json(response))
}

/// Revoke the presented token
/// POST /auth/logout
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Missing, invalid or revoked token", body = String, example = json!({"error": "Unauthorized"}))
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, AuthError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let response = state.auth_service.logout(authorization).await?;
    Ok(Json(response))
}

/// Get current user information
/// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Missing, invalid or revoked token", body = String, example = json!({"error": "Unauthorized"}))
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
