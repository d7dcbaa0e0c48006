// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::error::InternalErrorDetail;

/// Authentication and authorization error types
///
/// Token failures collapse into `InvalidToken` at this level; whether a token was
/// expired or tampered with is only visible in debug logs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Request errors
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Body that is not valid JSON for the expected shape
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("User with this email already exists")]
    DuplicateUser,

    #[error("Invalid email or password")]
    InvalidCredentials,

    // Authentication pipeline rejections
    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has been revoked")]
    TokenRevoked,

    /// Token subject no longer resolves to a user
    #[error("User not found")]
    UserNotFound,

    /// Authorization gate reached without an authenticated principal
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token generation error: {0}")]
    TokenGeneration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AuthError::DuplicateUser;
            }
        }
        AuthError::Database(err.to_string())
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenRevoked
            | AuthError::UserNotFound
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Database(_)
            | AuthError::PasswordHash(_)
            | AuthError::TokenGeneration(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a descriptive error message for this error
    /// This message is safe to send to clients (no sensitive data)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::Validation(_) => "Request validation failed".to_string(),
            AuthError::MalformedBody(_) => "Invalid request body".to_string(),
            AuthError::DuplicateUser => "User with this email already exists".to_string(),
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::MissingToken => "Missing authentication token".to_string(),
            AuthError::TokenRevoked => "Token has been revoked".to_string(),
            AuthError::InvalidToken | AuthError::UserNotFound | AuthError::Unauthenticated => {
                "Unauthorized".to_string()
            }
            AuthError::Forbidden => "Forbidden: insufficient permissions".to_string(),
            AuthError::Database(_)
            | AuthError::PasswordHash(_)
            | AuthError::TokenGeneration(_)
            | AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.error_message();

        let body = match &self {
            AuthError::Validation(errors) => {
                debug!("Auth request validation failed: {:?}", errors);
                json!({
                    "error": message,
                    "details": serde_json::to_value(errors).unwrap_or(json!({})),
                })
            }
            AuthError::MalformedBody(reason) => json!({ "error": message, "details": reason }),
            _ => {
                if self.is_server_error() {
                    error!("Auth infrastructure error: {}", self);
                } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    warn!("Auth rejection: {}", self);
                }
                json!({ "error": message })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if self.is_server_error() {
            response
                .extensions_mut()
                .insert(InternalErrorDetail(self.to_string()));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::DuplicateUser.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenRevoked.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::Database("connection refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let err = AuthError::MalformedBody("missing field `password`".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_message(), "Invalid request body");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_internal_details_not_in_message() {
        let err = AuthError::Database("password authentication failed for user kudos".into());
        assert_eq!(err.error_message(), "Internal server error");
    }

    #[test]
    fn test_invalid_token_and_missing_user_share_message() {
        assert_eq!(
            AuthError::InvalidToken.error_message(),
            AuthError::UserNotFound.error_message()
        );
        assert_ne!(
            AuthError::TokenRevoked.error_message(),
            AuthError::InvalidToken.error_message()
        );
    }
}
