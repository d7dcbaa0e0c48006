// Error handling module for the Kudos API
// Provides centralized error types and HTTP response conversion

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Main error type for non-auth endpoints
///
/// Resource errors render as `ErrorResponse`. Authentication and authorization
/// rejections keep the `{"error": ...}` shape of `AuthError`, so a client sees the
/// same 401/403 body on every protected route.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request that is not a field validation failure
    /// Maps to HTTP 400 Bad Request
    BadRequest(String),

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Internal server errors
    /// Maps to HTTP 500; details are kept out of the client message
    InternalError(String),

    /// Client-side auth failure, rendered by `AuthError` itself
    Auth(AuthError),
}

/// Consistent error response structure
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "BAD_REQUEST", "NOT_FOUND")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g., field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message,
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Internal cause of a 5xx response, carried as a response extension
///
/// Only `expose_internal_errors` (installed in development) copies it into the body.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response, internal_cause) = match self {
            ApiError::Auth(error) => return error.into_response(),
            ApiError::BadRequest(message) => {
                debug!("Bad request: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("BAD_REQUEST", message, None),
                    None,
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(
                        "NOT_FOUND",
                        format!("{} with id {} not found", resource, id),
                        None,
                    ),
                    None,
                )
            }
            ApiError::InternalError(internal_msg) => {
                error!("Internal error: {}", internal_msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    ),
                    Some(internal_msg),
                )
            }
        };

        let mut response = (status, Json(error_response)).into_response();
        if let Some(cause) = internal_cause {
            response.extensions_mut().insert(InternalErrorDetail(cause));
        }
        response
    }
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(error) => error.status_code(),
        }
    }
}

/// Bridge auth-layer failures (repository, gate) into the general error shape
impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        if error.is_server_error() {
            ApiError::InternalError(error.to_string())
        } else {
            ApiError::Auth(error)
        }
    }
}

/// Development-only layer: copy the internal cause of 5xx responses into
/// `details.cause` of the JSON body
pub async fn expose_internal_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let cause = match response.extensions().get::<InternalErrorDetail>() {
        Some(detail) if response.status().is_server_error() => detail.0.clone(),
        _ => return response,
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to buffer error response body: {}", e);
            return (parts.status, "Internal server error").into_response();
        }
    };

    let mut json: serde_json::Value =
        serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(object) = json.as_object_mut() {
        object.insert("details".to_string(), serde_json::json!({ "cause": cause }));
    }

    let body = serde_json::to_vec(&json).unwrap_or_else(|_| bytes.to_vec());
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}
