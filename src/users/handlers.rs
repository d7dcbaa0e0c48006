// HTTP handlers for user administration

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role, UserRepository, UserResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::extract::JsonBody;
use crate::AppState;

/// Role change request; the role string must match exactly
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(example = "TECH_LEAD")]
    pub role: String,
}

/// Handler for GET /users/{id}
/// Requires TECH_LEAD or ADMIN
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Not authenticated", body = String, example = json!({"error": "Unauthorized"})),
        (status = 403, description = "Insufficient role", body = String, example = json!({"error": "Forbidden: insufficient permissions"})),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!("Fetching user with id: {}", id);

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        })?;

    Ok(Json(UserResponse::from(user)))
}

/// Handler for PATCH /users/{id}/role
/// Requires ADMIN
#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Unknown role, or malformed JSON body", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = String, example = json!({"error": "Unauthorized"})),
        (status = 403, description = "Insufficient role", body = String, example = json!({"error": "Forbidden: insufficient permissions"})),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_role_handler(
    State(state): State<AppState>,
    admin: AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role: Role = request.role.parse().map_err(ApiError::BadRequest)?;

    let user = state
        .users
        .update_role(id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        })?;

    info!(
        "Role of user_id={} changed to {} by admin user_id={}",
        user.id, user.role, admin.user_id
    );
    Ok(Json(UserResponse::from(user)))
}
