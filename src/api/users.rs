//! User administration endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::response::ApiResponse,
    error::AppResult,
    models::user::{UpdateRole, User},
    AppState,
};

use super::{parse_id, AuthenticatedUser, JsonBody};

/// List all users
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = Vec<User>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let users = state.services.users.list_users(&principal).await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// Change a user's role
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    tag = "admin",
    security(("api_key" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID (UUID)")
    ),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateRole>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state
        .services
        .users
        .update_role(&principal, parse_id(&id, "user")?, &request.role)
        .await?;
    Ok(Json(ApiResponse::with_message(user, "Role updated")))
}
