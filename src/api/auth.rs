//! Registration and login endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::{response::ApiResponse, JsonBody},
    error::AppResult,
    models::user::{RegisterUser, User},
    AppState,
};

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email, matched case-insensitively
    pub email: String,
    pub password: String,
}

/// Login response with the session token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT access token
    pub token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: User,
}

/// Register a member account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    security(("api_key" = [])),
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Missing or invalid fields"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterUser>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = state.services.users.register(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(user, "Registration successful")),
    ))
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    security(("api_key" = [])),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let (token, user) = state
        .services
        .users
        .authenticate(&request.email, &request.password)
        .await?;

    Ok(Json(ApiResponse::ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_hours * 3600,
        user,
    })))
}
