//! Borrow and return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::response::ApiResponse,
    error::AppResult,
    models::{
        transaction::{BorrowItem, LendingTransaction},
        user::Action,
    },
    AppState,
};

use super::{parse_id, AuthenticatedUser, JsonBody};

/// Borrow an item for the caller
#[utoipa::path(
    post,
    path = "/api/lendings",
    tag = "lendings",
    security(("api_key" = []), ("bearer_auth" = [])),
    request_body = BorrowItem,
    responses(
        (status = 201, description = "Item borrowed", body = LendingTransaction),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Item not found"),
        (status = 422, description = "Not enough stock available")
    )
)]
pub async fn borrow(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    JsonBody(request): JsonBody<BorrowItem>,
) -> AppResult<(StatusCode, Json<ApiResponse<LendingTransaction>>)> {
    let lending = state.services.lending.borrow(&principal, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(lending, "Item borrowed successfully")),
    ))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/api/returns/{id}",
    tag = "lendings",
    security(("api_key" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Lending ID (UUID)")
    ),
    responses(
        (status = 200, description = "Item returned", body = LendingTransaction),
        (status = 403, description = "Lending belongs to another user"),
        (status = 404, description = "Lending not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_item(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LendingTransaction>>> {
    let lending = state
        .services
        .lending
        .return_item(&principal, parse_id(&id, "lending")?)
        .await?;
    Ok(Json(ApiResponse::with_message(lending, "Item returned successfully")))
}

/// The caller's lendings, newest first
#[utoipa::path(
    get,
    path = "/api/lendings/me",
    tag = "lendings",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own lendings", body = Vec<LendingTransaction>)
    )
)]
pub async fn my_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<LendingTransaction>>>> {
    principal.require(Action::ViewOwnHistory)?;
    let lendings = state.services.lending.list_for_user(principal.user_id).await?;
    Ok(Json(ApiResponse::ok(lendings)))
}

/// Every lending, newest first
#[utoipa::path(
    get,
    path = "/api/admin/lendings",
    tag = "admin",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "All lendings", body = Vec<LendingTransaction>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn all_lendings(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<LendingTransaction>>>> {
    principal.require(Action::ViewAllLendings)?;
    let lendings = state.services.lending.list_all().await?;
    Ok(Json(ApiResponse::ok(lendings)))
}
