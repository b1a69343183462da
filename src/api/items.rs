//! Item catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::response::ApiResponse,
    error::AppResult,
    models::item::{CreateItem, Item, UpdateItem},
    AppState,
};

use super::{parse_id, AuthenticatedUser, JsonBody};

/// List all items
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "items",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Items ordered by name", body = Vec<Item>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    AuthenticatedUser(_principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<Item>>>> {
    let items = state.services.catalog.list_items().await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// Get item details by ID
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    tag = "items",
    security(("api_key" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 200, description = "Item details", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    AuthenticatedUser(_principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let item = state.services.catalog.get_item(parse_id(&id, "item")?).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// Create a new item
#[utoipa::path(
    post,
    path = "/api/admin/items",
    tag = "items",
    security(("api_key" = []), ("bearer_auth" = [])),
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    JsonBody(item): JsonBody<CreateItem>,
) -> AppResult<(StatusCode, Json<ApiResponse<Item>>)> {
    let created = state.services.catalog.create_item(&principal, &item).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(created, "Item created")),
    ))
}

/// Update an item
#[utoipa::path(
    put,
    path = "/api/admin/items/{id}",
    tag = "items",
    security(("api_key" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "New total is below the quantity on loan")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
    JsonBody(changes): JsonBody<UpdateItem>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let item = state
        .services
        .catalog
        .update_item(&principal, parse_id(&id, "item")?, &changes)
        .await?;
    Ok(Json(ApiResponse::with_message(item, "Item updated")))
}

/// Delete an item
#[utoipa::path(
    delete,
    path = "/api/admin/items/{id}",
    tag = "items",
    security(("api_key" = []), ("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Item ID (UUID)")
    ),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .services
        .catalog
        .delete_item(&principal, parse_id(&id, "item")?)
        .await?;
    Ok(Json(ApiResponse::message("Item deleted")))
}
