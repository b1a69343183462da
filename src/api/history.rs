//! History and reconciliation endpoints

use axum::{extract::State, Json};

use crate::{
    api::response::ApiResponse,
    error::AppResult,
    models::history::{HistoryEntry, ReconciliationReport},
    AppState,
};

use super::AuthenticatedUser;

/// The caller's lending history with item names
#[utoipa::path(
    get,
    path = "/api/history",
    tag = "history",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own history, newest first", body = Vec<HistoryEntry>)
    )
)]
pub async fn my_history(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let entries = state.services.history.own(&principal).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// Full lending history
#[utoipa::path(
    get,
    path = "/api/admin/history",
    tag = "admin",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "All history, newest first", body = Vec<HistoryEntry>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn all_history(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let entries = state.services.history.all(&principal).await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// Compare item counters against outstanding lendings
#[utoipa::path(
    get,
    path = "/api/admin/reconciliation",
    tag = "admin",
    security(("api_key" = []), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reconciliation report", body = ReconciliationReport),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn reconciliation(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<ReconciliationReport>>> {
    let report = state.services.reconciliation.reconcile(&principal).await?;
    Ok(Json(ApiResponse::ok(report)))
}
