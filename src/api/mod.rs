//! HTTP surface of the lending service

pub mod auth;
pub mod health;
pub mod history;
pub mod items;
pub mod lendings;
pub mod openapi;
pub mod response;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, OriginalUri, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::Principal,
    AppState,
};

/// Header carrying the shared system credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor for the caller identity behind a bearer token
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let principal = state.services.users.authorize(token.trim(), None)?;
        Ok(AuthenticatedUser(principal))
    }
}

/// Admission gate run before any route under `/api`
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = state.services.users.admit(presented) {
        tracing::warn!(path = %request.uri().path(), "request rejected at admission gate");
        return Err(e);
    }

    Ok(next.run(request).await)
}

/// JSON request body whose rejections answer inside the response envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Parse a path identifier, answering with a validation error instead of
/// the framework's plain-text rejection
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("Invalid {} id: {}", what, raw)))
}

async fn route_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Catalog
        .route("/items", get(items::list_items))
        .route("/items/:id", get(items::get_item))
        .route("/admin/items", post(items::create_item))
        .route("/admin/items/:id", put(items::update_item).delete(items::delete_item))
        // Lendings
        .route("/lendings", post(lendings::borrow))
        .route("/lendings/me", get(lendings::my_lendings))
        .route("/returns/:id", post(lendings::return_item))
        .route("/history", get(history::my_history))
        // Administration
        .route("/admin/lendings", get(lendings::all_lendings))
        .route("/admin/history", get(history::all_history))
        .route("/admin/users", get(users::list_users))
        .route("/admin/users/:id/role", patch(users::update_role))
        .route("/admin/reconciliation", get(history::reconciliation))
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state.clone());

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state)
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
