//! Error types for the lending server

use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::api::response::ApiResponse;

/// Error categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Conflict,
    InsufficientStock,
    Unauthorized,
    Forbidden,
    Timeout,
    InternalFailure,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Same message for unknown email and wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session token expired")]
    TokenExpired,

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Lending {0} has already been returned")]
    AlreadyReturned(Uuid),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient stock for item {0}")]
    InsufficientStock(Uuid),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_)
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::TokenExpired => ErrorCode::Unauthorized,
            AppError::Authorization(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Validation(_) => ErrorCode::Validation,
            AppError::EmailTaken | AppError::AlreadyReturned(_) | AppError::Conflict(_) => {
                ErrorCode::Conflict
            }
            AppError::InsufficientStock(_) => ErrorCode::InsufficientStock,
            AppError::Timeout(_) => ErrorCode::Timeout,
            AppError::Database(_) | AppError::Internal(_) => ErrorCode::InternalFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller; internal faults never leak detail
    pub fn public_message(&self) -> String {
        match self {
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Timeout(_) => "Storage did not answer in time, please retry".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Timeout(limit) => tracing::warn!("Store call exceeded {:?}", limit),
            _ => {}
        }

        let body = Json(ApiResponse::<()>::failure(self.public_message()));
        (self.status(), body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
