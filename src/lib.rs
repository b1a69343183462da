//! Campus equipment lending service
//!
//! Users borrow equipment from a shared pool. The inventory ledger keeps
//! per-item available stock race-free with conditional atomic updates, the
//! lending engine records each borrow/return, and the identity layer gates
//! every mutation behind a system API key, a session token and a role policy.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
