//! Business logic services

pub mod catalog;
pub mod history;
pub mod inventory;
pub mod lending;
pub mod reconciliation;
pub mod users;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub lending: lending::LendingService,
    pub history: history::HistoryService,
    pub reconciliation: reconciliation::ReconciliationService,
    repository: Repository,
}

impl Services {
    /// Create all services around one shared store client
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        let ledger = inventory::InventoryLedger::new(repository.clone());
        Self {
            users: users::UsersService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), ledger),
            history: history::HistoryService::new(repository.clone()),
            reconciliation: reconciliation::ReconciliationService::new(repository.clone()),
            repository,
        }
    }

    /// Round-trip to the store within the configured timeout
    pub async fn store_ready(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
