//! Item catalog service

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        item::{CreateItem, Item, StockUpdate, UpdateItem},
        user::{Action, Principal},
    },
    repository::Repository,
};

use super::inventory::item_not_found;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List items ordered by name
    pub async fn list_items(&self) -> AppResult<Vec<Item>> {
        self.repository
            .bounded(self.repository.items.find_all())
            .await
    }

    /// Get an item by ID
    pub async fn get_item(&self, id: Uuid) -> AppResult<Item> {
        self.repository
            .bounded(self.repository.items.find_by_id(id))
            .await?
            .ok_or_else(|| item_not_found(id))
    }

    /// Create a new item with all its units available
    pub async fn create_item(&self, principal: &Principal, data: &CreateItem) -> AppResult<Item> {
        principal.require(Action::ManageItems)?;
        if data.name.trim().is_empty() {
            return Err(AppError::Validation("Item name is required".to_string()));
        }
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let item = Item::new(data, Utc::now());
        self.repository
            .bounded(self.repository.items.insert(&item))
            .await?;

        tracing::info!(item_id = %item.id, stock_total = item.stock_total, "item created");
        Ok(item)
    }

    /// Update an item's description and, optionally, its total stock
    pub async fn update_item(&self, principal: &Principal, id: Uuid, data: &UpdateItem) -> AppResult<Item> {
        principal.require(Action::ManageItems)?;
        data.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let changes = UpdateItem {
            name: trimmed(&data.name),
            category: trimmed(&data.category),
            description: trimmed(&data.description),
            stock_total: data.stock_total,
        };
        if changes.name.as_deref() == Some("") {
            return Err(AppError::Validation("Item name cannot be blank".to_string()));
        }

        let outcome = self
            .repository
            .bounded(self.repository.items.update(id, &changes, Utc::now()))
            .await?;

        match outcome {
            StockUpdate::Applied(item) => {
                tracing::info!(item_id = %item.id, stock_total = item.stock_total, "item updated");
                Ok(item)
            }
            StockUpdate::Rejected => {
                tracing::warn!(item_id = %id, requested = ?changes.stock_total, "total stock edit rejected");
                Err(AppError::Conflict(
                    "stock_total cannot be lower than the quantity currently on loan".to_string(),
                ))
            }
            StockUpdate::Missing => Err(item_not_found(id)),
        }
    }

    /// Delete an item. Lending records that reference it are kept.
    pub async fn delete_item(&self, principal: &Principal, id: Uuid) -> AppResult<()> {
        principal.require(Action::ManageItems)?;

        let deleted = self
            .repository
            .bounded(self.repository.items.delete(id))
            .await?;
        if !deleted {
            return Err(item_not_found(id));
        }

        tracing::info!(item_id = %id, "item deleted");
        Ok(())
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value.as_deref().map(|v| v.trim().to_string())
}
