//! Item (borrowable equipment type) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Equipment unit type with its stock counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: String,
    pub stock_total: i32,
    /// Only mutated by the inventory ledger and guarded total-stock edits
    pub stock_available: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// New item with every unit available
    pub fn new(data: &CreateItem, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: data.name.trim().to_string(),
            category: data.category.trim().to_string(),
            description: data.description.trim().to_string(),
            stock_total: data.stock_total,
            stock_available: data.stock_total,
            created_at: now,
            updated_at: now,
        }
    }

    /// Units currently out on loan according to the counters
    pub fn on_loan(&self) -> i32 {
        self.stock_total - self.stock_available
    }
}

/// Create item request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1, message = "stock_total must be greater than zero"))]
    pub stock_total: i32,
}

/// Update item request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Applied as a delta to available stock; rejected if it would drop
    /// below what is currently on loan
    #[validate(range(min = 1, message = "stock_total must be greater than zero"))]
    pub stock_total: Option<i32>,
}

/// Outcome of a guarded single-row update on an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockUpdate {
    Applied(Item),
    /// The row exists but the guard predicate did not hold at write time
    Rejected,
    Missing,
}
