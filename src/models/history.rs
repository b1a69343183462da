//! Reporting projections: lending history and stock reconciliation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::transaction::LendingStatus;

/// Lending record joined with its item's display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    /// `None` when the item has since been deleted
    pub item_name: Option<String>,
    pub quantity: i32,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LendingStatus,
}

/// Item whose counters disagree with its outstanding lending records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StockDiscrepancy {
    pub item_id: Uuid,
    pub item_name: Option<String>,
    /// `stock_total - stock_available`; absent when the item is gone
    pub on_loan_by_stock: Option<i32>,
    /// Sum of quantities of `borrowed` records
    pub on_loan_by_records: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconciliationReport {
    pub checked_items: usize,
    pub outstanding_lendings: usize,
    pub discrepancies: Vec<StockDiscrepancy>,
    pub generated_at: DateTime<Utc>,
}
