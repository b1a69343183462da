//! Data models for the lending service

pub mod history;
pub mod item;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use history::{HistoryEntry, ReconciliationReport, StockDiscrepancy};
pub use item::{CreateItem, Item, StockUpdate, UpdateItem};
pub use transaction::{BorrowItem, LendingStatus, LendingTransaction, ReturnOutcome, TransactionQuery};
pub use user::{Action, Principal, RegisterUser, Role, User, UserClaims};
