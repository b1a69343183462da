//! Repository layer: persistence contract and its adapters
//!
//! Services only see the three store traits below. Two adapters implement
//! them: PostgreSQL (via sqlx) for production and an in-memory store for
//! development and tests. Stock mutations are single guarded updates so the
//! store, not the application, serializes concurrent reservations.

pub mod items;
pub mod memory;
pub mod transactions;
pub mod users;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        history::HistoryEntry,
        item::{Item, StockUpdate, UpdateItem},
        transaction::{LendingTransaction, ReturnOutcome, TransactionQuery},
        user::{Role, User},
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>>;

    /// All items ordered by name
    async fn find_all(&self) -> AppResult<Vec<Item>>;

    async fn insert(&self, item: &Item) -> AppResult<()>;

    /// Decrement available stock by `quantity` only if at least `quantity`
    /// is available, as one indivisible step
    async fn reserve(&self, id: Uuid, quantity: i32, now: DateTime<Utc>) -> AppResult<StockUpdate>;

    /// Increment available stock by `quantity`, uncapped by `stock_total`
    async fn release(&self, id: Uuid, quantity: i32, now: DateTime<Utc>) -> AppResult<StockUpdate>;

    /// Apply descriptive changes and, when `stock_total` is set, shift
    /// available stock by the same delta if it stays non-negative
    async fn update(&self, id: Uuid, changes: &UpdateItem, now: DateTime<Utc>) -> AppResult<StockUpdate>;

    /// Returns whether a row was deleted
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Cheapest round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Lookup by an already normalized email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_all(&self) -> AppResult<Vec<User>>;

    /// Fails with [`AppError::EmailTaken`] on a duplicate email
    async fn insert(&self, user: &User) -> AppResult<()>;

    async fn update_role(&self, id: Uuid, role: Role) -> AppResult<Option<User>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LendingTransaction>>;

    /// Matching records, newest `borrowed_at` first
    async fn find(&self, query: &TransactionQuery) -> AppResult<Vec<LendingTransaction>>;

    async fn insert(&self, record: &LendingTransaction) -> AppResult<()>;

    /// Move a `borrowed` record to `returned` and add its quantity back to
    /// the item's available stock in one store transaction. Either both
    /// writes land or neither does.
    async fn mark_returned(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<ReturnOutcome>;

    /// Records outer-joined with their item's name, newest first
    async fn history(&self, query: &TransactionQuery) -> AppResult<Vec<HistoryEntry>>;
}

/// Store client handed to every service at construction time
#[derive(Clone)]
pub struct Repository {
    pub items: Arc<dyn ItemStore>,
    pub users: Arc<dyn UserStore>,
    pub transactions: Arc<dyn TransactionStore>,
    timeout: Duration,
}

impl Repository {
    pub fn new(
        items: Arc<dyn ItemStore>,
        users: Arc<dyn UserStore>,
        transactions: Arc<dyn TransactionStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            items,
            users,
            transactions,
            timeout,
        }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>, timeout: Duration) -> Self {
        Self::new(
            Arc::new(items::ItemsRepository::new(pool.clone())),
            Arc::new(users::UsersRepository::new(pool.clone())),
            Arc::new(transactions::TransactionsRepository::new(pool)),
            timeout,
        )
    }

    /// Repository backed by a process-local store
    pub fn in_memory(timeout: Duration) -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self::new(store.clone(), store.clone(), store, timeout)
    }

    /// Check the store answers within the configured timeout
    pub async fn ping(&self) -> AppResult<()> {
        self.bounded(self.items.ping()).await
    }

    /// Await a store call for at most the configured timeout
    pub async fn bounded<T, F>(&self, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AppError::Timeout(self.timeout))?
    }
}
