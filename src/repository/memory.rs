//! Process-local store implementing every collection
//!
//! Each operation takes the table lock once, so a guarded update is as
//! indivisible here as the equivalent single SQL statement.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ItemStore, TransactionStore, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        history::HistoryEntry,
        item::{Item, StockUpdate, UpdateItem},
        transaction::{LendingTransaction, ReturnOutcome, TransactionQuery},
        user::{Role, User},
    },
};

#[derive(Default)]
struct Tables {
    items: HashMap<Uuid, Item>,
    users: HashMap<Uuid, User>,
    transactions: HashMap<Uuid, LendingTransaction>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(records: &mut [LendingTransaction]) {
    records.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at).then(a.id.cmp(&b.id)));
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Item>> {
        let mut items: Vec<Item> = self.tables.read().await.items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn insert(&self, item: &Item) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.items.contains_key(&item.id) {
            return Err(AppError::Conflict(format!("Item {} already exists", item.id)));
        }
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn reserve(&self, id: Uuid, quantity: i32, now: DateTime<Utc>) -> AppResult<StockUpdate> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(StockUpdate::Missing);
        };
        if item.stock_available < quantity {
            return Ok(StockUpdate::Rejected);
        }
        item.stock_available -= quantity;
        item.updated_at = now;
        Ok(StockUpdate::Applied(item.clone()))
    }

    async fn release(&self, id: Uuid, quantity: i32, now: DateTime<Utc>) -> AppResult<StockUpdate> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(StockUpdate::Missing);
        };
        item.stock_available += quantity;
        item.updated_at = now;
        Ok(StockUpdate::Applied(item.clone()))
    }

    async fn update(&self, id: Uuid, changes: &UpdateItem, now: DateTime<Utc>) -> AppResult<StockUpdate> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(StockUpdate::Missing);
        };

        let new_total = changes.stock_total.unwrap_or(item.stock_total);
        let new_available = item.stock_available + (new_total - item.stock_total);
        if new_available < 0 {
            return Ok(StockUpdate::Rejected);
        }

        if let Some(name) = &changes.name {
            item.name = name.clone();
        }
        if let Some(category) = &changes.category {
            item.category = category.clone();
        }
        if let Some(description) = &changes.description {
            item.description = description.clone();
        }
        item.stock_total = new_total;
        item.stock_available = new_available;
        item.updated_at = now;
        Ok(StockUpdate::Applied(item.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.tables.write().await.items.remove(&id).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        drop(self.tables.read().await);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::EmailTaken);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> AppResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LendingTransaction>> {
        Ok(self.tables.read().await.transactions.get(&id).cloned())
    }

    async fn find(&self, query: &TransactionQuery) -> AppResult<Vec<LendingTransaction>> {
        let tables = self.tables.read().await;
        let mut records: Vec<LendingTransaction> = tables
            .transactions
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }

    async fn insert(&self, record: &LendingTransaction) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.transactions.contains_key(&record.id) {
            return Err(AppError::Conflict(format!("Lending {} already exists", record.id)));
        }
        tables.transactions.insert(record.id, record.clone());
        Ok(())
    }

    async fn mark_returned(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<ReturnOutcome> {
        let mut tables = self.tables.write().await;
        let Tables { items, transactions, .. } = &mut *tables;

        let Some(record) = transactions.get_mut(&id) else {
            return Ok(ReturnOutcome::Missing);
        };
        if record.is_returned() {
            return Ok(ReturnOutcome::AlreadyReturned);
        }
        let Some(item) = items.get_mut(&record.item_id) else {
            return Ok(ReturnOutcome::ItemMissing);
        };

        record.close(now);
        item.stock_available += record.quantity;
        item.updated_at = now;
        Ok(ReturnOutcome::Closed(record.clone()))
    }

    async fn history(&self, query: &TransactionQuery) -> AppResult<Vec<HistoryEntry>> {
        let tables = self.tables.read().await;
        let mut records: Vec<&LendingTransaction> =
            tables.transactions.values().filter(|t| query.matches(t)).collect();
        records.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at).then(a.id.cmp(&b.id)));

        Ok(records
            .into_iter()
            .map(|t| HistoryEntry {
                id: t.id,
                user_id: t.user_id,
                item_id: t.item_id,
                item_name: tables.items.get(&t.item_id).map(|i| i.name.clone()),
                quantity: t.quantity,
                borrowed_at: t.borrowed_at,
                returned_at: t.returned_at,
                status: t.status,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::CreateItem;

    fn item(total: i32) -> Item {
        Item::new(
            &CreateItem {
                name: "Projector".to_string(),
                category: "AV".to_string(),
                description: String::new(),
                stock_total: total,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn reserve_is_guarded() {
        let store = MemoryStore::new();
        let projector = item(2);
        ItemStore::insert(&store, &projector).await.unwrap();

        let now = Utc::now();
        assert!(matches!(store.reserve(projector.id, 2, now).await.unwrap(), StockUpdate::Applied(_)));
        assert_eq!(store.reserve(projector.id, 1, now).await.unwrap(), StockUpdate::Rejected);
        assert_eq!(store.reserve(Uuid::new_v4(), 1, now).await.unwrap(), StockUpdate::Missing);
    }

    #[tokio::test]
    async fn total_edit_below_outstanding_is_rejected() {
        let store = MemoryStore::new();
        let projector = item(5);
        ItemStore::insert(&store, &projector).await.unwrap();
        store.reserve(projector.id, 3, Utc::now()).await.unwrap();

        let shrink = UpdateItem {
            stock_total: Some(2),
            ..Default::default()
        };
        assert_eq!(store.update(projector.id, &shrink, Utc::now()).await.unwrap(), StockUpdate::Rejected);

        let grow = UpdateItem {
            stock_total: Some(8),
            ..Default::default()
        };
        let StockUpdate::Applied(updated) = store.update(projector.id, &grow, Utc::now()).await.unwrap() else {
            panic!("growing the total must apply");
        };
        assert_eq!((updated.stock_total, updated.stock_available), (8, 5));
    }

    #[tokio::test]
    async fn mark_returned_releases_once_with_the_close() {
        let store = MemoryStore::new();
        let projector = item(3);
        ItemStore::insert(&store, &projector).await.unwrap();
        store.reserve(projector.id, 2, Utc::now()).await.unwrap();
        let record = LendingTransaction::open(Uuid::new_v4(), projector.id, 2, Utc::now());
        TransactionStore::insert(&store, &record).await.unwrap();

        assert!(matches!(
            store.mark_returned(record.id, Utc::now()).await.unwrap(),
            ReturnOutcome::Closed(closed) if closed.is_returned()
        ));
        assert_eq!(store.mark_returned(record.id, Utc::now()).await.unwrap(), ReturnOutcome::AlreadyReturned);
        assert_eq!(store.mark_returned(Uuid::new_v4(), Utc::now()).await.unwrap(), ReturnOutcome::Missing);

        let projector = ItemStore::find_by_id(&store, projector.id).await.unwrap().unwrap();
        assert_eq!(projector.stock_available, 3);
    }

    #[tokio::test]
    async fn mark_returned_leaves_record_open_when_item_is_gone() {
        let store = MemoryStore::new();
        let record = LendingTransaction::open(Uuid::new_v4(), Uuid::new_v4(), 1, Utc::now());
        TransactionStore::insert(&store, &record).await.unwrap();

        assert_eq!(store.mark_returned(record.id, Utc::now()).await.unwrap(), ReturnOutcome::ItemMissing);
        let record = TransactionStore::find_by_id(&store, record.id).await.unwrap().unwrap();
        assert!(!record.is_returned());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@campus.edu".to_string(),
            password_hash: "x".to_string(),
            role: Role::Member,
            nim: None,
            department: None,
            created_at: Utc::now(),
        };
        UserStore::insert(&store, &user).await.unwrap();

        let twin = User { id: Uuid::new_v4(), ..user };
        assert!(matches!(UserStore::insert(&store, &twin).await, Err(AppError::EmailTaken)));
    }
}
