//! Read-only lending history projection

use crate::{
    error::AppResult,
    models::{
        history::HistoryEntry,
        transaction::TransactionQuery,
        user::{Action, Principal},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct HistoryService {
    repository: Repository,
}

impl HistoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// The caller's own lendings with item names, newest first
    pub async fn own(&self, principal: &Principal) -> AppResult<Vec<HistoryEntry>> {
        principal.require(Action::ViewOwnHistory)?;
        let query = TransactionQuery::ByUser(principal.user_id);
        self.repository
            .bounded(self.repository.transactions.history(&query))
            .await
    }

    /// Every lending with item names (admin only)
    pub async fn all(&self, principal: &Principal) -> AppResult<Vec<HistoryEntry>> {
        principal.require(Action::ViewAllLendings)?;
        self.repository
            .bounded(self.repository.transactions.history(&TransactionQuery::All))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        error::AppError,
        models::{
            item::{CreateItem, Item},
            transaction::LendingTransaction,
            user::Role,
        },
    };

    #[tokio::test]
    async fn deleted_item_keeps_its_history_row() {
        let repository = Repository::in_memory(Duration::from_secs(1));
        let service = HistoryService::new(repository.clone());
        let member = Principal { user_id: Uuid::new_v4(), role: Role::Member };

        let item = Item::new(
            &CreateItem {
                name: "Microphone".to_string(),
                category: "Audio".to_string(),
                description: String::new(),
                stock_total: 2,
            },
            Utc::now(),
        );
        repository.items.insert(&item).await.unwrap();

        let first = LendingTransaction::open(member.user_id, item.id, 1, Utc::now());
        repository.transactions.insert(&first).await.unwrap();
        let second = LendingTransaction::open(member.user_id, item.id, 1, Utc::now() + chrono::Duration::seconds(1));
        repository.transactions.insert(&second).await.unwrap();
        let someone_else = LendingTransaction::open(Uuid::new_v4(), item.id, 1, Utc::now());
        repository.transactions.insert(&someone_else).await.unwrap();

        let entries = service.own(&member).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second.id);
        assert_eq!(entries[0].item_name.as_deref(), Some("Microphone"));

        repository.items.delete(item.id).await.unwrap();
        let entries = service.own(&member).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.item_name.is_none()));
    }

    #[tokio::test]
    async fn full_history_is_admin_only() {
        let service = HistoryService::new(Repository::in_memory(Duration::from_secs(1)));
        let member = Principal { user_id: Uuid::new_v4(), role: Role::Member };
        let admin = Principal { user_id: Uuid::new_v4(), role: Role::Admin };

        assert!(matches!(service.all(&member).await, Err(AppError::Authorization(_))));
        assert!(service.all(&admin).await.unwrap().is_empty());
    }
}
