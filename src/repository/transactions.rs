//! Lending transactions repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::TransactionStore;
use crate::{
    error::AppResult,
    models::{
        history::HistoryEntry,
        transaction::{LendingStatus, LendingTransaction, ReturnOutcome, TransactionQuery},
    },
};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// WHERE clause and its optional user binding for a typed query
fn filter(query: &TransactionQuery) -> (&'static str, Option<Uuid>) {
    match query {
        TransactionQuery::All => ("TRUE", None),
        TransactionQuery::ByUser(user_id) => ("t.user_id = $1", Some(*user_id)),
        TransactionQuery::Outstanding => ("t.status = 'borrowed'", None),
    }
}

#[async_trait]
impl TransactionStore for TransactionsRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<LendingTransaction>> {
        let record = sqlx::query_as::<_, LendingTransaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find(&self, query: &TransactionQuery) -> AppResult<Vec<LendingTransaction>> {
        let (clause, user_id) = filter(query);
        let sql = format!(
            "SELECT t.* FROM transactions t WHERE {} ORDER BY t.borrowed_at DESC, t.id",
            clause
        );

        let mut builder = sqlx::query_as::<_, LendingTransaction>(&sql);
        if let Some(user_id) = user_id {
            builder = builder.bind(user_id);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    async fn insert(&self, record: &LendingTransaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, item_id, quantity, borrowed_at, returned_at, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.item_id)
        .bind(record.quantity)
        .bind(record.borrowed_at)
        .bind(record.returned_at)
        .bind(record.status)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_returned(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<ReturnOutcome> {
        // Dropping `tx` without commit rolls back
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, LendingTransaction>(
            r#"
            UPDATE transactions
            SET status = $2, returned_at = $3, updated_at = $3
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(LendingStatus::Returned)
        .bind(now)
        .bind(LendingStatus::Borrowed)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(closed) = closed else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transactions WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            return Ok(if exists {
                ReturnOutcome::AlreadyReturned
            } else {
                ReturnOutcome::Missing
            });
        };

        let released = sqlx::query(
            r#"
            UPDATE items
            SET stock_available = stock_available + $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(closed.item_id)
        .bind(closed.quantity)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if released.rows_affected() == 0 {
            return Ok(ReturnOutcome::ItemMissing);
        }

        tx.commit().await?;
        Ok(ReturnOutcome::Closed(closed))
    }

    async fn history(&self, query: &TransactionQuery) -> AppResult<Vec<HistoryEntry>> {
        let (clause, user_id) = filter(query);
        // LEFT JOIN: a deleted item leaves item_name NULL instead of dropping the row
        let sql = format!(
            r#"
            SELECT t.id, t.user_id, t.item_id, i.name AS item_name, t.quantity,
                   t.borrowed_at, t.returned_at, t.status
            FROM transactions t
            LEFT JOIN items i ON i.id = t.item_id
            WHERE {}
            ORDER BY t.borrowed_at DESC, t.id
            "#,
            clause
        );

        let mut builder = sqlx::query_as::<_, HistoryEntry>(&sql);
        if let Some(user_id) = user_id {
            builder = builder.bind(user_id);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }
}
