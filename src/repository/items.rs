//! Items repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::ItemStore;
use crate::{
    error::AppResult,
    models::item::{Item, StockUpdate, UpdateItem},
};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Map "no row returned by a guarded update" to rejected or missing
    async fn outcome(&self, id: Uuid, row: Option<Item>) -> AppResult<StockUpdate> {
        match row {
            Some(item) => Ok(StockUpdate::Applied(item)),
            None if self.exists(id).await? => Ok(StockUpdate::Rejected),
            None => Ok(StockUpdate::Missing),
        }
    }
}

#[async_trait]
impl ItemStore for ItemsRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn find_all(&self) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn insert(&self, item: &Item) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, category, description, stock_total, stock_available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.stock_total)
        .bind(item.stock_available)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reserve(&self, id: Uuid, quantity: i32, now: DateTime<Utc>) -> AppResult<StockUpdate> {
        // Check and decrement in one statement; the row lock taken by UPDATE
        // serializes concurrent reservers on the same item.
        let row = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET stock_available = stock_available - $2, updated_at = $3
            WHERE id = $1 AND stock_available >= $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        self.outcome(id, row).await
    }

    async fn release(&self, id: Uuid, quantity: i32, now: DateTime<Utc>) -> AppResult<StockUpdate> {
        let row = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET stock_available = stock_available + $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StockUpdate::Applied).unwrap_or(StockUpdate::Missing))
    }

    async fn update(&self, id: Uuid, changes: &UpdateItem, now: DateTime<Utc>) -> AppResult<StockUpdate> {
        // A NULL total leaves both counters untouched; otherwise available
        // moves by (new_total - old_total) and must stay non-negative.
        let row = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                stock_available = stock_available + (COALESCE($5, stock_total) - stock_total),
                stock_total = COALESCE($5, stock_total),
                updated_at = $6
            WHERE id = $1
              AND stock_available + (COALESCE($5, stock_total) - stock_total) >= 0
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.category)
        .bind(&changes.description)
        .bind(changes.stock_total)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        self.outcome(id, row).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
