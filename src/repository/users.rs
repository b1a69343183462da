//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::UserStore;
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
};

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, nim, department, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.nim)
        .bind(&user.department)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Unique index on email; concurrent registrations race here
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return AppError::EmailTaken;
                }
            }
            AppError::Database(e)
        })?;
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
