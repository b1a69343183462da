//! Lending transaction model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle: created `Borrowed`, moves once to `Returned` (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LendingStatus {
    Borrowed,
    Returned,
}

impl LendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LendingStatus::Borrowed => "borrowed",
            LendingStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for LendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LendingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrowed" => Ok(LendingStatus::Borrowed),
            "returned" => Ok(LendingStatus::Returned),
            _ => Err(format!("Invalid lending status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for LendingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LendingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LendingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// One borrow event and its eventual return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LendingTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub borrowed_at: DateTime<Utc>,
    /// Present iff `status` is `returned`
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LendingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LendingTransaction {
    /// Record for stock that has just been reserved
    pub fn open(user_id: Uuid, item_id: Uuid, quantity: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            item_id,
            quantity,
            borrowed_at: now,
            returned_at: None,
            status: LendingStatus::Borrowed,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_returned(&self) -> bool {
        self.status == LendingStatus::Returned
    }

    /// Terminal transition, applied by stores on a still-borrowed record
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.status = LendingStatus::Returned;
        self.returned_at = Some(now);
        self.updated_at = now;
    }
}

/// Outcome of closing a lending together with releasing its stock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// Record closed and its quantity added back to the item, as one unit
    Closed(LendingTransaction),
    /// Record was no longer `borrowed` at write time; nothing changed
    AlreadyReturned,
    Missing,
    /// The lent item is gone; the record stays `borrowed`
    ItemMissing,
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BorrowItem {
    pub item_id: Uuid,
    pub quantity: i32,
}

/// Typed selection over the transactions collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionQuery {
    All,
    ByUser(Uuid),
    /// Every record still in `borrowed` state
    Outstanding,
}

impl TransactionQuery {
    pub fn matches(&self, record: &LendingTransaction) -> bool {
        match self {
            TransactionQuery::All => true,
            TransactionQuery::ByUser(user_id) => record.user_id == *user_id,
            TransactionQuery::Outstanding => record.status == LendingStatus::Borrowed,
        }
    }
}
