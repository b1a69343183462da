//! Lending transaction engine
//!
//! State machine per record: (none) -> Borrowed -> Returned. Every borrow is
//! paired with exactly one ledger reservation and every return with exactly
//! one release. A borrow reserves first and writes the record second, so a
//! failed record write is compensated on the ledger side. A return closes the
//! record and releases its stock in a single store transaction.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        transaction::{BorrowItem, LendingTransaction, ReturnOutcome, TransactionQuery},
        user::{Action, Principal},
    },
    repository::Repository,
};

use super::inventory::{item_not_found, InventoryLedger};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    ledger: InventoryLedger,
}

impl LendingService {
    pub fn new(repository: Repository, ledger: InventoryLedger) -> Self {
        Self { repository, ledger }
    }

    /// Reserve stock and open a `borrowed` record for the caller
    pub async fn borrow(&self, principal: &Principal, request: &BorrowItem) -> AppResult<LendingTransaction> {
        principal.require(Action::Borrow)?;
        if request.quantity <= 0 {
            return Err(AppError::Validation("quantity must be greater than zero".to_string()));
        }

        // No record is written unless the reservation went through
        self.ledger.reserve(request.item_id, request.quantity).await?;

        let record = LendingTransaction::open(principal.user_id, request.item_id, request.quantity, Utc::now());
        if let Err(e) = self
            .repository
            .bounded(self.repository.transactions.insert(&record))
            .await
        {
            // A timed-out insert may still commit; leave that case to reconciliation
            if !matches!(e, AppError::Timeout(_)) {
                tracing::warn!(lending_id = %record.id, item_id = %record.item_id, "lending write failed, releasing reservation");
                if let Err(undo) = self.ledger.release(record.item_id, record.quantity).await {
                    tracing::error!(item_id = %record.item_id, quantity = record.quantity, "orphaned reservation: {}", undo);
                }
            }
            return Err(e);
        }

        tracing::info!(
            lending_id = %record.id,
            user_id = %record.user_id,
            item_id = %record.item_id,
            quantity = record.quantity,
            "item borrowed"
        );
        Ok(record)
    }

    /// Close the record and release its stock. Members may only return
    /// their own lendings; a second return fails with `AlreadyReturned`.
    pub async fn return_item(&self, principal: &Principal, lending_id: Uuid) -> AppResult<LendingTransaction> {
        principal.require(Action::Return)?;

        let record = self
            .repository
            .bounded(self.repository.transactions.find_by_id(lending_id))
            .await?
            .ok_or_else(|| lending_not_found(lending_id))?;

        if !principal.can_act_for(record.user_id) {
            return Err(AppError::Authorization(
                "Cannot return another user's lending".to_string(),
            ));
        }
        if record.is_returned() {
            return Err(AppError::AlreadyReturned(lending_id));
        }

        // Close and release land together in the store; a concurrent
        // return of the same record finds it no longer borrowed
        let outcome = self
            .repository
            .bounded(self.repository.transactions.mark_returned(lending_id, Utc::now()))
            .await?;

        match outcome {
            ReturnOutcome::Closed(closed) => {
                tracing::info!(
                    lending_id = %closed.id,
                    item_id = %closed.item_id,
                    quantity = closed.quantity,
                    "item returned"
                );
                Ok(closed)
            }
            ReturnOutcome::AlreadyReturned => {
                tracing::warn!(%lending_id, "lost return race");
                Err(AppError::AlreadyReturned(lending_id))
            }
            ReturnOutcome::Missing => Err(lending_not_found(lending_id)),
            ReturnOutcome::ItemMissing => Err(item_not_found(record.item_id)),
        }
    }

    /// Lendings of one user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<LendingTransaction>> {
        self.repository
            .bounded(self.repository.transactions.find(&TransactionQuery::ByUser(user_id)))
            .await
    }

    /// Every lending, newest first
    pub async fn list_all(&self) -> AppResult<Vec<LendingTransaction>> {
        self.repository
            .bounded(self.repository.transactions.find(&TransactionQuery::All))
            .await
    }
}

fn lending_not_found(lending_id: Uuid) -> AppError {
    AppError::NotFound(format!("Lending {} not found", lending_id))
}
