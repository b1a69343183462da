//! Reconciliation scan between item counters and outstanding lendings
//!
//! A return closes its record and releases stock in one store transaction,
//! but a borrow reserves and writes the record in two steps. Compensation
//! covers a failed record write, yet a timed-out write or a crash between the
//! steps can still leave counters and records out of step. This scan reports
//! such drift; it never repairs it.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        history::{ReconciliationReport, StockDiscrepancy},
        transaction::TransactionQuery,
        user::{Action, Principal},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReconciliationService {
    repository: Repository,
}

impl ReconciliationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn reconcile(&self, principal: &Principal) -> AppResult<ReconciliationReport> {
        principal.require(Action::Reconcile)?;

        let items = self
            .repository
            .bounded(self.repository.items.find_all())
            .await?;
        let outstanding = self
            .repository
            .bounded(self.repository.transactions.find(&TransactionQuery::Outstanding))
            .await?;

        let mut by_records: BTreeMap<Uuid, i64> = BTreeMap::new();
        for record in &outstanding {
            *by_records.entry(record.item_id).or_default() += i64::from(record.quantity);
        }

        let mut discrepancies = Vec::new();
        let known: HashSet<Uuid> = items.iter().map(|item| item.id).collect();
        for item in &items {
            let on_records = by_records.get(&item.id).copied().unwrap_or(0);
            if i64::from(item.on_loan()) != on_records {
                discrepancies.push(StockDiscrepancy {
                    item_id: item.id,
                    item_name: Some(item.name.clone()),
                    on_loan_by_stock: Some(item.on_loan()),
                    on_loan_by_records: on_records,
                });
            }
        }

        // Outstanding lendings pointing at deleted items
        for (item_id, quantity) in &by_records {
            if !known.contains(item_id) {
                discrepancies.push(StockDiscrepancy {
                    item_id: *item_id,
                    item_name: None,
                    on_loan_by_stock: None,
                    on_loan_by_records: *quantity,
                });
            }
        }

        if discrepancies.is_empty() {
            tracing::info!(items = items.len(), outstanding = outstanding.len(), "stock reconciled");
        } else {
            tracing::warn!(count = discrepancies.len(), "stock discrepancies found");
        }

        Ok(ReconciliationReport {
            checked_items: items.len(),
            outstanding_lendings: outstanding.len(),
            discrepancies,
            generated_at: Utc::now(),
        })
    }
}
