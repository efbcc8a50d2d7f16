//! Payroll calculation and settlement.
//!
//! A cycle is identified by a [`PayrollKey`]. Previewing computes every
//! eligible employee's record and snapshots the result; committing consumes
//! that snapshot exactly once.

pub mod advance;
pub mod bonus;
pub mod cache;
pub mod commission;
pub mod commit;
pub mod composer;
pub mod expense;
pub mod ledger;
pub mod notify;
pub mod proration;

#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::Result;
use crate::model::payroll::{PayrollKey, PayrollRecord};
use crate::store::PayrollStore;

pub use cache::PayrollCache;
pub use commit::{CommitOutcome, CommitProcessor};
pub use composer::{FixedPayees, SettlementComposer};
pub use expense::ExpenseAggregator;
pub use notify::{MailDispatcher, MailPolicy};

#[derive(Clone)]
pub struct PayrollService {
    store: Arc<dyn PayrollStore>,
    composer: SettlementComposer,
    cache: PayrollCache,
    committer: CommitProcessor,
}

impl PayrollService {
    pub fn new(
        store: Arc<dyn PayrollStore>,
        composer: SettlementComposer,
        cache: PayrollCache,
        committer: CommitProcessor,
    ) -> Self {
        Self {
            store,
            composer,
            cache,
            committer,
        }
    }

    /// Committed rows if the batch is already paid, otherwise a fresh
    /// computation. Only unfiltered previews are snapshotted.
    pub async fn preview(&self, key: PayrollKey, email: Option<&str>) -> Result<Vec<PayrollRecord>> {
        let mut committed = self.store.committed_records(key).await?;
        if !committed.is_empty() {
            if let Some(email) = email {
                committed.retain(|r| r.belongs_to(email));
            }
            return Ok(committed);
        }

        let records = self.composer.compose(key, email).await?;
        if email.is_none() {
            self.cache.snapshot(key, &records).await?;
        }
        Ok(records)
    }

    pub async fn commit(&self, key: PayrollKey, email: Option<&str>) -> Result<CommitOutcome> {
        self.committer.commit(key, email).await
    }

    pub async fn resend(&self, key: PayrollKey, email: Option<&str>) -> Result<JoinHandle<usize>> {
        self.committer.resend(key, email).await
    }
}
