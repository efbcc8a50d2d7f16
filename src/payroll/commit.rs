use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::cache::PayrollCache;
use super::commission;
use super::ledger::{self, LedgerContext};
use super::notify::{MailDispatcher, MailPolicy};
use crate::error::{PayrollError, Result};
use crate::model::payroll::{PayrollKey, PayrollRecord};
use crate::provider::ExpenseProvider;
use crate::store::{CommitPlan, PayrollStore};

#[derive(Debug)]
pub enum CommitOutcome {
    Committed {
        payrolls: usize,
        /// Resolves to the number of payslips delivered.
        mail: JoinHandle<usize>,
    },
    AlreadyCommitted,
}

/// Turns a snapshotted batch into paid payroll rows, exactly once.
#[derive(Clone)]
pub struct CommitProcessor {
    store: Arc<dyn PayrollStore>,
    provider: Arc<dyn ExpenseProvider>,
    cache: PayrollCache,
    mail: MailDispatcher,
    policy: MailPolicy,
    organization: String,
}

fn narrow(records: &mut Vec<PayrollRecord>, email: Option<&str>) -> Result<()> {
    if let Some(email) = email {
        records.retain(|r| r.belongs_to(email));
        if records.is_empty() {
            return Err(PayrollError::EmployeeNotFound(email.to_string()));
        }
    }
    Ok(())
}

impl CommitProcessor {
    pub fn new(
        store: Arc<dyn PayrollStore>,
        provider: Arc<dyn ExpenseProvider>,
        cache: PayrollCache,
        mail: MailDispatcher,
        policy: MailPolicy,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            mail,
            policy,
            organization: organization.into(),
        }
    }

    async fn snapshot(&self, key: PayrollKey) -> Result<Vec<PayrollRecord>> {
        let records = self
            .cache
            .get_snapshot(key)
            .await?
            .ok_or(PayrollError::NotSnapshotted(key))?;
        if records.is_empty() {
            return Err(PayrollError::NotFound(key));
        }
        Ok(records)
    }

    pub async fn commit(&self, key: PayrollKey, email: Option<&str>) -> Result<CommitOutcome> {
        let mut records = self.snapshot(key).await?;
        narrow(&mut records, email)?;

        let committed: HashSet<u64> = self
            .store
            .committed_records(key)
            .await?
            .into_iter()
            .map(|r| r.employee.id)
            .collect();
        records.retain(|r| !committed.contains(&r.employee.id));
        if records.is_empty() {
            tracing::info!(%key, "payroll already committed");
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let now = Utc::now().naive_utc();
        for r in &mut records {
            r.is_paid = true;
            r.id.get_or_insert_with(|| Uuid::new_v4().to_string());
        }

        let plan = CommitPlan {
            key,
            commission_ids: records
                .iter()
                .flat_map(|r| r.commission_ids.iter().copied())
                .collect(),
            advance_ids: records
                .iter()
                .filter(|r| !r.salary_advance_amount.is_zero())
                .flat_map(|r| r.salary_advance_ids.iter().copied())
                .collect(),
            transactions: ledger::transactions(
                &records,
                &LedgerContext {
                    batch_date: key.batch_date(),
                    now,
                    organization: &self.organization,
                },
            ),
            paid_at: now,
            records,
        };
        self.store.commit_batch(&plan).await?;
        self.complete_expenses(&plan.records).await;

        let payrolls = plan.records.len();
        let mail = self.notify(plan.records).await;
        Ok(CommitOutcome::Committed { payrolls, mail })
    }

    /// Re-sends payslips of already committed records. Financial state is not
    /// touched.
    pub async fn resend(&self, key: PayrollKey, email: Option<&str>) -> Result<JoinHandle<usize>> {
        self.snapshot(key).await?;
        let mut records = self.store.committed_records(key).await?;
        if records.is_empty() {
            return Err(PayrollError::NotFound(key));
        }
        narrow(&mut records, email)?;
        Ok(self.notify(records).await)
    }

    /// Closes the tracker items reimbursed by `records`. The payroll is
    /// already paid at this point, so failures are only logged.
    async fn complete_expenses(&self, records: &[PayrollRecord]) {
        let items = records
            .iter()
            .flat_map(|r| r.bonus_explains.iter())
            .filter_map(|e| Some((e.bucket_id?, e.todo_id?)));
        let results = join_all(items.map(|(bucket_id, item_id)| async move {
            let res = self.provider.complete(bucket_id, item_id).await;
            (bucket_id, item_id, res)
        }))
        .await;

        for (bucket_id, item_id, res) in results {
            if let Err(e) = res {
                tracing::error!(bucket_id, item_id, error = %e, "failed to complete expense item");
            }
        }
    }

    async fn notify(&self, mut records: Vec<PayrollRecord>) -> JoinHandle<usize> {
        records.retain(|r| self.policy.allows(&r.employee.team_email));
        for r in &mut records {
            commission::simplify(&mut r.commission_explains);
        }
        tracing::info!(count = records.len(), "queueing payroll mails");
        self.mail.dispatch(records).await
    }
}
