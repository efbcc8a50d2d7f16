//! Persistence seams. MySQL in production, in-memory in tests.

pub mod mysql;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::model::accounting::AccountingTransaction;
use crate::model::compensation::{Bonus, Commission, SalaryAdvance};
use crate::model::employee::Employee;
use crate::model::payroll::{PayrollKey, PayrollRecord};

pub use mysql::MySqlStore;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Employees still on payroll at `batch_date`, with their salary config.
    async fn list_payable(&self, batch_date: NaiveDate) -> Result<Vec<Employee>>;

    async fn one_by_email(&self, email: &str) -> Result<Option<Employee>>;
}

#[async_trait]
pub trait CompensationStore: Send + Sync {
    async fn active_bonuses(&self, employee_id: u64) -> Result<Vec<Bonus>>;

    async fn unpaid_commissions(&self, employee_id: u64) -> Result<Vec<Commission>>;

    async fn outstanding_advances(&self, employee_id: u64) -> Result<Vec<SalaryAdvance>>;
}

/// Everything a commit writes, applied in one transaction.
#[derive(Debug, Clone)]
pub struct CommitPlan {
    pub key: PayrollKey,
    pub records: Vec<PayrollRecord>,
    pub commission_ids: Vec<u64>,
    pub advance_ids: Vec<u64>,
    pub transactions: Vec<AccountingTransaction>,
    pub paid_at: NaiveDateTime,
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn save_snapshot(&self, key: PayrollKey, payload: String) -> Result<()>;

    async fn load_snapshot(&self, key: PayrollKey) -> Result<Option<String>>;

    /// Persisted, paid rows for `key`.
    async fn committed_records(&self, key: PayrollKey) -> Result<Vec<PayrollRecord>>;

    /// Atomically: upsert the paid rows, settle commissions and advances,
    /// insert the ledger entries.
    async fn commit_batch(&self, plan: &CommitPlan) -> Result<()>;
}
