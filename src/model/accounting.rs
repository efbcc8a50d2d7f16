use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const TYPE_SE: &str = "SE";

pub const CATEGORY_RECRUIT: &str = "Payroll for Recruit";
pub const CATEGORY_COMM_LEAD: &str = "Commission for Lead";
pub const CATEGORY_COMM_SALES: &str = "Commission for Sales";
pub const CATEGORY_COMM_ACCOUNT: &str = "Commission for Account";
pub const CATEGORY_COMM_HIRING: &str = "Commission for Hiring";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerMetadata {
    pub source: String,
    pub id: String,
}

/// Ledger row written when a payroll batch is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingTransaction {
    pub name: String,
    pub date: NaiveDateTime,
    /// In `currency`.
    pub amount: f64,
    /// In VND.
    pub conversion_amount: i64,
    pub conversion_rate: f64,
    pub currency: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub organization: String,
    pub metadata: LedgerMetadata,
}
