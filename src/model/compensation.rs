use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Discretionary bonus, VND at creation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bonus {
    pub id: u64,
    pub employee_id: u64,
    pub name: String,
    pub amount: i64,
    pub is_active: bool,
}

/// Sales/hiring commission tied to an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Commission {
    pub id: u64,
    pub employee_id: u64,
    pub amount: i64,
    pub invoice_number: Option<String>,
    pub note: String,
    pub is_paid: bool,
    pub paid_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalaryAdvance {
    pub id: u64,
    pub employee_id: u64,
    pub amount_usd: f64,
    pub is_paid_back: bool,
    pub paid_at: Option<NaiveDateTime>,
}
