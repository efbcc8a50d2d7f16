use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PayrollError, Result};
use crate::model::employee::Employee;
use crate::model::money::Vnd;

/// The two pay days of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Batch {
    First,
    Second,
}

impl Batch {
    pub fn day(self) -> u32 {
        match self {
            Batch::First => 1,
            Batch::Second => 15,
        }
    }
}

impl TryFrom<u32> for Batch {
    type Error = PayrollError;

    fn try_from(day: u32) -> Result<Self> {
        match day {
            1 => Ok(Batch::First),
            15 => Ok(Batch::Second),
            other => Err(PayrollError::InvalidBatch(other)),
        }
    }
}

impl From<Batch> for u32 {
    fn from(b: Batch) -> u32 {
        b.day()
    }
}

/// Identifies one pay cycle: (month, year, batch-day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayrollKey {
    pub month: u32,
    pub year: i32,
    pub batch: Batch,
}

impl PayrollKey {
    pub fn new(month: u32, year: i32, batch_day: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(PayrollError::InvalidMonth(month));
        }
        if !(2000..=9999).contains(&year) {
            return Err(PayrollError::InvalidYear(year));
        }
        let batch = Batch::try_from(batch_day)?;
        Ok(Self { month, year, batch })
    }

    /// First day of the pay period.
    pub fn batch_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, self.batch.day())
            .unwrap_or(NaiveDate::MIN)
    }

    /// End of the pay period, one month after the batch date.
    pub fn due_date(&self) -> NaiveDate {
        let start = self.batch_date();
        start.checked_add_months(Months::new(1)).unwrap_or(start)
    }
}

impl fmt::Display for PayrollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02} batch {}", self.year, self.month, self.batch.day())
    }
}

/// One line of the itemized bonus/commission breakdown. Persisted as JSON and
/// rendered into the payslip mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollExplain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub amount: Vnd,
    pub month: u32,
    pub year: i32,
    pub name: String,
    #[serde(default, rename = "todoId", skip_serializing_if = "Option::is_none")]
    pub todo_id: Option<i64>,
    #[serde(default, rename = "bucketId", skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<i64>,
}

impl PayrollExplain {
    pub fn new(name: impl Into<String>, amount: Vnd, month: u32, year: i32) -> Self {
        Self {
            id: None,
            amount,
            month,
            year,
            name: name.into(),
            todo_id: None,
            bucket_id: None,
        }
    }
}

/// What the payslip and the ledger need to know about the payee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayeeSummary {
    pub id: u64,
    pub full_name: String,
    pub team_email: String,
    pub currency: String,
    pub category: String,
    pub salary_type: String,
    pub batch: u32,
}

impl From<&Employee> for PayeeSummary {
    fn from(e: &Employee) -> Self {
        let salary = e.base_salary.as_ref();
        Self {
            id: e.id,
            full_name: e.full_name.clone(),
            team_email: e.team_email.clone(),
            currency: salary
                .and_then(|s| s.currency.clone())
                .unwrap_or_default(),
            category: salary.map(|s| s.category.clone()).unwrap_or_default(),
            salary_type: salary.map(|s| s.salary_type.clone()).unwrap_or_default(),
            batch: salary.map(|s| s.batch).unwrap_or_default(),
        }
    }
}

/// The unit of settlement, unique per (employee, month, year, batch).
///
/// `base_salary_amount` and `contract_amount` are expressed in the payee's
/// salary currency; everything typed [`Vnd`] is in the settlement currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub employee: PayeeSummary,
    pub month: u32,
    pub year: i32,
    pub batch: Batch,
    pub due_date: NaiveDate,
    pub base_salary_amount: i64,
    pub contract_amount: i64,
    pub bonus_amount: Vnd,
    pub bonus_explains: Vec<PayrollExplain>,
    pub commission_amount: Vnd,
    pub commission_explains: Vec<PayrollExplain>,
    /// Commissions settled by this record, including those without a line.
    #[serde(default)]
    pub commission_ids: Vec<u64>,
    /// Portion of `bonus_amount` that reimburses approved expenses.
    pub reimbursement_amount: Vnd,
    pub salary_advance_amount: Vnd,
    #[serde(default)]
    pub salary_advance_ids: Vec<u64>,
    pub total: Vnd,
    #[serde(default)]
    pub note: String,
    pub is_paid: bool,
}

impl PayrollRecord {
    pub fn key(&self) -> PayrollKey {
        PayrollKey {
            month: self.month,
            year: self.year,
            batch: self.batch,
        }
    }

    pub fn batch_date(&self) -> NaiveDate {
        self.key().batch_date()
    }

    pub fn belongs_to(&self, email: &str) -> bool {
        self.employee.team_email.eq_ignore_ascii_case(email)
    }

    pub fn period_label(&self) -> String {
        let date = self.batch_date();
        format!("{} {}", month_name(date.month()), date.year())
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}
