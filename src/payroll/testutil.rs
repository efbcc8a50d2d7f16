//! Fixtures shared by the payroll tests.

use chrono::NaiveDate;

use crate::model::compensation::{Commission, SalaryAdvance};
use crate::model::employee::{BaseSalary, Employee, WorkingStatus};
use crate::model::money::Vnd;
use crate::model::payroll::{Batch, PayeeSummary, PayrollRecord};

/// VND salaried employee who joined long ago. Tracker identity is `1000 + id`.
pub fn employee(id: u64, email: &str, salary: i64, batch: u32) -> Employee {
    Employee {
        id,
        full_name: format!("Employee {id}"),
        team_email: email.to_string(),
        working_status: WorkingStatus::FullTime,
        joined_date: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
        left_date: None,
        provider_id: Some(1000 + id as i64),
        base_salary: Some(BaseSalary {
            personal_account_amount: salary,
            company_account_amount: 0,
            currency: Some("VND".into()),
            batch,
            category: "Payroll for Engineer".into(),
            salary_type: "SE".into(),
        }),
    }
}

pub fn commission(id: u64, employee_id: u64, amount: i64, invoice: Option<&str>) -> Commission {
    Commission {
        id,
        employee_id,
        amount,
        invoice_number: invoice.map(str::to_string),
        note: "Sales".into(),
        is_paid: false,
        paid_at: None,
        created_at: NaiveDate::from_ymd_opt(2023, 12, 20)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    }
}

pub fn advance(id: u64, employee_id: u64, usd: f64) -> SalaryAdvance {
    SalaryAdvance {
        id,
        employee_id,
        amount_usd: usd,
        is_paid_back: false,
        paid_at: None,
    }
}

/// Salary-only record of 20,000,000 for January 2024, batch 1.
pub fn record(id: u64, email: &str) -> PayrollRecord {
    PayrollRecord {
        id: None,
        employee: PayeeSummary::from(&employee(id, email, 20_000_000, 1)),
        month: 1,
        year: 2024,
        batch: Batch::First,
        due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        base_salary_amount: 20_000_000,
        contract_amount: 0,
        bonus_amount: Vnd::ZERO,
        bonus_explains: vec![],
        commission_amount: Vnd::ZERO,
        commission_explains: vec![],
        commission_ids: vec![],
        reimbursement_amount: Vnd::ZERO,
        salary_advance_amount: Vnd::ZERO,
        salary_advance_ids: vec![],
        total: Vnd(20_000_000),
        note: String::new(),
        is_paid: false,
    }
}
