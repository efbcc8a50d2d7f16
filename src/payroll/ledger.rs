use chrono::{NaiveDate, NaiveDateTime};

use crate::model::accounting::{
    AccountingTransaction, CATEGORY_COMM_ACCOUNT, CATEGORY_COMM_HIRING, CATEGORY_COMM_LEAD,
    CATEGORY_COMM_SALES, CATEGORY_RECRUIT, LedgerMetadata, TYPE_SE,
};
use crate::model::money::VND;
use crate::model::payroll::PayrollRecord;
use crate::utils::timeutil::ledger_date;

pub const SOURCE: &str = "payroll";

/// Commission names refine the category; the last match wins.
const COMMISSION_CATEGORIES: &[(&str, &str)] = &[
    ("Account", CATEGORY_COMM_ACCOUNT),
    ("Sales", CATEGORY_COMM_SALES),
    ("Lead", CATEGORY_COMM_LEAD),
];

pub struct LedgerContext<'a> {
    pub batch_date: NaiveDate,
    pub now: NaiveDateTime,
    pub organization: &'a str,
}

/// Salary and contract portions of a record, in VND.
fn salary_split(r: &PayrollRecord) -> (i64, i64) {
    let gross = r.total.amount() + r.salary_advance_amount.amount()
        - r.bonus_amount.amount()
        - r.commission_amount.amount();
    let contract = if r.employee.currency == VND {
        r.contract_amount
    } else {
        let native = r.base_salary_amount + r.contract_amount;
        if native == 0 {
            0
        } else {
            gross * r.contract_amount / native
        }
    };
    (gross - contract, contract)
}

fn bonus_category(r: &PayrollRecord) -> (String, String) {
    let (mut category, kind) = if r.employee.category == CATEGORY_RECRUIT {
        (CATEGORY_COMM_HIRING.to_string(), r.employee.salary_type.clone())
    } else {
        (r.employee.category.clone(), TYPE_SE.to_string())
    };
    let names: Vec<&str> = r.commission_explains.iter().map(|c| c.name.as_str()).collect();
    let names = names.join(" ");
    for (needle, refined) in COMMISSION_CATEGORIES {
        if names.contains(needle) {
            category = refined.to_string();
        }
    }
    (category, kind)
}

/// Ledger rows for one committed record: the salary transfer (net of
/// advances), the contract part when present, and bonus plus commission net of
/// reimbursements.
pub fn transactions_for(r: &PayrollRecord, ctx: &LedgerContext<'_>) -> Vec<AccountingTransaction> {
    let date = ledger_date(ctx.batch_date);
    let metadata = LedgerMetadata {
        source: SOURCE.to_string(),
        id: r.id.clone().unwrap_or_default(),
    };
    let row = |name: String, amount: f64, conversion: i64, rate: f64, currency: &str, category: String, kind: String| {
        AccountingTransaction {
            name,
            date: ctx.now,
            amount,
            conversion_amount: conversion,
            conversion_rate: rate,
            currency: currency.to_string(),
            category,
            kind,
            organization: ctx.organization.to_string(),
            metadata: metadata.clone(),
        }
    };

    let (_, contract_vnd) = salary_split(r);
    let transfer = r.total.amount()
        - contract_vnd
        - r.bonus_amount.amount()
        - r.commission_amount.amount();
    let rate = if r.base_salary_amount == 0 {
        1.0
    } else {
        transfer as f64 / r.base_salary_amount as f64
    };

    let mut out = vec![row(
        format!("Payroll TW - {} {}", r.employee.full_name, date),
        r.base_salary_amount as f64,
        transfer,
        rate,
        &r.employee.currency,
        r.employee.category.clone(),
        r.employee.salary_type.clone(),
    )];

    if r.contract_amount != 0 {
        out.push(row(
            format!("Payroll BHXH - {} {}", r.employee.full_name, date),
            r.contract_amount as f64,
            contract_vnd,
            1.0,
            &r.employee.currency,
            r.employee.category.clone(),
            r.employee.salary_type.clone(),
        ));
    }

    let bonus = r.bonus_amount.amount() + r.commission_amount.amount()
        - r.reimbursement_amount.amount();
    if bonus != 0 {
        let (category, kind) = bonus_category(r);
        out.push(row(
            format!("Bonus - {} {}", r.employee.full_name, date),
            bonus as f64,
            bonus,
            1.0,
            VND,
            category,
            kind,
        ));
    }
    out
}

pub fn transactions(records: &[PayrollRecord], ctx: &LedgerContext<'_>) -> Vec<AccountingTransaction> {
    records.iter().flat_map(|r| transactions_for(r, ctx)).collect()
}
