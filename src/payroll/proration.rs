use chrono::NaiveDate;

use crate::utils::timeutil::{days_between, joined_in_batch, short_day_month, weekend_days_between};

/// Salary for the period after accounting for a mid-period join or leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proration {
    pub base: i64,
    pub contract: i64,
    /// Empty unless the amounts were prorated.
    pub note: String,
}

fn work_days(from: NaiveDate, to: NaiveDate) -> i64 {
    days_between(from, to) - weekend_days_between(from, to)
}

/// Scales `base + contract` by worked days over the period's work days. Any
/// shortfall that would make `base` negative is taken from `contract`.
pub fn prorate(
    batch_date: NaiveDate,
    due_date: NaiveDate,
    joined: NaiveDate,
    left: Option<NaiveDate>,
    base: i64,
    contract: i64,
) -> Proration {
    let unchanged = Proration {
        base,
        contract,
        note: String::new(),
    };

    let start = if joined_in_batch(joined, batch_date) {
        Some(joined)
    } else {
        None
    };
    let end = left.filter(|l| *l < due_date);
    if start.is_none() && end.is_none() {
        return unchanged;
    }
    let start = start.unwrap_or(batch_date);
    let end = end.unwrap_or(due_date);

    let total_days = work_days(batch_date, due_date);
    let mut worked_days = work_days(start, end);
    if end != due_date {
        worked_days += 1;
    }
    if worked_days == total_days || total_days == 0 {
        return unchanged;
    }

    let prorated = worked_days * (base + contract) / total_days;
    let mut base = prorated - contract;
    let mut contract = contract;
    if base < 0 {
        contract += base;
        base = 0;
    }

    Proration {
        base,
        contract,
        note: format!(
            "Work from {} to {}",
            short_day_month(start),
            short_day_month(end)
        ),
    }
}
