use chrono::Datelike;

use crate::error::Result;
use crate::model::money::Vnd;
use crate::model::payroll::PayrollExplain;
use crate::store::CompensationStore;

/// How commission lines are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionNaming {
    /// `"<invoice> - <note>"`, shown to accounting.
    Detailed,
    /// `"<invoice> - Bonus"`, shown to the employee.
    Simplified,
}

pub fn display_name(invoice: &str, note: &str, naming: CommissionNaming) -> String {
    match naming {
        CommissionNaming::Simplified => format!("{invoice} - Bonus"),
        CommissionNaming::Detailed if note.is_empty() => invoice.to_string(),
        CommissionNaming::Detailed => format!("{invoice} - {note}"),
    }
}

/// Rewrites detailed commission lines into their simplified form.
pub fn simplify(explains: &mut [PayrollExplain]) {
    for e in explains {
        let invoice = e.name.split(" - ").next().unwrap_or(&e.name).to_string();
        e.name = display_name(&invoice, "", CommissionNaming::Simplified);
    }
}

#[derive(Debug, Default)]
pub struct CommissionSummary {
    pub total: Vnd,
    /// Every row counted in `total`, with or without an invoice.
    pub ids: Vec<u64>,
    pub explains: Vec<PayrollExplain>,
}

/// Unpaid commissions of an employee. Commissions without an invoice count
/// towards the total but get no line.
pub async fn unpaid_commissions(
    store: &dyn CompensationStore,
    employee_id: u64,
    naming: CommissionNaming,
) -> Result<CommissionSummary> {
    let rows = store.unpaid_commissions(employee_id).await?;
    let mut summary = CommissionSummary::default();
    for c in rows {
        summary.total += Vnd(c.amount);
        summary.ids.push(c.id);
        let Some(invoice) = c.invoice_number.as_deref() else {
            continue;
        };
        let mut line = PayrollExplain::new(
            display_name(invoice, &c.note, naming),
            Vnd(c.amount),
            c.created_at.month(),
            c.created_at.year(),
        );
        line.id = Some(c.id);
        summary.explains.push(line);
    }
    Ok(summary)
}
