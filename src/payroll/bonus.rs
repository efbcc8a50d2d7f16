use crate::error::Result;
use crate::model::money::Vnd;
use crate::model::payroll::{PayrollExplain, PayrollKey};
use crate::store::CompensationStore;

#[derive(Debug, Default)]
pub struct BonusSummary {
    pub total: Vnd,
    pub explains: Vec<PayrollExplain>,
}

pub async fn active_bonuses(
    store: &dyn CompensationStore,
    employee_id: u64,
    key: PayrollKey,
) -> Result<BonusSummary> {
    let rows = store.active_bonuses(employee_id).await?;
    let explains: Vec<PayrollExplain> = rows
        .into_iter()
        .map(|b| PayrollExplain::new(b.name, Vnd(b.amount), key.month, key.year))
        .collect();
    Ok(BonusSummary {
        total: explains.iter().map(|e| e.amount).sum(),
        explains,
    })
}
