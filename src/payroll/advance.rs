use crate::currency::CurrencyConverter;
use crate::error::Result;
use crate::model::money::{USD, VND, Vnd};
use crate::store::CompensationStore;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AdvanceDeduction {
    pub amount: Vnd,
    pub ids: Vec<u64>,
}

/// Outstanding salary advances of an employee, converted from USD.
pub async fn outstanding(
    store: &dyn CompensationStore,
    converter: &dyn CurrencyConverter,
    employee_id: u64,
) -> Result<AdvanceDeduction> {
    let advances = store.outstanding_advances(employee_id).await?;
    if advances.is_empty() {
        return Ok(AdvanceDeduction::default());
    }

    let usd: f64 = advances.iter().map(|a| a.amount_usd).sum();
    let (vnd, _) = converter.convert(usd, USD, VND).await?;
    Ok(AdvanceDeduction {
        amount: Vnd::from_converted(vnd),
        ids: advances.iter().map(|a| a.id).collect(),
    })
}
