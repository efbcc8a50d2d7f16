use std::sync::Arc;

use crate::currency::CurrencyConverter;
use crate::error::Result;
use crate::model::employee::Employee;
use crate::model::expense::ExpenseItem;
use crate::model::money::{VND, Vnd};
use crate::model::payroll::{Batch, PayrollExplain, PayrollKey};
use crate::provider::ExpenseProvider;
use crate::provider::descriptor::Descriptor;

#[derive(Debug, Default)]
pub struct Reimbursements {
    pub total: Vnd,
    pub explains: Vec<PayrollExplain>,
}

#[derive(Clone)]
pub struct ExpenseAggregator {
    provider: Arc<dyn ExpenseProvider>,
    converter: Arc<dyn CurrencyConverter>,
}

impl ExpenseAggregator {
    pub fn new(provider: Arc<dyn ExpenseProvider>, converter: Arc<dyn CurrencyConverter>) -> Self {
        Self { provider, converter }
    }

    /// Fetched once per cycle, then shared read-only by every employee task.
    pub async fn collect(&self, batch: Batch) -> Result<Arc<[ExpenseItem]>> {
        let items = self.provider.approved_expenses(batch).await?;
        Ok(items.into())
    }

    /// Approved items assigned to `employee`, converted to VND. A malformed
    /// title contributes nothing; a failed conversion fails the employee.
    pub async fn reimbursements(
        &self,
        employee: &Employee,
        items: &[ExpenseItem],
        key: PayrollKey,
    ) -> Result<Reimbursements> {
        let mut out = Reimbursements::default();
        let Some(identity) = self.provider.assignee_key(employee) else {
            return Ok(out);
        };

        for item in items.iter().filter(|i| i.is_assigned_to(&identity)) {
            let Some(desc) = Descriptor::parse(&item.title) else {
                tracing::warn!(
                    item_id = item.id,
                    title = %item.title,
                    "expense title is not `reason | amount | currency`, skipping"
                );
                continue;
            };

            let raw = self.provider.extract_amount(desc.amount);
            let amount = if desc.is_vnd() {
                Vnd(raw)
            } else {
                let (converted, _) = self
                    .converter
                    .convert(raw as f64, &desc.currency.to_uppercase(), VND)
                    .await?;
                Vnd::from_converted(converted)
            };
            if amount.is_zero() {
                continue;
            }

            out.total += amount;
            let mut line = PayrollExplain::new(desc.reason, amount, key.month, key.year);
            line.todo_id = Some(item.id);
            line.bucket_id = Some(item.bucket_id);
            out.explains.push(line);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyService;
    use crate::error::PayrollError;
    use crate::provider::fake::FakeProvider;
    use crate::payroll::testutil::employee;

    fn item(id: i64, title: &str, assignee: &str) -> ExpenseItem {
        ExpenseItem { id, bucket_id: 40, title: title.into(), assignees: vec![assignee.into()] }
    }

    fn aggregator() -> ExpenseAggregator {
        ExpenseAggregator::new(
            Arc::new(FakeProvider::default()),
            Arc::new(CurrencyService::new("", false)),
        )
    }

    #[tokio::test]
    async fn sums_items_assigned_to_employee() {
        let emp = employee(1, "a@company.com", 20_000_000, 1);
        let items = vec![
            item(10, "Taxi | 200k | VND", "1001"),
            item(11, "Monitor | 10 | USD", "1001"),
            item(12, "Lunch | 500k | VND", "2002"),
            item(13, "broken title", "1001"),
        ];
        let key = PayrollKey::new(1, 2024, 1).unwrap();

        let r = aggregator().reimbursements(&emp, &items, key).await.unwrap();
        assert_eq!(r.total, Vnd(200_000 + 259_000));
        assert_eq!(r.explains.len(), 2);
        assert_eq!(r.explains[0].name, "Taxi");
        assert_eq!(r.explains[0].todo_id, Some(10));
        assert_eq!(r.explains[0].bucket_id, Some(40));
    }

    #[tokio::test]
    async fn unknown_currency_fails() {
        let emp = employee(1, "a@company.com", 20_000_000, 1);
        let items = vec![item(10, "Hotel | 5000 | JPY", "1001")];
        let key = PayrollKey::new(1, 2024, 1).unwrap();

        let err = aggregator().reimbursements(&emp, &items, key).await.unwrap_err();
        assert!(matches!(err, PayrollError::Currency(_)));
    }

    #[tokio::test]
    async fn zero_amounts_are_skipped() {
        let emp = employee(1, "a@company.com", 20_000_000, 1);
        let items = vec![item(10, "Gift | free | VND", "1001")];
        let key = PayrollKey::new(1, 2024, 1).unwrap();

        let r = aggregator().reimbursements(&emp, &items, key).await.unwrap();
        assert!(r.explains.is_empty());
        assert_eq!(r.total, Vnd::ZERO);
    }
}
