use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::advance;
use super::bonus;
use super::commission::{self, CommissionNaming};
use super::expense::ExpenseAggregator;
use super::proration::prorate;
use crate::currency::CurrencyConverter;
use crate::error::{PayrollError, Result};
use crate::model::employee::Employee;
use crate::model::expense::ExpenseItem;
use crate::model::money::{VND, Vnd};
use crate::model::payroll::{Batch, PayeeSummary, PayrollKey, PayrollRecord};
use crate::store::{CompensationStore, EmployeeStore};

/// Team emails paid in a batch regardless of their own salary batch.
#[derive(Debug, Clone, Default)]
pub struct FixedPayees {
    pub first: Vec<String>,
    pub second: Vec<String>,
}

impl FixedPayees {
    pub fn for_batch(&self, batch: Batch) -> &[String] {
        match batch {
            Batch::First => &self.first,
            Batch::Second => &self.second,
        }
    }
}

struct Context {
    employees: Arc<dyn EmployeeStore>,
    compensation: Arc<dyn CompensationStore>,
    converter: Arc<dyn CurrencyConverter>,
    expenses: ExpenseAggregator,
    fixed: FixedPayees,
    deadline: Duration,
}

struct Candidate {
    employee: Employee,
    /// Fixed payee outside their own batch: only variable pay flows.
    variable_only: bool,
}

#[derive(Clone)]
pub struct SettlementComposer {
    ctx: Arc<Context>,
}

impl SettlementComposer {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        compensation: Arc<dyn CompensationStore>,
        converter: Arc<dyn CurrencyConverter>,
        expenses: ExpenseAggregator,
        fixed: FixedPayees,
        deadline: Duration,
    ) -> Self {
        Self {
            ctx: Arc::new(Context {
                employees,
                compensation,
                converter,
                expenses,
                fixed,
                deadline,
            }),
        }
    }

    /// Computes every eligible employee's record for `key`, or for the single
    /// employee matching `email`. Fails as a whole if any employee fails or
    /// the deadline passes.
    pub async fn compose(&self, key: PayrollKey, email: Option<&str>) -> Result<Vec<PayrollRecord>> {
        let secs = self.ctx.deadline.as_secs();
        tokio::time::timeout(self.ctx.deadline, self.compose_all(key, email))
            .await
            .map_err(|_| {
                tracing::error!(%key, deadline_secs = secs, "payroll computation timed out");
                PayrollError::Deadline(secs)
            })?
    }

    async fn candidates(&self, key: PayrollKey, email: Option<&str>) -> Result<Vec<Candidate>> {
        let ctx = &self.ctx;
        let mut employees = ctx.employees.list_payable(key.batch_date()).await?;

        let fixed = ctx.fixed.for_batch(key.batch);
        for address in fixed {
            if employees.iter().any(|e| e.team_email.eq_ignore_ascii_case(address)) {
                continue;
            }
            match ctx.employees.one_by_email(address).await? {
                Some(e) => employees.push(e),
                None => tracing::warn!(email = %address, "fixed payee not found"),
            }
        }

        if let Some(filter) = email {
            employees.retain(|e| e.team_email.eq_ignore_ascii_case(filter));
            if employees.is_empty() {
                return Err(PayrollError::EmployeeNotFound(filter.to_string()));
            }
        }

        let mut seen = HashSet::new();
        let candidates = employees
            .into_iter()
            .filter(|e| seen.insert(e.id))
            .filter_map(|employee| {
                if employee.salary_currency().is_none() {
                    tracing::debug!(employee_id = employee.id, "no salary currency, skipping");
                    return None;
                }
                let in_batch = employee.salary_batch() == Some(key.batch.day());
                let is_fixed = fixed
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(&employee.team_email));
                match (in_batch, is_fixed) {
                    (true, _) => Some(Candidate { employee, variable_only: false }),
                    (false, true) => Some(Candidate { employee, variable_only: true }),
                    (false, false) => None,
                }
            })
            .collect();
        Ok(candidates)
    }

    async fn compose_all(&self, key: PayrollKey, email: Option<&str>) -> Result<Vec<PayrollRecord>> {
        let candidates = self.candidates(key, email).await?;
        let expenses = self.ctx.expenses.collect(key.batch).await?;

        tracing::info!(%key, employees = candidates.len(), expenses = expenses.len(), "composing payroll");

        let mut set = JoinSet::new();
        for candidate in candidates {
            let ctx = self.ctx.clone();
            let expenses = expenses.clone();
            set.spawn(async move { compute(&ctx, candidate, key, &expenses).await });
        }

        let mut records = Vec::new();
        let mut failure = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(Some(record))) => records.push(record),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, %key, "employee payroll failed");
                    failure.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, %key, "employee payroll task panicked");
                    failure.get_or_insert(PayrollError::Task(e.to_string()));
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        records.sort_by_key(|r| r.employee.id);
        Ok(records)
    }
}

/// One employee's record, or `None` when nothing is owed.
async fn compute(
    ctx: &Context,
    candidate: Candidate,
    key: PayrollKey,
    expenses: &[ExpenseItem],
) -> Result<Option<PayrollRecord>> {
    let Candidate { employee, variable_only } = candidate;
    let Some(salary) = employee.base_salary.as_ref() else {
        return Ok(None);
    };
    let currency = employee.salary_currency().unwrap_or(VND).to_uppercase();

    let (base, contract) = if variable_only {
        (0, 0)
    } else {
        (salary.personal_account_amount, salary.company_account_amount)
    };
    let due_date = key.due_date();
    let prorated = prorate(
        key.batch_date(),
        due_date,
        employee.joined_date,
        employee.left_date,
        base,
        contract,
    );

    let compensation = ctx.compensation.as_ref();
    let bonuses = bonus::active_bonuses(compensation, employee.id, key).await?;
    let commissions =
        commission::unpaid_commissions(compensation, employee.id, CommissionNaming::Detailed).await?;
    let reimbursed = ctx.expenses.reimbursements(&employee, expenses, key).await?;
    let advance = advance::outstanding(compensation, ctx.converter.as_ref(), employee.id).await?;

    let bonus_amount = bonuses.total + reimbursed.total;
    let mut bonus_explains = bonuses.explains;
    bonus_explains.extend(reimbursed.explains);

    let gross = if currency == VND {
        Vnd(prorated.base + prorated.contract) + bonus_amount + commissions.total
    } else {
        let fx = ctx.converter.as_ref();
        let (c, _) = fx.convert(commissions.total.amount() as f64, VND, &currency).await?;
        let (b, _) = fx.convert(bonus_amount.amount() as f64, VND, &currency).await?;
        let native = (prorated.base + prorated.contract) as f64 + b + c;
        let (vnd, _) = fx.convert(native, &currency, VND).await?;
        Vnd::from_converted(vnd)
    };
    if gross.is_zero() {
        tracing::debug!(employee_id = employee.id, "nothing earned, dropping");
        return Ok(None);
    }
    let total = gross - advance.amount;

    let mut payee = PayeeSummary::from(&employee);
    payee.currency = currency;

    tracing::debug!(employee_id = employee.id, total = total.amount(), "payroll computed");

    Ok(Some(PayrollRecord {
        id: None,
        employee: payee,
        month: key.month,
        year: key.year,
        batch: key.batch,
        due_date,
        base_salary_amount: prorated.base,
        contract_amount: prorated.contract,
        bonus_amount,
        bonus_explains,
        commission_amount: commissions.total,
        commission_explains: commissions.explains,
        commission_ids: commissions.ids,
        reimbursement_amount: reimbursed.total,
        salary_advance_amount: advance.amount,
        salary_advance_ids: advance.ids,
        total,
        note: prorated.note,
        is_paid: false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyService;
    use crate::model::compensation::Bonus;
    use crate::payroll::testutil::{advance, commission, employee};
    use crate::provider::fake::FakeProvider;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;

    fn composer(store: Arc<MemoryStore>, provider: FakeProvider, fixed: FixedPayees) -> SettlementComposer {
        let fx: Arc<dyn CurrencyConverter> = Arc::new(CurrencyService::new("", false));
        SettlementComposer::new(
            store.clone(),
            store,
            fx.clone(),
            ExpenseAggregator::new(Arc::new(provider), fx),
            fixed,
            Duration::from_secs(5),
        )
    }

    fn key() -> PayrollKey {
        PayrollKey::new(1, 2024, 1).unwrap()
    }

    #[tokio::test]
    async fn full_month_salary() {
        let store = Arc::new(MemoryStore::default());
        store.employees.lock().unwrap().push(employee(1, "a@company.com", 20_000_000, 1));

        let records = composer(store, FakeProvider::default(), FixedPayees::default())
            .compose(key(), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total, Vnd(20_000_000));
        assert!(records[0].note.is_empty());
    }

    #[tokio::test]
    async fn commission_and_advance_flow_into_total() {
        let store = Arc::new(MemoryStore::default());
        store.employees.lock().unwrap().push(employee(1, "a@company.com", 20_000_000, 1));
        store.commissions.lock().unwrap().push(commission(11, 1, 1_000_000, Some("INV-1")));
        store.advances.lock().unwrap().push(advance(21, 1, 40.0));

        let records = composer(store, FakeProvider::default(), FixedPayees::default())
            .compose(key(), None)
            .await
            .unwrap();
        let r = &records[0];
        assert_eq!(r.total, Vnd(19_964_000));
        assert_eq!(r.commission_amount, Vnd(1_000_000));
        assert_eq!(r.salary_advance_amount, Vnd(1_036_000));
        assert_eq!(r.salary_advance_ids, vec![21]);
    }

    #[tokio::test]
    async fn other_batch_and_currencyless_employees_are_skipped() {
        let store = Arc::new(MemoryStore::default());
        {
            let mut rows = store.employees.lock().unwrap();
            rows.push(employee(1, "a@company.com", 20_000_000, 1));
            rows.push(employee(2, "b@company.com", 20_000_000, 15));
            let mut no_currency = employee(3, "c@company.com", 20_000_000, 1);
            if let Some(s) = no_currency.base_salary.as_mut() {
                s.currency = None;
            }
            rows.push(no_currency);
        }

        let records = composer(store, FakeProvider::default(), FixedPayees::default())
            .compose(key(), None)
            .await
            .unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.employee.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn fixed_payee_gets_only_variable_pay() {
        let store = Arc::new(MemoryStore::default());
        store.employees.lock().unwrap().push(employee(2, "founder@company.com", 50_000_000, 15));
        store.bonuses.lock().unwrap().push(Bonus {
            id: 1,
            employee_id: 2,
            name: "Board fee".into(),
            amount: 3_000_000,
            is_active: true,
        });
        let fixed = FixedPayees {
            first: vec!["founder@company.com".into()],
            second: vec![],
        };

        let records = composer(store, FakeProvider::default(), fixed)
            .compose(key(), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].base_salary_amount, 0);
        assert_eq!(records[0].total, Vnd(3_000_000));
    }

    #[tokio::test]
    async fn zero_total_records_are_dropped() {
        let store = Arc::new(MemoryStore::default());
        store.employees.lock().unwrap().push(employee(2, "founder@company.com", 50_000_000, 15));
        let fixed = FixedPayees {
            first: vec!["founder@company.com".into()],
            second: vec![],
        };

        let records = composer(store, FakeProvider::default(), fixed)
            .compose(key(), None)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn advance_equal_to_earnings_keeps_the_record() {
        let store = Arc::new(MemoryStore::default());
        store.employees.lock().unwrap().push(employee(1, "a@company.com", 1_036_000, 1));
        store.advances.lock().unwrap().push(advance(21, 1, 40.0));

        let records = composer(store, FakeProvider::default(), FixedPayees::default())
            .compose(key(), None)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].total.is_zero());
        assert_eq!(records[0].salary_advance_ids, vec![21]);
    }

    #[tokio::test]
    async fn reimbursement_joins_bonus() {
        let store = Arc::new(MemoryStore::default());
        store.employees.lock().unwrap().push(employee(1, "a@company.com", 20_000_000, 1));
        let provider = FakeProvider {
            reimbursements: vec![ExpenseItem {
                id: 70,
                bucket_id: 4,
                title: "Taxi | 200k | VND".into(),
                assignees: vec!["1001".into()],
            }],
            comments: vec![(
                70,
                crate::provider::Comment { author_id: "99".into(), content: "approved".into() },
            )],
            ..Default::default()
        };

        let records = composer(store, provider, FixedPayees::default())
            .compose(key(), None)
            .await
            .unwrap();
        let r = &records[0];
        assert_eq!(r.bonus_amount, Vnd(200_000));
        assert_eq!(r.reimbursement_amount, Vnd(200_000));
        assert_eq!(r.total, Vnd(20_200_000));
        assert_eq!(r.bonus_explains[0].todo_id, Some(70));
    }

    #[tokio::test]
    async fn usd_salary_is_settled_in_vnd() {
        let store = Arc::new(MemoryStore::default());
        let mut e = employee(1, "a@company.com", 1_000, 1);
        if let Some(s) = e.base_salary.as_mut() {
            s.currency = Some("USD".into());
        }
        store.employees.lock().unwrap().push(e);
        store.commissions.lock().unwrap().push(commission(11, 1, 2_590_000, Some("INV-1")));

        let records = composer(store, FakeProvider::default(), FixedPayees::default())
            .compose(key(), None)
            .await
            .unwrap();
        // (1000 + 100) USD
        assert_eq!(records[0].total, Vnd(28_490_000));
        assert_eq!(records[0].employee.currency, "USD");
    }

    #[tokio::test]
    async fn email_filter_narrows_to_one_employee() {
        let store = Arc::new(MemoryStore::default());
        {
            let mut rows = store.employees.lock().unwrap();
            rows.push(employee(1, "a@company.com", 20_000_000, 1));
            rows.push(employee(2, "b@company.com", 10_000_000, 1));
        }
        let c = composer(store, FakeProvider::default(), FixedPayees::default());

        let records = c.compose(key(), Some("B@company.com")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].employee.id, 2);

        let err = c.compose(key(), Some("nobody@company.com")).await.unwrap_err();
        assert!(matches!(err, PayrollError::EmployeeNotFound(_)));
    }

    struct FailingAdvances(MemoryStore);

    #[async_trait]
    impl CompensationStore for FailingAdvances {
        async fn active_bonuses(&self, id: u64) -> Result<Vec<Bonus>> {
            self.0.active_bonuses(id).await
        }
        async fn unpaid_commissions(&self, id: u64) -> Result<Vec<crate::model::compensation::Commission>> {
            self.0.unpaid_commissions(id).await
        }
        async fn outstanding_advances(&self, id: u64) -> Result<Vec<crate::model::compensation::SalaryAdvance>> {
            if id == 2 {
                return Err(PayrollError::Currency("rate provider down".into()));
            }
            self.0.outstanding_advances(id).await
        }
    }

    #[tokio::test]
    async fn one_failing_employee_fails_the_batch() {
        let store = Arc::new(MemoryStore::default());
        {
            let mut rows = store.employees.lock().unwrap();
            rows.push(employee(1, "a@company.com", 20_000_000, 1));
            rows.push(employee(2, "b@company.com", 10_000_000, 1));
        }
        let fx: Arc<dyn CurrencyConverter> = Arc::new(CurrencyService::new("", false));
        let c = SettlementComposer::new(
            store,
            Arc::new(FailingAdvances(MemoryStore::default())),
            fx.clone(),
            ExpenseAggregator::new(Arc::new(FakeProvider::default()), fx),
            FixedPayees::default(),
            Duration::from_secs(5),
        );

        let err = c.compose(key(), None).await.unwrap_err();
        assert!(matches!(err, PayrollError::Currency(_)));
    }

    struct SlowEmployees;

    #[async_trait]
    impl EmployeeStore for SlowEmployees {
        async fn list_payable(&self, _d: chrono::NaiveDate) -> Result<Vec<Employee>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![])
        }
        async fn one_by_email(&self, _email: &str) -> Result<Option<Employee>> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_enforced() {
        let fx: Arc<dyn CurrencyConverter> = Arc::new(CurrencyService::new("", false));
        let c = SettlementComposer::new(
            Arc::new(SlowEmployees),
            Arc::new(MemoryStore::default()),
            fx.clone(),
            ExpenseAggregator::new(Arc::new(FakeProvider::default()), fx),
            FixedPayees::default(),
            Duration::from_secs(2),
        );

        let err = c.compose(key(), None).await.unwrap_err();
        assert!(matches!(err, PayrollError::Deadline(2)));
    }
}
