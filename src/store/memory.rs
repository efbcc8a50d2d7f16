use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{CommitPlan, CompensationStore, EmployeeStore, PayrollStore};
use crate::error::Result;
use crate::model::accounting::AccountingTransaction;
use crate::model::compensation::{Bonus, Commission, SalaryAdvance};
use crate::model::employee::Employee;
use crate::model::payroll::{PayrollKey, PayrollRecord};

#[derive(Default)]
pub struct MemoryStore {
    pub employees: Mutex<Vec<Employee>>,
    pub bonuses: Mutex<Vec<Bonus>>,
    pub commissions: Mutex<Vec<Commission>>,
    pub advances: Mutex<Vec<SalaryAdvance>>,
    pub snapshots: Mutex<HashMap<PayrollKey, String>>,
    pub payrolls: Mutex<Vec<PayrollRecord>>,
    pub transactions: Mutex<Vec<AccountingTransaction>>,
    pub commits: Mutex<usize>,
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_payable(&self, _batch_date: NaiveDate) -> Result<Vec<Employee>> {
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn one_by_email(&self, email: &str) -> Result<Option<Employee>> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.team_email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl CompensationStore for MemoryStore {
    async fn active_bonuses(&self, employee_id: u64) -> Result<Vec<Bonus>> {
        Ok(self
            .bonuses
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.employee_id == employee_id && b.is_active)
            .cloned()
            .collect())
    }

    async fn unpaid_commissions(&self, employee_id: u64) -> Result<Vec<Commission>> {
        Ok(self
            .commissions
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.employee_id == employee_id && !c.is_paid)
            .cloned()
            .collect())
    }

    async fn outstanding_advances(&self, employee_id: u64) -> Result<Vec<SalaryAdvance>> {
        Ok(self
            .advances
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.employee_id == employee_id && !a.is_paid_back)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn save_snapshot(&self, key: PayrollKey, payload: String) -> Result<()> {
        self.snapshots.lock().unwrap().insert(key, payload);
        Ok(())
    }

    async fn load_snapshot(&self, key: PayrollKey) -> Result<Option<String>> {
        Ok(self.snapshots.lock().unwrap().get(&key).cloned())
    }

    async fn committed_records(&self, key: PayrollKey) -> Result<Vec<PayrollRecord>> {
        Ok(self
            .payrolls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.key() == key && p.is_paid)
            .cloned()
            .collect())
    }

    async fn commit_batch(&self, plan: &CommitPlan) -> Result<()> {
        let mut payrolls = self.payrolls.lock().unwrap();
        for record in &plan.records {
            let existing = payrolls
                .iter_mut()
                .find(|p| p.key() == record.key() && p.employee.id == record.employee.id);
            match existing {
                Some(row) => *row = record.clone(),
                None => payrolls.push(record.clone()),
            }
        }

        for c in self.commissions.lock().unwrap().iter_mut() {
            if !c.is_paid && plan.commission_ids.contains(&c.id) {
                c.is_paid = true;
                c.paid_at = Some(plan.paid_at);
            }
        }
        for a in self.advances.lock().unwrap().iter_mut() {
            if !a.is_paid_back && plan.advance_ids.contains(&a.id) {
                a.is_paid_back = true;
                a.paid_at = Some(plan.paid_at);
            }
        }

        self.transactions
            .lock()
            .unwrap()
            .extend(plan.transactions.iter().cloned());
        *self.commits.lock().unwrap() += 1;
        Ok(())
    }
}
