use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, Transaction};

use super::{CommitPlan, CompensationStore, EmployeeStore, PayrollStore};
use crate::error::Result;
use crate::model::accounting::AccountingTransaction;
use crate::model::compensation::{Bonus, Commission, SalaryAdvance};
use crate::model::employee::{Employee, EmployeeRow};
use crate::model::payroll::{PayrollKey, PayrollRecord};
use crate::utils::db_utils::build_settle_sql;

const EMPLOYEE_COLUMNS: &str = r#"
    e.id, e.full_name, e.team_email, e.working_status, e.joined_date, e.left_date,
    e.basecamp_id AS provider_id,
    s.personal_account_amount, s.company_account_amount, s.currency, s.batch,
    s.category, s.type AS salary_type
"#;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn upsert_payroll(tx: &mut Transaction<'_, MySql>, r: &PayrollRecord) -> Result<()> {
        let payload = serde_json::to_string(r)?;
        let bonus_explain = serde_json::to_string(&r.bonus_explains)?;
        let commission_explain = serde_json::to_string(&r.commission_explains)?;

        sqlx::query(
            r#"
            INSERT INTO payrolls
            (employee_id, month, year, batch, due_date, base_salary_amount, contract_amount,
             bonus_amount, bonus_explain, commission_amount, commission_explain,
             reimbursement_amount, salary_advance_amount, total, note, is_paid, payload)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                due_date = VALUES(due_date),
                base_salary_amount = VALUES(base_salary_amount),
                contract_amount = VALUES(contract_amount),
                bonus_amount = VALUES(bonus_amount),
                bonus_explain = VALUES(bonus_explain),
                commission_amount = VALUES(commission_amount),
                commission_explain = VALUES(commission_explain),
                reimbursement_amount = VALUES(reimbursement_amount),
                salary_advance_amount = VALUES(salary_advance_amount),
                total = VALUES(total),
                note = VALUES(note),
                is_paid = VALUES(is_paid),
                payload = VALUES(payload)
            "#,
        )
        .bind(r.employee.id)
        .bind(r.month)
        .bind(r.year)
        .bind(r.batch.day())
        .bind(r.due_date)
        .bind(r.base_salary_amount)
        .bind(r.contract_amount)
        .bind(r.bonus_amount.amount())
        .bind(bonus_explain)
        .bind(r.commission_amount.amount())
        .bind(commission_explain)
        .bind(r.reimbursement_amount.amount())
        .bind(r.salary_advance_amount.amount())
        .bind(r.total.amount())
        .bind(&r.note)
        .bind(r.is_paid)
        .bind(payload)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn settle(
        tx: &mut Transaction<'_, MySql>,
        table: &str,
        set: &str,
        guard: &str,
        paid_at: chrono::NaiveDateTime,
        ids: &[u64],
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = build_settle_sql(table, set, guard, ids.len());
        let mut q = sqlx::query(&sql).bind(paid_at);
        for id in ids {
            q = q.bind(*id);
        }
        Ok(q.execute(&mut **tx).await?.rows_affected())
    }

    async fn insert_transaction(
        tx: &mut Transaction<'_, MySql>,
        t: &AccountingTransaction,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounting_transactions
            (name, date, amount, conversion_amount, conversion_rate, currency,
             category, type, organization, metadata)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&t.name)
        .bind(t.date)
        .bind(t.amount)
        .bind(t.conversion_amount)
        .bind(t.conversion_rate)
        .bind(&t.currency)
        .bind(&t.category)
        .bind(&t.kind)
        .bind(&t.organization)
        .bind(serde_json::to_string(&t.metadata)?)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn list_payable(&self, batch_date: NaiveDate) -> Result<Vec<Employee>> {
        let sql = format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees e
            LEFT JOIN base_salaries s ON s.employee_id = e.id
            WHERE e.joined_date < DATE_ADD(?, INTERVAL 1 MONTH)
              AND (e.working_status <> 'left' OR e.left_date >= ?)
            ORDER BY e.id
            "#
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(batch_date)
            .bind(batch_date)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn one_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let sql = format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees e
            LEFT JOIN base_salaries s ON s.employee_id = e.id
            WHERE LOWER(e.team_email) = LOWER(?)
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }
}

#[async_trait]
impl CompensationStore for MySqlStore {
    async fn active_bonuses(&self, employee_id: u64) -> Result<Vec<Bonus>> {
        let rows = sqlx::query_as::<_, Bonus>(
            r#"
            SELECT id, employee_id, name, amount, is_active
            FROM bonuses
            WHERE employee_id = ? AND is_active = 1
            ORDER BY id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn unpaid_commissions(&self, employee_id: u64) -> Result<Vec<Commission>> {
        let rows = sqlx::query_as::<_, Commission>(
            r#"
            SELECT c.id, c.employee_id, c.amount, i.number AS invoice_number,
                   COALESCE(c.note, '') AS note, c.is_paid, c.paid_at, c.created_at
            FROM commissions c
            LEFT JOIN invoices i ON i.id = c.invoice_id
            WHERE c.employee_id = ? AND c.is_paid = 0
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn outstanding_advances(&self, employee_id: u64) -> Result<Vec<SalaryAdvance>> {
        let rows = sqlx::query_as::<_, SalaryAdvance>(
            r#"
            SELECT id, employee_id, amount_usd, is_paid_back, paid_at
            FROM salary_advances
            WHERE employee_id = ? AND is_paid_back = 0
            ORDER BY id
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn save_snapshot(&self, key: PayrollKey, payload: String) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cached_payrolls (month, year, batch, payrolls)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE payrolls = VALUES(payrolls)
            "#,
        )
        .bind(key.month)
        .bind(key.year)
        .bind(key.batch.day())
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_snapshot(&self, key: PayrollKey) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT CAST(payrolls AS CHAR)
            FROM cached_payrolls
            WHERE month = ? AND year = ? AND batch = ?
            "#,
        )
        .bind(key.month)
        .bind(key.year)
        .bind(key.batch.day())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(p,)| p))
    }

    async fn committed_records(&self, key: PayrollKey) -> Result<Vec<PayrollRecord>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT CAST(payload AS CHAR)
            FROM payrolls
            WHERE month = ? AND year = ? AND batch = ? AND is_paid = 1
            ORDER BY employee_id
            "#,
        )
        .bind(key.month)
        .bind(key.year)
        .bind(key.batch.day())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(p,)| serde_json::from_str(&p).map_err(Into::into))
            .collect()
    }

    async fn commit_batch(&self, plan: &CommitPlan) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for record in &plan.records {
            Self::upsert_payroll(&mut tx, record).await?;
        }

        let commissions = Self::settle(
            &mut tx,
            "commissions",
            "is_paid = 1, paid_at = ?",
            "is_paid = 0",
            plan.paid_at,
            &plan.commission_ids,
        )
        .await?;

        let advances = Self::settle(
            &mut tx,
            "salary_advances",
            "is_paid_back = 1, paid_at = ?",
            "is_paid_back = 0",
            plan.paid_at,
            &plan.advance_ids,
        )
        .await?;

        for t in &plan.transactions {
            Self::insert_transaction(&mut tx, t).await?;
        }

        tx.commit().await?;

        tracing::info!(
            key = %plan.key,
            payrolls = plan.records.len(),
            commissions,
            advances,
            transactions = plan.transactions.len(),
            "payroll batch committed"
        );
        Ok(())
    }
}
