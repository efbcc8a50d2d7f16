use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WorkingStatus {
    OnBoarding,
    Probation,
    FullTime,
    Contractor,
    Left,
}

/// Salary configuration of an employee. Amounts are in `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BaseSalary {
    #[schema(example = 20000000)]
    pub personal_account_amount: i64,

    #[schema(example = 0)]
    pub company_account_amount: i64,

    #[schema(example = "VND", nullable = true)]
    pub currency: Option<String>,

    #[schema(example = 15)]
    pub batch: u32,

    #[schema(example = "Payroll")]
    pub category: String,

    #[schema(example = "SE")]
    pub salary_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "full_name": "Nguyen Van A",
        "team_email": "a@company.com",
        "working_status": "full-time",
        "joined_date": "2019-05-01",
        "left_date": null,
        "provider_id": 2814,
        "base_salary": {
            "personal_account_amount": 20000000,
            "company_account_amount": 0,
            "currency": "VND",
            "batch": 15,
            "category": "Payroll",
            "salary_type": "SE"
        }
    })
)]
pub struct Employee {
    pub id: u64,
    pub full_name: String,
    pub team_email: String,
    pub working_status: WorkingStatus,

    #[schema(value_type = String, format = "date")]
    pub joined_date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date")]
    pub left_date: Option<NaiveDate>,

    /// Identity used by the task tracker to name assignees.
    pub provider_id: Option<i64>,

    pub base_salary: Option<BaseSalary>,
}

impl Employee {
    pub fn salary_currency(&self) -> Option<&str> {
        self.base_salary
            .as_ref()
            .and_then(|s| s.currency.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn salary_batch(&self) -> Option<u32> {
        self.base_salary.as_ref().map(|s| s.batch)
    }
}

/// Flat row of `employees LEFT JOIN base_salaries`.
#[derive(Debug, sqlx::FromRow)]
pub struct EmployeeRow {
    pub id: u64,
    pub full_name: String,
    pub team_email: String,
    pub working_status: String,
    pub joined_date: NaiveDate,
    pub left_date: Option<NaiveDate>,
    pub provider_id: Option<i64>,
    pub personal_account_amount: Option<i64>,
    pub company_account_amount: Option<i64>,
    pub currency: Option<String>,
    pub batch: Option<u32>,
    pub category: Option<String>,
    pub salary_type: Option<String>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        let working_status = row.working_status.parse().unwrap_or_else(|_| {
            tracing::warn!(employee_id = row.id, status = %row.working_status, "unknown working status");
            WorkingStatus::FullTime
        });

        let base_salary = row.batch.map(|batch| BaseSalary {
            personal_account_amount: row.personal_account_amount.unwrap_or_default(),
            company_account_amount: row.company_account_amount.unwrap_or_default(),
            currency: row.currency,
            batch,
            category: row.category.unwrap_or_default(),
            salary_type: row.salary_type.unwrap_or_default(),
        });

        Employee {
            id: row.id,
            full_name: row.full_name,
            team_email: row.team_email,
            working_status,
            joined_date: row.joined_date,
            left_date: row.left_date,
            provider_id: row.provider_id,
            base_salary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_status_parses_kebab_case() {
        assert_eq!("on-boarding".parse::<WorkingStatus>().unwrap(), WorkingStatus::OnBoarding);
        assert_eq!(WorkingStatus::FullTime.to_string(), "full-time");
    }

    #[test]
    fn row_without_salary_has_no_currency() {
        let row = EmployeeRow {
            id: 7,
            full_name: "Tran B".into(),
            team_email: "b@company.com".into(),
            working_status: "contractor".into(),
            joined_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            left_date: None,
            provider_id: None,
            personal_account_amount: None,
            company_account_amount: None,
            currency: None,
            batch: None,
            category: None,
            salary_type: None,
        };
        let employee = Employee::from(row);
        assert!(employee.base_salary.is_none());
        assert_eq!(employee.salary_currency(), None);
    }
}
