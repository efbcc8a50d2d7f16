use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};

use crate::payroll::FixedPayees;
use crate::provider::ProviderKind;

/// A Basecamp todoset addressed by project (bucket) and id.
#[derive(Debug, Clone, Copy)]
pub struct Board {
    pub project: i64,
    pub id: i64,
}

#[derive(Debug, Clone)]
pub struct BasecampConfig {
    pub api_url: String,
    pub token: String,
    pub approver_id: String,
    /// Operations todolist holding reimbursement requests.
    pub ops: Board,
    /// Team boards whose groups also hold reimbursement requests.
    pub team: Board,
    pub accounting: Board,
}

#[derive(Debug, Clone)]
pub struct NocoDbConfig {
    pub base_url: String,
    pub token: String,
    pub approver_id: String,
    pub expense_table_id: String,
    pub accounting_table_id: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ExpenseSource {
    Basecamp(BasecampConfig),
    NocoDb(NocoDbConfig),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub rate_protected_per_min: u32,

    pub production: bool,
    pub currency_api_key: String,
    pub expenses: ExpenseSource,

    pub fixed_payees: FixedPayees,
    pub mail_allowlist: Vec<String>,
    pub mail_relay_url: Option<String>,
    pub mail_tick: Duration,
    pub deadline: Duration,
    pub ledger_organization: String,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} is not valid: {raw}")),
        Err(_) => Ok(default),
    }
}

fn email_list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn board(prefix: &str) -> anyhow::Result<Board> {
    Ok(Board {
        project: required(&format!("{prefix}_PROJECT"))?.parse()?,
        id: required(&format!("{prefix}_ID"))?.parse()?,
    })
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let approver_id = required("EXPENSE_APPROVER_ID")?;
        let kind: ProviderKind = env::var("EXPENSE_PROVIDER")
            .unwrap_or_else(|_| "basecamp".to_string())
            .parse()
            .map_err(|_| anyhow!("EXPENSE_PROVIDER must be basecamp or nocodb"))?;

        let expenses = match kind {
            ProviderKind::Basecamp => ExpenseSource::Basecamp(BasecampConfig {
                api_url: required("BASECAMP_API_URL")?,
                token: required("BASECAMP_TOKEN")?,
                approver_id,
                ops: board("BASECAMP_OPS")?,
                team: board("BASECAMP_TEAM")?,
                accounting: board("BASECAMP_ACCOUNTING")?,
            }),
            ProviderKind::NocoDb => ExpenseSource::NocoDb(NocoDbConfig {
                base_url: required("NOCODB_BASE_URL")?,
                token: required("NOCODB_TOKEN")?,
                approver_id,
                expense_table_id: required("NOCODB_EXPENSE_TABLE_ID")?,
                accounting_table_id: env::var("NOCODB_ACCOUNTING_TABLE_ID").ok(),
            }),
        };

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            production: env::var("APP_ENV").is_ok_and(|v| v == "prod" || v == "production"),
            currency_api_key: env::var("CURRENCY_API_KEY").unwrap_or_default(),
            expenses,

            fixed_payees: FixedPayees {
                first: email_list("PAYROLL_FIXED_BATCH_1"),
                second: email_list("PAYROLL_FIXED_BATCH_15"),
            },
            mail_allowlist: email_list("PAYROLL_MAIL_ALLOWLIST"),
            mail_relay_url: env::var("MAIL_RELAY_URL").ok().filter(|s| !s.is_empty()),
            mail_tick: Duration::from_millis(or_default("MAIL_TICK_MILLIS", 1000)?),
            deadline: Duration::from_secs(or_default("PAYROLL_DEADLINE_SECS", 120)?),
            ledger_organization: env::var("LEDGER_ORGANIZATION")
                .unwrap_or_else(|_| "Head Office".to_string()),
        })
    }
}
