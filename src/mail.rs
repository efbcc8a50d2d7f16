use async_trait::async_trait;
use serde_json::json;

use crate::error::{PayrollError, Result};
use crate::model::payroll::PayrollRecord;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_payroll_paid_mail(&self, record: &PayrollRecord) -> Result<()>;
}

/// Hands the payslip to an HTTP mail relay which owns rendering and delivery.
pub struct RelayMailer {
    client: reqwest::Client,
    url: String,
}

impl RelayMailer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send_payroll_paid_mail(&self, record: &PayrollRecord) -> Result<()> {
        let body = json!({
            "template": "payroll-paid",
            "to": record.employee.team_email,
            "subject": format!("Payroll for {} has been paid", record.period_label()),
            "data": {
                "full_name": record.employee.full_name,
                "total": record.total.formatted(),
                "currency": "VND",
                "payroll": record,
            }
        });

        self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PayrollError::Notification(e.to_string()))?;
        Ok(())
    }
}

/// Used when no relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_payroll_paid_mail(&self, record: &PayrollRecord) -> Result<()> {
        tracing::info!(
            to = %record.employee.team_email,
            total = %record.total.formatted(),
            "payroll paid mail (relay disabled)"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod fake {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<PayrollRecord>>,
        pub fail_for: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_payroll_paid_mail(&self, record: &PayrollRecord) -> Result<()> {
            if self.fail_for.as_deref() == Some(record.employee.team_email.as_str()) {
                return Err(PayrollError::Notification("mailbox full".into()));
            }
            self.sent.lock().unwrap().push(record.clone());
            Ok(())
        }
    }
}
