use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::mail::Mailer;
use crate::model::payroll::PayrollRecord;

#[derive(Debug)]
pub enum MailJob {
    Send(Box<PayrollRecord>),
    /// No more jobs for this batch.
    Done,
}

/// Who receives payslips: everyone in production, otherwise only the
/// allow-list.
#[derive(Debug, Clone, Default)]
pub struct MailPolicy {
    pub production: bool,
    pub allowlist: Vec<String>,
}

impl MailPolicy {
    pub fn allows(&self, email: &str) -> bool {
        self.production || self.allowlist.iter().any(|a| a.eq_ignore_ascii_case(email))
    }
}

/// Drains payslip mails one per tick so the relay isn't flooded.
#[derive(Clone)]
pub struct MailDispatcher {
    mailer: Arc<dyn Mailer>,
    tick: Duration,
}

impl MailDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, tick: Duration) -> Self {
        Self { mailer, tick }
    }

    /// Queues one mail per record and returns the drain task, which resolves
    /// to the number of mails delivered.
    pub async fn dispatch(&self, records: Vec<PayrollRecord>) -> JoinHandle<usize> {
        let (tx, rx) = mpsc::channel(records.len() + 1);
        let handle = tokio::spawn(drain(rx, self.mailer.clone(), self.tick));

        for record in records {
            if tx.send(MailJob::Send(Box::new(record))).await.is_err() {
                tracing::error!("mail queue closed early");
                return handle;
            }
        }
        if tx.send(MailJob::Done).await.is_err() {
            tracing::error!("mail queue closed before the done marker");
        }
        handle
    }
}

async fn drain(mut rx: mpsc::Receiver<MailJob>, mailer: Arc<dyn Mailer>, tick: Duration) -> usize {
    let mut ticker = tokio::time::interval(tick);
    let mut sent = 0;
    loop {
        ticker.tick().await;
        match rx.recv().await {
            Some(MailJob::Send(record)) => match mailer.send_payroll_paid_mail(&record).await {
                Ok(()) => sent += 1,
                Err(e) => tracing::error!(
                    error = %e,
                    employee = %record.employee.team_email,
                    "failed to send payroll mail"
                ),
            },
            Some(MailJob::Done) | None => break,
        }
    }
    tracing::info!(sent, "payroll mail queue drained");
    sent
}
