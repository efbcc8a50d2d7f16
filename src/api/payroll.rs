use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::PayrollError;
use crate::model::money::Vnd;
use crate::model::payroll::{PayrollKey, PayrollRecord};
use crate::payroll::{CommitOutcome, PayrollService};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 2024)]
    pub year: i32,

    #[schema(example = 1)]
    pub month: u32,

    /// Pay day, 1 or 15.
    #[schema(example = 1)]
    pub batch: u32,

    /// Restrict to one employee by team email.
    #[schema(example = "someone@company.com")]
    pub email: Option<String>,
}

impl PayrollQuery {
    fn key(&self) -> Result<PayrollKey, PayrollError> {
        PayrollKey::new(self.month, self.year, self.batch)
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[derive(Serialize, ToSchema)]
pub struct PayrollListResponse {
    /// Sum of the totals, formatted with thousands separators.
    #[schema(example = "39,964,000")]
    pub sub_total: String,

    #[schema(example = 1_300_000)]
    pub bonus_total: i64,

    #[schema(value_type = Vec<Object>)]
    pub payrolls: Vec<PayrollRecord>,
}

impl From<Vec<PayrollRecord>> for PayrollListResponse {
    fn from(payrolls: Vec<PayrollRecord>) -> Self {
        let sub_total: Vnd = payrolls.iter().map(|p| p.total).sum();
        let bonus_total: Vnd = payrolls
            .iter()
            .map(|p| p.bonus_amount + p.commission_amount)
            .sum();
        Self {
            sub_total: sub_total.formatted(),
            bonus_total: bonus_total.amount(),
            payrolls,
        }
    }
}

/// A batch is payable from its batch date on.
fn ensure_started(key: PayrollKey, today: NaiveDate) -> Result<(), PayrollError> {
    if key.batch_date() > today {
        return Err(PayrollError::FutureBatch);
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PayrollListResponse),
        (status = 400, description = "Invalid month, year or batch"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Employee not found"),
        (status = 504, description = "Computation deadline exceeded")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn preview_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_admin()?;
    let key = query.key()?;

    let records = service.preview(key, query.email()).await?;
    tracing::info!(user = %auth.username, %key, count = records.len(), "payroll previewed");

    Ok(HttpResponse::Ok().json(PayrollListResponse::from(records)))
}

#[utoipa::path(
    post,
    path = "/api/payroll/commit",
    request_body = PayrollQuery,
    responses(
        (status = 200, description = "Batch committed, or already committed"),
        (status = 400, description = "Invalid input, future batch or batch not previewed"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Nothing to commit")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn commit_payroll(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    body: web::Json<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_admin()?;
    let key = body.key()?;
    ensure_started(key, Local::now().date_naive())?;

    match service.commit(key, body.email()).await? {
        CommitOutcome::Committed { payrolls, .. } => {
            tracing::info!(user_id = auth.user_id, %key, payrolls, "payroll committed");
        }
        CommitOutcome::AlreadyCommitted => {
            tracing::info!(user_id = auth.user_id, %key, "payroll commit skipped, nothing pending");
        }
    }

    Ok(HttpResponse::Ok().finish())
}

#[utoipa::path(
    post,
    path = "/api/payroll/resend",
    request_body = PayrollQuery,
    responses(
        (status = 200, description = "Payslip mails queued"),
        (status = 400, description = "Batch not previewed"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Nothing committed for this batch")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn resend_payroll_mail(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    body: web::Json<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_payroll_admin()?;
    let key = body.key()?;

    service.resend(key, body.email()).await?;
    tracing::info!(user_id = auth.user_id, %key, "payroll mails re-queued");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Payroll mails queued"
    })))
}
