use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::payroll::PayrollKey;

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("invalid month {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error("invalid year {0}")]
    InvalidYear(i32),

    #[error("invalid batch day {0}, expected 1 or 15")]
    InvalidBatch(u32),

    #[error("cannot commit payroll for a batch that has not started yet")]
    FutureBatch,

    #[error("payroll {0} has not been snapshotted, preview it first")]
    NotSnapshotted(PayrollKey),

    #[error("no payroll records found for {0}")]
    NotFound(PayrollKey),

    #[error("employee {0} not found")]
    EmployeeNotFound(String),

    #[error("currency conversion failed: {0}")]
    Currency(String),

    #[error("expense provider request failed: {0}")]
    Provider(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("payroll computation exceeded the {0}s deadline")]
    Deadline(u64),

    #[error("payroll task failed: {0}")]
    Task(String),

    #[error("cannot read payroll snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, PayrollError>;

impl From<reqwest::Error> for PayrollError {
    fn from(e: reqwest::Error) -> Self {
        PayrollError::Provider(e.to_string())
    }
}

impl ResponseError for PayrollError {
    fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::InvalidMonth(_)
            | PayrollError::InvalidYear(_)
            | PayrollError::InvalidBatch(_)
            | PayrollError::FutureBatch
            | PayrollError::NotSnapshotted(_) => StatusCode::BAD_REQUEST,
            PayrollError::NotFound(_) | PayrollError::EmployeeNotFound(_) => StatusCode::NOT_FOUND,
            PayrollError::Provider(_) => StatusCode::BAD_GATEWAY,
            PayrollError::Deadline(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "payroll request failed");
            // internals stay in the log
            if !matches!(self, PayrollError::Currency(_) | PayrollError::Deadline(_)) {
                return HttpResponse::build(status).json(json!({
                    "message": "Internal Server Error"
                }));
            }
        }
        HttpResponse::build(status).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::Batch;

    #[test]
    fn validation_errors_are_client_errors() {
        assert_eq!(
            PayrollError::InvalidBatch(7).status_code(),
            StatusCode::BAD_REQUEST
        );
        let key = PayrollKey::new(1, 2024, Batch::First.day()).unwrap();
        assert_eq!(
            PayrollError::NotSnapshotted(key).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PayrollError::NotFound(key).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_failures_map_to_gateway_codes() {
        assert_eq!(
            PayrollError::Provider("502 from tracker".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(PayrollError::Deadline(30).status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
