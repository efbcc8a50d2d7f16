use crate::api::payroll::{PayrollListResponse, PayrollQuery};
use crate::model::employee::{BaseSalary, Employee, WorkingStatus};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Settlement API",
        version = "1.0.0",
        description = r#"
## Payroll Settlement

Computes what each employee is owed for a pay cycle and settles it.

### Pay cycle
A cycle is identified by **year**, **month** and **batch** (pay day 1 or 15).

- **Preview** computes salaries (prorated for joins and leaves), bonuses,
  commissions and approved reimbursements, minus outstanding salary advances,
  and snapshots the result.
- **Commit** pays the previewed snapshot exactly once: payroll rows are stored,
  commissions and advances are settled, ledger entries are written and payslip
  mails are queued.
- **Resend** queues the payslip mails of a committed cycle again.

### Security
All endpoints require a **JWT Bearer** access token of a payroll admin.
"#,
    ),
    paths(
        crate::api::payroll::preview_payroll,
        crate::api::payroll::commit_payroll,
        crate::api::payroll::resend_payroll_mail,
    ),
    components(schemas(
        PayrollQuery,
        PayrollListResponse,
        Employee,
        BaseSalary,
        WorkingStatus
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payroll", description = "Payroll preview, commit and payslip mails"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
