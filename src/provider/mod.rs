//! Task trackers that hold expense and accounting items.

pub mod basecamp;
pub mod descriptor;
pub mod nocodb;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::error::Result;
use crate::model::employee::Employee;
use crate::model::expense::ExpenseItem;
use crate::model::payroll::Batch;

pub use basecamp::BasecampProvider;
pub use nocodb::NocoDbProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    Basecamp,
    NocoDb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoList {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoGroup {
    pub id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub author_id: String,
    pub content: String,
}

/// Items whose title matches `needle` are only paid out in `batch`.
pub struct BatchRule {
    pub needle: &'static str,
    pub batch: Batch,
}

pub const ACCOUNTING_BATCH_RULES: &[BatchRule] = &[
    BatchRule { needle: "Tiền điện", batch: Batch::First },
    BatchRule { needle: "Office Rental", batch: Batch::Second },
    BatchRule { needle: "CBRE", batch: Batch::Second },
];

pub fn allowed_in_batch(title: &str, batch: Batch) -> bool {
    ACCOUNTING_BATCH_RULES
        .iter()
        .filter(|rule| title.contains(rule.needle))
        .all(|rule| rule.batch == batch)
}

/// An item counts as approved once the approver leaves a comment containing
/// "approve", in any case.
pub fn is_approved(comments: &[Comment], approver_id: &str) -> bool {
    comments
        .iter()
        .any(|c| c.author_id == approver_id && c.content.to_lowercase().contains("approve"))
}

#[async_trait]
pub trait ExpenseProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Identity of the comment author whose approval releases an expense.
    fn approver_id(&self) -> &str;

    /// Whether reimbursement candidates need an approval comment.
    fn requires_approval(&self) -> bool;

    /// How this tracker names `employee` in assignee lists.
    fn assignee_key(&self, employee: &Employee) -> Option<String>;

    /// Amount from the middle segment of an expense title.
    fn extract_amount(&self, raw: &str) -> i64;

    async fn get_lists(&self, project: i64, todoset: i64) -> Result<Vec<TodoList>>;

    async fn get_groups(&self, project: i64, list: i64) -> Result<Vec<TodoGroup>>;

    async fn get_all_in_list(&self, project: i64, container: i64) -> Result<Vec<ExpenseItem>>;

    async fn get_comments(&self, project: i64, item: i64) -> Result<Vec<Comment>>;

    /// Marks a paid item as settled so it is not picked up again.
    async fn complete(&self, bucket_id: i64, item_id: i64) -> Result<()>;

    /// Employee-submitted expenses, before approval filtering.
    async fn reimbursement_candidates(&self) -> Result<Vec<ExpenseItem>>;

    /// Company bills paid through an employee, before batch filtering.
    async fn accounting_items(&self) -> Result<Vec<ExpenseItem>>;

    /// Everything payable in `batch`: approved reimbursements plus the
    /// accounting items the batch rules allow.
    async fn approved_expenses(&self, batch: Batch) -> Result<Vec<ExpenseItem>> {
        let candidates = self.reimbursement_candidates().await?;

        let mut approved = if self.requires_approval() {
            let checks = candidates.iter().map(|item| async move {
                let comments = self.get_comments(item.bucket_id, item.id).await?;
                Ok::<_, crate::error::PayrollError>(is_approved(&comments, self.approver_id()))
            });
            let verdicts = try_join_all(checks).await?;
            candidates
                .into_iter()
                .zip(verdicts)
                .filter_map(|(item, ok)| ok.then_some(item))
                .collect()
        } else {
            candidates
        };

        let accounting = self.accounting_items().await?;
        approved.extend(
            accounting
                .into_iter()
                .filter(|item| allowed_in_batch(&item.title, batch)),
        );

        tracing::info!(
            provider = %self.kind(),
            batch = batch.day(),
            count = approved.len(),
            "collected approved expenses"
        );
        Ok(approved)
    }
}
