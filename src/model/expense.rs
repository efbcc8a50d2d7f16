use serde::{Deserialize, Serialize};

/// An approved expense pulled from the task tracker. The title encodes
/// `"<reason> | <amount> | <currency>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    pub id: i64,
    pub bucket_id: i64,
    pub title: String,
    /// Provider identities of the assignees.
    pub assignees: Vec<String>,
}

impl ExpenseItem {
    pub fn is_assigned_to(&self, identity: &str) -> bool {
        self.assignees.iter().any(|a| a == identity)
    }
}
