use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::header::{LINK, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{Comment, ExpenseProvider, ProviderKind, TodoGroup, TodoList, descriptor};
use crate::config::BasecampConfig;
use crate::error::{PayrollError, Result};
use crate::model::employee::Employee;
use crate::model::expense::ExpenseItem;

const AGENT: &str = "payroll-engine (ops@company.com)";
const DEPOSITED: &str = "Amount has been deposited in your payroll";

/// How a paid item is closed on its board.
#[derive(Debug, PartialEq)]
enum Settlement {
    /// Expense todos are ticked off.
    Complete(String),
    /// Accounting todos stay open for accounting and get a comment.
    Comment(String),
}

#[derive(Deserialize)]
struct RecordRef {
    id: i64,
}

#[derive(Deserialize)]
struct Todo {
    id: i64,
    #[serde(default)]
    title: String,
    bucket: Option<RecordRef>,
    #[serde(default)]
    assignees: Vec<RecordRef>,
}

#[derive(Deserialize)]
struct RawComment {
    #[serde(default)]
    content: String,
    creator: RecordRef,
}

pub struct BasecampProvider {
    client: reqwest::Client,
    cfg: BasecampConfig,
}

impl BasecampProvider {
    pub fn new(cfg: BasecampConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cfg,
        }
    }

    /// GETs every page of a collection, following the `Link` header.
    async fn get_paged<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}{}", self.cfg.api_url.trim_end_matches('/'), path);
        let mut out = Vec::new();
        let mut page = 1u32;
        loop {
            let resp = self
                .client
                .get(&url)
                .query(&[("page", page)])
                .bearer_auth(&self.cfg.token)
                .header(USER_AGENT, AGENT)
                .send()
                .await?
                .error_for_status()
                .map_err(|e| PayrollError::Provider(format!("basecamp {path}: {e}")))?;

            let has_next = resp
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|l| l.contains("rel=\"next\""));

            let mut items: Vec<T> = resp.json().await?;
            out.append(&mut items);
            if !has_next {
                break;
            }
            page += 1;
        }
        Ok(out)
    }

    fn settlement(&self, bucket_id: i64, item_id: i64) -> Settlement {
        if bucket_id == self.cfg.accounting.project {
            Settlement::Comment(format!("/buckets/{bucket_id}/recordings/{item_id}/comments.json"))
        } else {
            Settlement::Complete(format!("/buckets/{bucket_id}/todos/{item_id}/completion.json"))
        }
    }

    async fn post(&self, path: &str, body: Option<serde_json::Value>) -> Result<()> {
        let url = format!("{}{}", self.cfg.api_url.trim_end_matches('/'), path);
        let mut req = self
            .client
            .post(&url)
            .bearer_auth(&self.cfg.token)
            .header(USER_AGENT, AGENT);
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send()
            .await?
            .error_for_status()
            .map_err(|e| PayrollError::Provider(format!("basecamp {path}: {e}")))?;
        Ok(())
    }

    fn to_item(todo: Todo, project: i64) -> ExpenseItem {
        ExpenseItem {
            id: todo.id,
            bucket_id: todo.bucket.map(|b| b.id).unwrap_or(project),
            title: todo.title,
            assignees: todo.assignees.into_iter().map(|a| a.id.to_string()).collect(),
        }
    }

    async fn out_group_items(&self, project: i64, list: &TodoList) -> Result<Vec<ExpenseItem>> {
        let groups = self.get_groups(project, list.id).await?;
        let outs = groups
            .iter()
            .filter(|g| g.title.eq_ignore_ascii_case("out"))
            .map(|g| self.get_all_in_list(project, g.id));
        Ok(try_join_all(outs).await?.into_iter().flatten().collect())
    }
}

#[async_trait]
impl ExpenseProvider for BasecampProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Basecamp
    }

    fn approver_id(&self) -> &str {
        &self.cfg.approver_id
    }

    fn requires_approval(&self) -> bool {
        true
    }

    fn assignee_key(&self, employee: &Employee) -> Option<String> {
        employee.provider_id.map(|id| id.to_string())
    }

    fn extract_amount(&self, raw: &str) -> i64 {
        descriptor::shorthand_amount(raw)
    }

    async fn get_lists(&self, project: i64, todoset: i64) -> Result<Vec<TodoList>> {
        self.get_paged(&format!("/buckets/{project}/todosets/{todoset}/todolists.json"))
            .await
    }

    async fn get_groups(&self, project: i64, list: i64) -> Result<Vec<TodoGroup>> {
        self.get_paged(&format!("/buckets/{project}/todolists/{list}/groups.json"))
            .await
    }

    async fn get_all_in_list(&self, project: i64, container: i64) -> Result<Vec<ExpenseItem>> {
        let todos: Vec<Todo> = self
            .get_paged(&format!("/buckets/{project}/todolists/{container}/todos.json"))
            .await?;
        Ok(todos.into_iter().map(|t| Self::to_item(t, project)).collect())
    }

    async fn get_comments(&self, project: i64, item: i64) -> Result<Vec<Comment>> {
        let raw: Vec<RawComment> = self
            .get_paged(&format!("/buckets/{project}/recordings/{item}/comments.json"))
            .await?;
        Ok(raw
            .into_iter()
            .map(|c| Comment {
                author_id: c.creator.id.to_string(),
                content: c.content,
            })
            .collect())
    }

    async fn complete(&self, bucket_id: i64, item_id: i64) -> Result<()> {
        match self.settlement(bucket_id, item_id) {
            Settlement::Complete(path) => self.post(&path, None).await,
            Settlement::Comment(path) => {
                self.post(&path, Some(serde_json::json!({ "content": DEPOSITED })))
                    .await
            }
        }
    }

    /// Ops expense list plus every group of the team expense list.
    async fn reimbursement_candidates(&self) -> Result<Vec<ExpenseItem>> {
        let ops = self.cfg.ops;
        let team = self.cfg.team;

        let mut items = self.get_all_in_list(ops.project, ops.id).await?;

        let groups = self.get_groups(team.project, team.id).await?;
        let per_group = groups
            .iter()
            .map(|g| self.get_all_in_list(team.project, g.id));
        items.extend(try_join_all(per_group).await?.into_iter().flatten());

        tracing::debug!(count = items.len(), "basecamp reimbursement candidates");
        Ok(items)
    }

    /// Todos in the "out" groups of the accounting board assigned to exactly
    /// one person other than the approver.
    async fn accounting_items(&self) -> Result<Vec<ExpenseItem>> {
        let board = self.cfg.accounting;
        let lists = self.get_lists(board.project, board.id).await?;
        let scans = lists.iter().map(|l| self.out_group_items(board.project, l));
        let items = try_join_all(scans)
            .await?
            .into_iter()
            .flatten()
            .filter(|t| t.assignees.len() == 1 && t.assignees[0] != self.cfg.approver_id)
            .collect();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Board;

    fn provider() -> BasecampProvider {
        BasecampProvider::new(BasecampConfig {
            api_url: "https://3.basecampapi.com/1".into(),
            token: "t".into(),
            approver_id: "99".into(),
            ops: Board { project: 9, id: 10 },
            team: Board { project: 9, id: 11 },
            accounting: Board { project: 15, id: 16 },
        })
    }

    #[test]
    fn expense_todos_are_completed_and_accounting_todos_commented() {
        let p = provider();
        assert_eq!(
            p.settlement(9, 501),
            Settlement::Complete("/buckets/9/todos/501/completion.json".into())
        );
        assert_eq!(
            p.settlement(15, 77),
            Settlement::Comment("/buckets/15/recordings/77/comments.json".into())
        );
    }

    #[test]
    fn todo_json_maps_to_expense_item() {
        let todo: Todo = serde_json::from_value(serde_json::json!({
            "id": 501,
            "title": "Grab to client office | 120k | VND",
            "bucket": {"id": 9, "name": "Woodland"},
            "assignees": [{"id": 2814, "name": "A"}],
            "completed": false
        }))
        .unwrap();
        let item = BasecampProvider::to_item(todo, 1);
        assert_eq!(item.bucket_id, 9);
        assert!(item.is_assigned_to("2814"));
    }

    #[test]
    fn missing_bucket_falls_back_to_project() {
        let todo: Todo =
            serde_json::from_value(serde_json::json!({"id": 7, "title": "x"})).unwrap();
        assert_eq!(BasecampProvider::to_item(todo, 42).bucket_id, 42);
    }
}
