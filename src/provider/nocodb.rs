use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use super::{Comment, ExpenseProvider, ProviderKind, TodoGroup, TodoList, descriptor};
use crate::config::NocoDbConfig;
use crate::error::{PayrollError, Result};
use crate::model::employee::Employee;
use crate::model::expense::ExpenseItem;

/// Container ids handed to [`ExpenseProvider::get_all_in_list`]. Items carry
/// them as their `bucket_id` so settlement knows which table to update.
pub const EXPENSE_TABLE: i64 = 0;
pub const ACCOUNTING_TABLE: i64 = 1;

const PAGE_LIMIT: usize = 100;
const COMPLETED: &str = "completed";

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Float(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f64, D::Error> {
    Ok(match Option::<Number>::deserialize(d)? {
        Some(Number::Float(v)) => v,
        Some(Number::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "Id", alias = "id")]
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    amount: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    requester_team_email: Option<String>,
}

impl Record {
    /// Rebuilds the tracker-style `"title | amount | currency"` title.
    fn into_item(self, table: i64) -> Option<ExpenseItem> {
        let email = self.requester_team_email.filter(|e| !e.is_empty())?;
        Some(ExpenseItem {
            id: self.id,
            bucket_id: table,
            title: format!(
                "{} | {:.0} | {}",
                self.title,
                self.amount,
                self.currency.unwrap_or_default()
            ),
            assignees: vec![email.to_lowercase()],
        })
    }
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "isLastPage", default)]
    is_last_page: bool,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    list: Vec<serde_json::Value>,
    #[serde(rename = "pageInfo")]
    page_info: Option<PageInfo>,
}

impl Page {
    /// A page without paging info is the whole result.
    fn is_last(&self) -> bool {
        self.list.is_empty() || self.page_info.as_ref().is_none_or(|p| p.is_last_page)
    }
}

/// Flat tables of already-approved expenses.
pub struct NocoDbProvider {
    client: reqwest::Client,
    cfg: NocoDbConfig,
}

impl NocoDbProvider {
    pub fn new(cfg: NocoDbConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cfg,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/tables/{}/records",
            self.cfg.base_url.trim_end_matches('/'),
            table
        )
    }

    fn table_id(&self, container: i64) -> Option<&str> {
        match container {
            ACCOUNTING_TABLE => self.cfg.accounting_table_id.as_deref(),
            _ => Some(self.cfg.expense_table_id.as_str()),
        }
    }

    async fn records(&self, container: i64, filter: &str) -> Result<Vec<ExpenseItem>> {
        let Some(table) = self.table_id(container) else {
            return Ok(vec![]);
        };
        let url = self.table_url(table);

        let mut items = Vec::new();
        let mut offset = 0;
        loop {
            let page: Page = self
                .client
                .get(&url)
                .header("xc-token", &self.cfg.token)
                .query(&[("where", filter)])
                .query(&[("limit", PAGE_LIMIT), ("offset", offset)])
                .send()
                .await?
                .error_for_status()
                .map_err(|e| PayrollError::Provider(format!("nocodb table {table}: {e}")))?
                .json()
                .await?;

            let last = page.is_last();
            offset += page.list.len();
            items.extend(page.list.into_iter().filter_map(|raw| parse_record(raw, container)));
            if last {
                break;
            }
        }

        tracing::debug!(table, count = items.len(), "fetched nocodb records");
        Ok(items)
    }
}

fn parse_record(raw: serde_json::Value, container: i64) -> Option<ExpenseItem> {
    match serde_json::from_value::<Record>(raw) {
        Ok(rec) => {
            let id = rec.id;
            let item = rec.into_item(container);
            if item.is_none() {
                tracing::error!(record_id = id, "nocodb record has no requester email");
            }
            item
        }
        Err(e) => {
            tracing::error!(error = %e, "skipping malformed nocodb record");
            None
        }
    }
}

#[async_trait]
impl ExpenseProvider for NocoDbProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::NocoDb
    }

    fn approver_id(&self) -> &str {
        &self.cfg.approver_id
    }

    fn requires_approval(&self) -> bool {
        false
    }

    fn assignee_key(&self, employee: &Employee) -> Option<String> {
        Some(employee.team_email.to_lowercase())
    }

    fn extract_amount(&self, raw: &str) -> i64 {
        descriptor::plain_amount(raw)
    }

    async fn get_lists(&self, _project: i64, todoset: i64) -> Result<Vec<TodoList>> {
        Ok(vec![TodoList {
            id: todoset,
            title: "Expenses".into(),
        }])
    }

    async fn get_groups(&self, _project: i64, _list: i64) -> Result<Vec<TodoGroup>> {
        Ok(vec![TodoGroup {
            id: ACCOUNTING_TABLE,
            title: "out".into(),
        }])
    }

    async fn get_all_in_list(&self, _project: i64, container: i64) -> Result<Vec<ExpenseItem>> {
        match container {
            ACCOUNTING_TABLE => {
                self.records(container, "(task_group,eq,out)~and(status,neq,completed)")
                    .await
            }
            _ => self.records(EXPENSE_TABLE, "(status,eq,approved)").await,
        }
    }

    /// Rows are filtered on `status` server-side, so every item is approved.
    async fn get_comments(&self, _project: i64, _item: i64) -> Result<Vec<Comment>> {
        Ok(vec![Comment {
            author_id: self.cfg.approver_id.clone(),
            content: "approved".into(),
        }])
    }

    async fn complete(&self, bucket_id: i64, item_id: i64) -> Result<()> {
        let Some(table) = self.table_id(bucket_id) else {
            return Err(PayrollError::Provider(format!(
                "nocodb record {item_id} belongs to an unconfigured table"
            )));
        };
        self.client
            .patch(self.table_url(table))
            .header("xc-token", &self.cfg.token)
            .json(&serde_json::json!([{ "Id": item_id, "status": COMPLETED }]))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| PayrollError::Provider(format!("nocodb table {table}: {e}")))?;
        Ok(())
    }

    async fn reimbursement_candidates(&self) -> Result<Vec<ExpenseItem>> {
        self.get_all_in_list(0, EXPENSE_TABLE).await
    }

    async fn accounting_items(&self) -> Result<Vec<ExpenseItem>> {
        let mut items = Vec::new();
        for group in self.get_groups(0, 0).await? {
            items.extend(self.get_all_in_list(0, group.id).await?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::descriptor::Descriptor;

    #[test]
    fn record_rebuilds_descriptor_title() {
        let rec: Record = serde_json::from_value(serde_json::json!({
            "Id": 12,
            "title": "Team lunch",
            "amount": "120000.0",
            "currency": "VND",
            "requester_team_email": "A@company.com"
        }))
        .unwrap();
        let item = rec.into_item(EXPENSE_TABLE).unwrap();
        assert_eq!(item.title, "Team lunch | 120000 | VND");
        assert_eq!(item.bucket_id, EXPENSE_TABLE);
        assert_eq!(item.assignees, vec!["a@company.com".to_string()]);

        let d = Descriptor::parse(&item.title).unwrap();
        assert_eq!(descriptor::plain_amount(d.amount), 120_000);
    }

    #[test]
    fn record_without_requester_is_dropped() {
        let rec: Record =
            serde_json::from_value(serde_json::json!({"id": 3, "title": "x", "amount": 5}))
                .unwrap();
        assert!(rec.into_item(EXPENSE_TABLE).is_none());
    }

    #[test]
    fn missing_currency_yields_vnd_descriptor() {
        let rec: Record = serde_json::from_value(serde_json::json!({
            "Id": 4, "title": "Parking", "amount": 30000, "requester_team_email": "b@company.com"
        }))
        .unwrap();
        let item = rec.into_item(ACCOUNTING_TABLE).unwrap();
        assert_eq!(Descriptor::parse(&item.title).unwrap().currency, "VND");
    }

    fn page(json: serde_json::Value) -> Page {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn paging_stops_on_the_last_page() {
        let more = page(serde_json::json!({
            "list": [{"Id": 1}],
            "pageInfo": {"totalRows": 150, "page": 1, "pageSize": 100, "isLastPage": false}
        }));
        assert!(!more.is_last());

        let last = page(serde_json::json!({
            "list": [{"Id": 101}],
            "pageInfo": {"totalRows": 150, "page": 2, "pageSize": 100, "isLastPage": true}
        }));
        assert!(last.is_last());
    }

    #[test]
    fn empty_or_unpaged_responses_end_paging() {
        assert!(page(serde_json::json!({"list": [], "pageInfo": {"isLastPage": false}})).is_last());
        assert!(page(serde_json::json!({"list": [{"Id": 1}]})).is_last());
    }
}
