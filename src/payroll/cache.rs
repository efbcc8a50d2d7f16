use std::sync::Arc;

use crate::error::Result;
use crate::model::payroll::{PayrollKey, PayrollRecord};
use crate::store::PayrollStore;

/// Uncommitted result of the last preview of a batch.
#[derive(Clone)]
pub struct PayrollCache {
    store: Arc<dyn PayrollStore>,
}

impl PayrollCache {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    pub async fn snapshot(&self, key: PayrollKey, records: &[PayrollRecord]) -> Result<()> {
        let payload = serde_json::to_string(records)?;
        self.store.save_snapshot(key, payload).await?;
        tracing::debug!(%key, count = records.len(), "payroll snapshot saved");
        Ok(())
    }

    pub async fn get_snapshot(&self, key: PayrollKey) -> Result<Option<Vec<PayrollRecord>>> {
        match self.store.load_snapshot(key).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::testutil::record;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn snapshot_is_overwritten() {
        let cache = PayrollCache::new(Arc::new(MemoryStore::default()));
        let key = PayrollKey::new(1, 2024, 1).unwrap();
        assert!(cache.get_snapshot(key).await.unwrap().is_none());

        cache.snapshot(key, &[record(1, "a@company.com")]).await.unwrap();
        cache
            .snapshot(key, &[record(1, "a@company.com"), record(2, "b@company.com")])
            .await
            .unwrap();

        let got = cache.get_snapshot(key).await.unwrap().unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[1].employee.team_email, "b@company.com");
    }

    #[tokio::test]
    async fn snapshots_are_keyed_by_batch() {
        let cache = PayrollCache::new(Arc::new(MemoryStore::default()));
        let first = PayrollKey::new(1, 2024, 1).unwrap();
        let second = PayrollKey::new(1, 2024, 15).unwrap();
        cache.snapshot(first, &[record(1, "a@company.com")]).await.unwrap();
        assert!(cache.get_snapshot(second).await.unwrap().is_none());
    }
}
