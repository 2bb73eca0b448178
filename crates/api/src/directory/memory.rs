//! In-process tenant directory for development and tests

use std::collections::BTreeMap;

use async_trait::async_trait;
use tenantgate_shared::{sanitize_subdomain, TenantError, TenantRecord, TenantResult};
use tokio::sync::RwLock;

use super::TenantDirectory;

#[derive(Default)]
pub struct MemoryTenantDirectory {
    records: RwLock<BTreeMap<String, TenantRecord>>,
}

impl MemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory, keyed by each record's sanitized subdomain
    pub fn with_records(records: impl IntoIterator<Item = TenantRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| (sanitize_subdomain(&r.subdomain), r))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl TenantDirectory for MemoryTenantDirectory {
    async fn get(&self, subdomain: &str) -> TenantResult<Option<TenantRecord>> {
        let key = sanitize_subdomain(subdomain);
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn list_all(&self) -> TenantResult<Vec<TenantRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn insert(&self, record: TenantRecord) -> TenantResult<()> {
        let key = sanitize_subdomain(&record.subdomain);
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(TenantError::AlreadyExists(key));
        }
        records.insert(key, record);
        Ok(())
    }

    async fn ping(&self) -> TenantResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
