//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use tenantgate_shared::{sanitize_subdomain, IconValidator, TenantRecord, TenantResult};

use crate::config::Config;
use crate::directory::TenantDirectory;
use crate::routing::{RoutingRules, TenantCache};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<dyn TenantDirectory>,
    pub cache: Arc<TenantCache>,
    pub rules: Arc<RoutingRules>,
    pub icon_validator: IconValidator,
}

impl AppState {
    pub fn new(config: Config, directory: Arc<dyn TenantDirectory>) -> Self {
        let cache = TenantCache::with_ttl(Duration::from_secs(config.tenant_cache_ttl_secs));
        let rules = RoutingRules::from_config(&config);

        Self {
            config: Arc::new(config),
            directory,
            cache: Arc::new(cache),
            rules: Arc::new(rules),
            icon_validator: IconValidator::new(),
        }
    }

    /// Look up a tenant through the TTL cache
    pub async fn find_tenant(&self, subdomain: &str) -> TenantResult<Option<TenantRecord>> {
        let key = sanitize_subdomain(subdomain);
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let record = self.directory.get(&key).await?;
        self.cache.set(&key, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tenantgate_shared::NewTenant;

    use super::*;
    use crate::directory::{register_tenant, MemoryTenantDirectory};

    fn state() -> AppState {
        let directory = MemoryTenantDirectory::with_records([TenantRecord::new("acme", "🚀")]);
        AppState::new(Config::for_root_domain("root.com"), Arc::new(directory))
    }

    #[tokio::test]
    async fn test_find_tenant_caches_by_sanitized_key() {
        let state = state();

        let record = state.find_tenant("ACME").await.unwrap().unwrap();
        assert_eq!(record.icon, "🚀");
        assert!(state.cache.get("acme").is_some());

        assert!(state.find_tenant("ghost").await.unwrap().is_none());
        assert_eq!(state.cache.stats().negative_entries, 1);

        assert!(state.find_tenant("!!!").await.unwrap().is_none());
        assert_eq!(state.cache.stats().total_entries, 2);
    }

    #[tokio::test]
    async fn test_cached_miss_hides_new_tenant_until_invalidated() {
        let state = state();
        assert!(state.find_tenant("initech").await.unwrap().is_none());

        let new_tenant = NewTenant {
            subdomain: "initech".to_string(),
            icon: "🏢".to_string(),
        };
        register_tenant(state.directory.as_ref(), &state.icon_validator, new_tenant)
            .await
            .unwrap();
        assert!(state.find_tenant("initech").await.unwrap().is_none());

        state.cache.invalidate("initech");
        let record = state.find_tenant("initech").await.unwrap().unwrap();
        assert_eq!(record.icon, "🏢");
    }
}
