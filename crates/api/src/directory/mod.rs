//! Tenant Directory
//!
//! Key-value mapping from sanitized subdomain to [`TenantRecord`]. Every
//! backend sanitizes the subdomain before touching the store, so callers may
//! pass identifiers straight from host parsing or user input.

mod memory;
mod redis_store;

use async_trait::async_trait;
use tenantgate_shared::{
    validate_new_subdomain, IconValidator, NewTenant, TenantRecord, TenantResult,
};

pub use memory::MemoryTenantDirectory;
pub use redis_store::RedisTenantDirectory;

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Look up a tenant. The subdomain is sanitized first.
    async fn get(&self, subdomain: &str) -> TenantResult<Option<TenantRecord>>;

    /// Every registered tenant, enumerated by key prefix
    async fn list_all(&self) -> TenantResult<Vec<TenantRecord>>;

    /// Store a new record unless its subdomain is already taken
    /// (`TenantError::AlreadyExists`)
    async fn insert(&self, record: TenantRecord) -> TenantResult<()>;

    /// Check that the backing store is reachable
    async fn ping(&self) -> TenantResult<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Validate a registration request and store it
pub async fn register_tenant(
    directory: &dyn TenantDirectory,
    validator: &IconValidator,
    new_tenant: NewTenant,
) -> TenantResult<TenantRecord> {
    let subdomain = validate_new_subdomain(&new_tenant.subdomain)?;
    let icon = new_tenant.icon.trim();
    validator.validate(icon)?;

    let record = TenantRecord::new(subdomain, icon);
    directory.insert(record.clone()).await?;

    tracing::info!(
        subdomain = %record.subdomain,
        backend = directory.backend(),
        "Tenant registered"
    );

    Ok(record)
}
