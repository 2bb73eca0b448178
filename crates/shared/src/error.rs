//! Error types for TenantGate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Invalid subdomain: {0}")]
    InvalidSubdomain(String),

    #[error("Reserved subdomain: {0}")]
    ReservedSubdomain(String),

    #[error("Invalid icon: {0}")]
    InvalidIcon(String),

    #[error("Tenant already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type TenantResult<T> = Result<T, TenantError>;
