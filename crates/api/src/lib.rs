//! TenantGate API Library
//!
//! This crate contains the multi-tenant HTTP server: host-based tenant
//! resolution, the tenant routing middleware and the tenant directory.

pub mod config;
pub mod directory;
pub mod error;
pub mod routes;
pub mod routing;
pub mod security;
pub mod state;

pub use config::{Config, UnknownTenantPolicy};
pub use directory::{MemoryTenantDirectory, RedisTenantDirectory, TenantDirectory};
pub use error::{ApiError, ApiResult};
pub use routes::build_app;
pub use routing::{ResolvedTenant, TenantCache, TenantResolver};
pub use state::AppState;
