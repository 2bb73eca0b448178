//! Host-based tenant routing
//!
//! This module resolves incoming Host headers to tenants and routes
//! tenant requests, enabling tenant-specific URLs like:
//! - Production subdomains: acme.example.com
//! - Preview deployments: acme---branch.vercel.app
//! - Local development: acme.localhost:3000

mod cache;
mod host_resolver;
mod middleware;

pub use cache::{CacheStats, TenantCache, DEFAULT_CACHE_TTL};
pub use host_resolver::{
    normalize_host, ResolutionType, ResolvedTenant, TenantResolver, DEFAULT_PREVIEW_SUFFIX,
};
pub use middleware::{
    platform_only_middleware, tenant_root_path, tenant_routing_middleware, RequestTarget,
    RouteDecision, RoutingRules, ADMIN_PREFIX, TENANT_PATH_PREFIX,
};
