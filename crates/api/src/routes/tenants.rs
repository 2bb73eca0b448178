//! Tenant pages and registration
//!
//! `/tenants/:subdomain` is normally reached through the routing middleware's
//! internal rewrite, so the visitor still sees `/` on their tenant host.

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use tenantgate_shared::{NewTenant, TenantRecord};

use crate::{
    directory::register_tenant,
    error::{ApiError, ApiResult},
    routing::ResolvedTenant,
    state::AppState,
};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LandingResponse {
    pub root_domain: String,
    pub tenant: Option<ResolvedTenant>,
}

#[derive(Debug, Serialize)]
pub struct TenantHomeResponse {
    #[serde(flatten)]
    pub tenant: TenantRecord,
    /// The URL path the visitor requested, before any rewrite
    pub visible_path: String,
    pub resolved: Option<ResolvedTenant>,
}

#[derive(Debug, Serialize)]
pub struct TenantListResponse {
    pub tenants: Vec<TenantRecord>,
    pub total: usize,
}

impl From<Vec<TenantRecord>> for TenantListResponse {
    fn from(mut tenants: Vec<TenantRecord>) -> Self {
        tenants.sort_by(|a, b| a.subdomain.cmp(&b.subdomain));
        Self {
            total: tenants.len(),
            tenants,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Platform landing page (no tenant, or an unknown tenant under pass-through)
pub async fn landing(
    State(state): State<AppState>,
    tenant: Option<Extension<ResolvedTenant>>,
) -> Json<LandingResponse> {
    Json(LandingResponse {
        root_domain: state.config.root_domain.clone(),
        tenant: tenant.map(|Extension(t)| t),
    })
}

/// Tenant root page
pub async fn tenant_home(
    State(state): State<AppState>,
    Path(subdomain): Path<String>,
    OriginalUri(original_uri): OriginalUri,
    resolved: Option<Extension<ResolvedTenant>>,
) -> ApiResult<Json<TenantHomeResponse>> {
    let tenant = state
        .find_tenant(&subdomain)
        .await?
        .ok_or_else(|| ApiError::TenantNotFound(subdomain.clone()))?;

    Ok(Json(TenantHomeResponse {
        tenant,
        visible_path: original_uri.path().to_string(),
        resolved: resolved.map(|Extension(t)| t),
    }))
}

/// Admin dashboard listing (only reachable from the platform host)
pub async fn admin_dashboard(State(state): State<AppState>) -> ApiResult<Json<TenantListResponse>> {
    let tenants = state.directory.list_all().await?;
    Ok(Json(tenants.into()))
}

/// List all tenants
pub async fn list_tenants(State(state): State<AppState>) -> ApiResult<Json<TenantListResponse>> {
    let tenants = state.directory.list_all().await?;
    Ok(Json(tenants.into()))
}

/// Register a tenant
pub async fn create_tenant(
    State(state): State<AppState>,
    Json(new_tenant): Json<NewTenant>,
) -> ApiResult<(StatusCode, Json<TenantRecord>)> {
    let record =
        register_tenant(state.directory.as_ref(), &state.icon_validator, new_tenant).await?;
    state.cache.invalidate(&record.subdomain);

    Ok((StatusCode::CREATED, Json(record)))
}
