//! Tenant routing middleware
//!
//! Runs once per inbound request, before route matching, and turns the
//! resolved tenant into one of four outcomes: pass through, redirect to `/`,
//! rewrite to the tenant root, or 404 for an unregistered tenant.

use std::sync::OnceLock;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header::HOST, uri::PathAndQuery, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;

use super::host_resolver::{normalize_host, ResolvedTenant, TenantResolver};
use crate::config::{Config, UnknownTenantPolicy};
use crate::error::ApiError;
use crate::state::AppState;

/// Path prefix of the administrative area
pub const ADMIN_PREFIX: &str = "/admin";

/// Path prefix of tenant-scoped pages
pub const TENANT_PATH_PREFIX: &str = "/tenants";

/// Internal path serving a tenant's root page
pub fn tenant_root_path(subdomain: &str) -> String {
    format!("{TENANT_PATH_PREFIX}/{subdomain}")
}

/// What an inbound request addresses, before any directory lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// Static asset, API or framework path; never intercepted
    Excluded,
    /// No tenant in the host
    Platform,
    /// A tenant host asking for the administrative area
    TenantAdmin(ResolvedTenant),
    /// A tenant host asking for `/`
    TenantRoot(ResolvedTenant),
    /// Any other tenant path, assumed already tenant-aware
    TenantPage(ResolvedTenant),
}

impl RequestTarget {
    pub fn tenant(&self) -> Option<&ResolvedTenant> {
        match self {
            RequestTarget::TenantAdmin(t)
            | RequestTarget::TenantRoot(t)
            | RequestTarget::TenantPage(t) => Some(t),
            RequestTarget::Excluded | RequestTarget::Platform => None,
        }
    }
}

/// The router's decision for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    PassThrough,
    Redirect { location: String },
    Rewrite { path: String },
    NotFound,
}

/// Stateless routing rules derived from configuration
#[derive(Debug, Clone)]
pub struct RoutingRules {
    resolver: TenantResolver,
    excluded_prefixes: Vec<String>,
    unknown_tenant_policy: UnknownTenantPolicy,
    platform_url: String,
}

fn file_segment_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[\w-]+\.\w+$").ok())
        .as_ref()
}

impl RoutingRules {
    pub fn new(
        resolver: TenantResolver,
        excluded_prefixes: Vec<String>,
        unknown_tenant_policy: UnknownTenantPolicy,
    ) -> Self {
        // Protocol-relative, keeping any port configured on the root domain
        let platform_url = format!("//{}/", resolver.root_domain());
        Self {
            resolver,
            excluded_prefixes,
            unknown_tenant_policy,
            platform_url,
        }
    }

    /// Where unregistered tenants are sent under `RedirectToPlatform`
    pub fn with_platform_url(mut self, platform_url: impl Into<String>) -> Self {
        self.platform_url = platform_url.into();
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TenantResolver::new(&config.root_domain, config.preview_suffix.clone()),
            config.excluded_prefixes.clone(),
            config.unknown_tenant_policy,
        )
        .with_platform_url(format!("//{}/", config.root_domain))
    }

    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// API and framework prefixes, plus any path whose last segment looks like a file
    pub fn is_excluded(&self, path: &str) -> bool {
        let under_prefix = self.excluded_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        });
        if under_prefix {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        file_segment_pattern().is_some_and(|pattern| pattern.is_match(last_segment))
    }

    /// Classify a request from its host, full URL and path
    pub fn classify(&self, host: Option<&str>, url: &str, path: &str) -> RequestTarget {
        if self.is_excluded(path) {
            return RequestTarget::Excluded;
        }

        match self.resolver.resolve_detailed(host, url) {
            None => RequestTarget::Platform,
            Some(tenant) if path.starts_with(ADMIN_PREFIX) => RequestTarget::TenantAdmin(tenant),
            Some(tenant) if path == "/" => RequestTarget::TenantRoot(tenant),
            Some(tenant) => RequestTarget::TenantPage(tenant),
        }
    }

    /// Decide the outcome once the directory lookup (if any) is known.
    /// `registered` is the canonical subdomain when the tenant exists.
    pub fn decide(&self, target: &RequestTarget, registered: Option<&str>) -> RouteDecision {
        match target {
            RequestTarget::Excluded | RequestTarget::Platform | RequestTarget::TenantPage(_) => {
                RouteDecision::PassThrough
            }
            RequestTarget::TenantAdmin(_) => RouteDecision::Redirect {
                location: "/".to_string(),
            },
            RequestTarget::TenantRoot(_) => match registered {
                Some(subdomain) => RouteDecision::Rewrite {
                    path: tenant_root_path(subdomain),
                },
                None => match self.unknown_tenant_policy {
                    UnknownTenantPolicy::NotFound => RouteDecision::NotFound,
                    UnknownTenantPolicy::PassThrough => RouteDecision::PassThrough,
                    UnknownTenantPolicy::RedirectToPlatform => RouteDecision::Redirect {
                        location: self.platform_url.clone(),
                    },
                },
            },
        }
    }
}

/// Host from the Host header, or the URI authority (HTTP/2)
fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .map(normalize_host)
        .filter(|h| !h.is_empty())
}

/// Full request URL as the client addressed it
fn request_url(request: &Request, host: Option<&str>) -> String {
    let uri = request.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }

    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    format!("{scheme}://{}{path_and_query}", host.unwrap_or_default())
}

fn rewrite_uri(uri: &Uri, path: &str) -> Result<Uri, ApiError> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path).map_err(|_| ApiError::Internal)?);
    Uri::from_parts(parts).map_err(|_| ApiError::Internal)
}

/// Middleware applying [`RoutingRules`] to every request
pub async fn tenant_routing_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let host = request_host(&request);
    let url = request_url(&request, host.as_deref());

    let target = state.rules.classify(host.as_deref(), &url, &path);

    let decision = match &target {
        RequestTarget::TenantRoot(tenant) => match state.find_tenant(&tenant.tenant_id).await {
            Ok(record) => state
                .rules
                .decide(&target, record.as_ref().map(|r| r.subdomain.as_str())),
            Err(err) => return ApiError::from(err).into_response(),
        },
        _ => state.rules.decide(&target, None),
    };

    if let Some(tenant) = target.tenant() {
        tracing::debug!(
            tenant = %tenant.tenant_id,
            resolution = ?tenant.resolution_type,
            path = %path,
            decision = ?decision,
            "Tenant request routed"
        );
        request.extensions_mut().insert(tenant.clone());
    }

    match decision {
        RouteDecision::PassThrough => next.run(request).await,
        RouteDecision::Redirect { location } => Redirect::temporary(&location).into_response(),
        RouteDecision::NotFound => {
            let tenant = target
                .tenant()
                .map(|t| t.tenant_id.clone())
                .unwrap_or_default();
            ApiError::TenantNotFound(tenant).into_response()
        }
        RouteDecision::Rewrite { path } => match rewrite_uri(request.uri(), &path) {
            Ok(uri) => {
                // Handlers report the visible URL, not the rewritten one
                if request.extensions().get::<OriginalUri>().is_none() {
                    let original = OriginalUri(request.uri().clone());
                    request.extensions_mut().insert(original);
                }
                *request.uri_mut() = uri;
                next.run(request).await
            }
            Err(err) => err.into_response(),
        },
    }
}

/// Keeps platform-only routes, such as tenant listing and registration,
/// off tenant hosts. These paths are excluded from tenant routing, so the
/// host has to be checked here.
pub async fn platform_only_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let host = request_host(&request);
    let url = request_url(&request, host.as_deref());

    if let Some(tenant) = state.rules.resolver().resolve_detailed(host.as_deref(), &url) {
        tracing::warn!(
            tenant = %tenant.tenant_id,
            method = %request.method(),
            path = %request.uri().path(),
            "Platform route requested from tenant host"
        );
        return ApiError::Forbidden("not available on tenant hosts".to_string()).into_response();
    }

    next.run(request).await
}
