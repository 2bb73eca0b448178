//! Host-to-Tenant Resolution
//!
//! Derives the tenant addressed by an inbound request from its Host header
//! and full URL. Three deployment contexts are recognised, checked in order:
//! - Local development: acme.localhost:3000 -> acme
//! - Preview deployments: acme---feature-x.vercel.app -> acme
//! - Production subdomains: acme.example.com -> acme
//!
//! Resolution is pure. Unparseable or ambiguous input maps to "no tenant".

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

/// Default suffix of preview deployment hostnames
pub const DEFAULT_PREVIEW_SUFFIX: &str = ".vercel.app";

/// Separator between tenant and branch in preview hostnames
const PREVIEW_SEPARATOR: &str = "---";

/// Result of resolving a request to a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTenant {
    /// The tenant identifier as it appeared in the host (not yet sanitized)
    pub tenant_id: String,
    /// Which rule matched
    pub resolution_type: ResolutionType,
}

/// How the host was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    /// Matched `<tenant>.localhost` in the URL or Host header
    LocalDevelopment,
    /// Matched `<tenant>---<branch><preview suffix>`
    Preview,
    /// Matched `<tenant>.<root domain>`
    Subdomain,
}

/// Stateless tenant resolver for one root domain
#[derive(Debug, Clone)]
pub struct TenantResolver {
    root_domain: String,
    preview_suffix: String,
}

impl TenantResolver {
    /// Create a resolver. Any port on `root_domain` is dropped.
    pub fn new(root_domain: &str, preview_suffix: impl Into<String>) -> Self {
        Self {
            root_domain: strip_port(root_domain).to_string(),
            preview_suffix: preview_suffix.into(),
        }
    }

    /// The root domain with its port removed
    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Resolve a request to its tenant id, if any
    pub fn resolve(&self, host: Option<&str>, url: &str) -> Option<String> {
        self.resolve_detailed(host, url).map(|r| r.tenant_id)
    }

    /// Resolve a request, reporting which rule matched
    pub fn resolve_detailed(&self, host: Option<&str>, url: &str) -> Option<ResolvedTenant> {
        let hostname = strip_port(host.unwrap_or_default());

        // Only the authority decides: a path or query may mention anything
        let local = is_loopback_host(hostname)
            || url_host(url).is_some_and(|h| is_loopback_host(&h));
        if local {
            return resolve_local(hostname, url).map(|tenant_id| ResolvedTenant {
                tenant_id,
                resolution_type: ResolutionType::LocalDevelopment,
            });
        }

        if hostname.contains(PREVIEW_SEPARATOR) && hostname.ends_with(&self.preview_suffix) {
            return hostname
                .split(PREVIEW_SEPARATOR)
                .next()
                .filter(|tenant| !tenant.is_empty())
                .map(|tenant| ResolvedTenant {
                    tenant_id: tenant.to_string(),
                    resolution_type: ResolutionType::Preview,
                });
        }

        self.resolve_subdomain(hostname).map(|tenant_id| ResolvedTenant {
            tenant_id,
            resolution_type: ResolutionType::Subdomain,
        })
    }

    fn resolve_subdomain(&self, hostname: &str) -> Option<String> {
        if is_root_host(hostname, &self.root_domain) {
            return None;
        }

        let suffix = format!(".{}", self.root_domain);
        hostname
            .strip_suffix(&suffix)
            .filter(|tenant| !tenant.is_empty())
            .map(str::to_string)
    }
}

/// Normalize a host header value for resolution (lowercase, trimmed)
pub fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

/// Remove a trailing `:port` if present
fn strip_port(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// Check if this host is the bare platform (root or www.root)
fn is_root_host(hostname: &str, root_domain: &str) -> bool {
    hostname == root_domain || hostname.strip_prefix("www.") == Some(root_domain)
}

/// `localhost`, any `*.localhost` name, or the IPv4 loopback address
fn is_loopback_host(hostname: &str) -> bool {
    hostname == "localhost" || hostname.ends_with(".localhost") || hostname == "127.0.0.1"
}

/// Host part of an absolute URL, lowercased by the parser
fn url_host(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

fn local_url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^https?://([^./:?#@]+)\.localhost(?:[:/?#]|$)").ok())
        .as_ref()
}

/// Local development: URL first, then the Host header. Never a partial match.
fn resolve_local(hostname: &str, url: &str) -> Option<String> {
    let from_url = local_url_pattern()
        .and_then(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    if from_url.is_some() {
        return from_url;
    }

    if hostname.contains(".localhost") {
        return hostname
            .split('.')
            .next()
            .filter(|label| !label.is_empty())
            .map(str::to_string);
    }

    None
}
