//! Application configuration

use std::env;
use std::str::FromStr;

use crate::routing::DEFAULT_PREVIEW_SUFFIX;

/// What the router does with a root-path request for an unregistered tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTenantPolicy {
    /// Answer 404 without reaching any handler
    #[default]
    NotFound,
    /// Let the request continue to the platform landing page
    PassThrough,
    /// Send the visitor to the platform root domain
    RedirectToPlatform,
}

impl FromStr for UnknownTenantPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_found" | "not-found" | "404" => Ok(Self::NotFound),
            "pass_through" | "pass-through" | "passthrough" => Ok(Self::PassThrough),
            "redirect" | "redirect_to_platform" => Ok(Self::RedirectToPlatform),
            other => Err(ConfigError::Invalid {
                var: "UNKNOWN_TENANT_POLICY",
                reason: format!("unrecognised policy '{other}'"),
            }),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Tenant routing
    pub root_domain: String, // e.g., "example.com" for *.example.com routing
    pub preview_suffix: String,
    pub excluded_prefixes: Vec<String>,
    pub unknown_tenant_policy: UnknownTenantPolicy,

    // Tenant directory
    pub redis_url: Option<String>,
    pub tenant_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let root_domain =
            env::var("ROOT_DOMAIN").unwrap_or_else(|_| "localhost:3000".to_string());
        if root_domain.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "ROOT_DOMAIN",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            // Tenant routing
            root_domain: root_domain.trim().to_lowercase(),
            preview_suffix: env::var("PREVIEW_DOMAIN_SUFFIX")
                .unwrap_or_else(|_| DEFAULT_PREVIEW_SUFFIX.to_string()),
            excluded_prefixes: parse_prefixes(
                &env::var("ROUTER_EXCLUDED_PREFIXES").unwrap_or_else(|_| "/api,/_next".to_string()),
            ),
            unknown_tenant_policy: match env::var("UNKNOWN_TENANT_POLICY") {
                Ok(value) => value.parse()?,
                Err(_) => UnknownTenantPolicy::default(),
            },

            // Tenant directory (in-memory when unset)
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            tenant_cache_ttl_secs: env::var("TENANT_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
        })
    }

    /// Defaults for a given root domain, without reading the environment
    pub fn for_root_domain(root_domain: &str) -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            root_domain: root_domain.to_lowercase(),
            preview_suffix: DEFAULT_PREVIEW_SUFFIX.to_string(),
            excluded_prefixes: vec!["/api".to_string(), "/_next".to_string()],
            unknown_tenant_policy: UnknownTenantPolicy::default(),
            redis_url: None,
            tenant_cache_ttl_secs: 300,
        }
    }
}

/// Split a comma-separated prefix list, normalising each to start with `/`
fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let p = p.trim_end_matches('/');
            if p.starts_with('/') {
                p.to_string()
            } else {
                format!("/{p}")
            }
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BIND_ADDRESS",
        "ROOT_DOMAIN",
        "PREVIEW_DOMAIN_SUFFIX",
        "ROUTER_EXCLUDED_PREFIXES",
        "UNKNOWN_TENANT_POLICY",
        "REDIS_URL",
        "TENANT_CACHE_TTL_SECS",
    ];

    /// Helper to clear env vars before and after tests
    fn cleanup_config() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        cleanup_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.root_domain, "localhost:3000");
        assert_eq!(config.preview_suffix, ".vercel.app");
        assert_eq!(config.excluded_prefixes, vec!["/api", "/_next"]);
        assert_eq!(config.unknown_tenant_policy, UnknownTenantPolicy::NotFound);
        assert!(config.redis_url.is_none());
        assert_eq!(config.tenant_cache_ttl_secs, 300);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        cleanup_config();
        env::set_var("ROOT_DOMAIN", " Example.COM ");
        env::set_var("ROUTER_EXCLUDED_PREFIXES", "api, static/ ,,/_internal");
        env::set_var("UNKNOWN_TENANT_POLICY", "pass-through");
        env::set_var("REDIS_URL", "redis://cache:6379");
        env::set_var("TENANT_CACHE_TTL_SECS", "not-a-number");

        let config = Config::from_env().unwrap();
        assert_eq!(config.root_domain, "example.com");
        assert_eq!(config.excluded_prefixes, vec!["/api", "/static", "/_internal"]);
        assert_eq!(config.unknown_tenant_policy, UnknownTenantPolicy::PassThrough);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.tenant_cache_ttl_secs, 300);

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        cleanup_config();

        env::set_var("UNKNOWN_TENANT_POLICY", "explode");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "UNKNOWN_TENANT_POLICY",
                ..
            })
        ));

        env::remove_var("UNKNOWN_TENANT_POLICY");
        env::set_var("ROOT_DOMAIN", "  ");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                var: "ROOT_DOMAIN",
                ..
            })
        ));

        cleanup_config();
    }
}
