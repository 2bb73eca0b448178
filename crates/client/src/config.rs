//! Client configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Default outbound request timeout (20 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Path of the token refresh endpoint, relative to the API base URL
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// PEM files presented as the client's TLS identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsIdentityPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub refresh_path: String,

    // TLS
    pub tls_identity: Option<TlsIdentityPaths>,
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with default settings
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            tls_identity: None,
            accept_invalid_certs: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `APP_ENV=development` selects `DEV_API_BASE_URL`; any other value
    /// (or none) selects `PROD_API_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let development = env::var("APP_ENV").is_ok_and(|v| v == "development");
        let base_var = if development {
            "DEV_API_BASE_URL"
        } else {
            "PROD_API_BASE_URL"
        };

        let raw_base = env::var(base_var).map_err(|_| ConfigError::Missing(base_var))?;
        let base_url = Url::parse(raw_base.trim()).map_err(|e| ConfigError::Invalid {
            var: base_var,
            reason: e.to_string(),
        })?;

        let timeout = match env::var("API_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::Invalid {
                    var: "API_TIMEOUT_MS",
                    reason: e.to_string(),
                })?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        let tls_identity = match (env::var("API_TLS_CERT"), env::var("API_TLS_KEY")) {
            (Ok(cert), Ok(key)) => Some(TlsIdentityPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (Err(_), Err(_)) => None,
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("API_TLS_KEY")),
            (Err(_), Ok(_)) => return Err(ConfigError::Missing("API_TLS_CERT")),
        };

        Ok(Self {
            base_url,
            timeout,
            refresh_path: env::var("API_REFRESH_PATH")
                .unwrap_or_else(|_| DEFAULT_REFRESH_PATH.to_string()),
            tls_identity,
            accept_invalid_certs: env::var("API_ACCEPT_INVALID_CERTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve an API path against the base URL, keeping any base path
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
