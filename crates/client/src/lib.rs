//! TenantGate API client
//!
//! Outbound HTTP client that carries the user's session credentials,
//! refreshes them at most once at a time when they expire, and reports
//! every failure as a categorized [`ClientError`].

pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod refresh;
pub mod session;

pub use client::{build_http_client, ApiRequest, AuthenticatedClient, ACCESS_TOKEN_HEADER};
pub use config::{
    ClientConfig, ConfigError, TlsIdentityPaths, DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT,
};
pub use error::{ClientError, ClientResult, ErrorCategory};
pub use notify::{ChannelNotifier, Notice, Notifier, TracingNotifier};
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
pub use session::{
    CookieNames, CookieSessionStore, MemorySessionStore, Session, SessionStore, TokenPair,
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
