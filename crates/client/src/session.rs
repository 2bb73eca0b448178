//! Session token persistence
//!
//! The access and refresh tokens are always written together. Readers never
//! observe a new access token next to an old refresh token or the reverse.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default cookie holding the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Default cookie holding the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Snapshot of the stored credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// A freshly issued credential pair, as returned by the refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

pub trait SessionStore: Send + Sync {
    /// Current tokens; empty values read back as absent
    fn load(&self) -> Session;

    /// Store both tokens as one update
    fn replace(&self, tokens: &TokenPair);

    /// Forget both tokens
    fn clear(&self);
}

/// Session kept in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: &TokenPair) -> Self {
        let store = Self::new();
        store.replace(tokens);
        store
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, tokens: &TokenPair) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *session = Session {
            access_token: Some(tokens.token.clone()).filter(|t| !t.is_empty()),
            refresh_token: Some(tokens.refresh_token.clone()).filter(|t| !t.is_empty()),
        };
    }

    fn clear(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
    }
}

/// Cookie names used by [`CookieSessionStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieNames {
    pub access_token: String,
    pub refresh_token: String,
}

impl Default for CookieNames {
    fn default() -> Self {
        Self {
            access_token: ACCESS_TOKEN_COOKIE.to_string(),
            refresh_token: REFRESH_TOKEN_COOKIE.to_string(),
        }
    }
}

/// Session kept in a cookie jar scoped to the application URL.
///
/// Cookies are written with `Path=/` so every route of the application sees
/// them. The jar can be shared with an HTTP client serving the application.
pub struct CookieSessionStore {
    jar: Arc<Jar>,
    scope: Url,
    names: CookieNames,
    write_lock: Mutex<()>,
}

impl CookieSessionStore {
    pub fn new(scope: Url) -> Self {
        Self::with_jar(Arc::new(Jar::default()), scope)
    }

    pub fn with_jar(jar: Arc<Jar>, scope: Url) -> Self {
        Self {
            jar,
            scope,
            names: CookieNames::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_names(mut self, names: CookieNames) -> Self {
        self.names = names;
        self
    }

    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }

    fn set(&self, name: &str, value: &str) {
        self.jar
            .add_cookie_str(&format!("{name}={value}; Path=/"), &self.scope);
    }

    fn read(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.scope)?;
        let cookies = header.to_str().ok()?;
        cookie_value(cookies, name)
    }
}

impl SessionStore for CookieSessionStore {
    fn load(&self) -> Session {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Session {
            access_token: self.read(&self.names.access_token),
            refresh_token: self.read(&self.names.refresh_token),
        }
    }

    fn replace(&self, tokens: &TokenPair) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.set(&self.names.access_token, &tokens.token);
        self.set(&self.names.refresh_token, &tokens.refresh_token);
    }

    fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.set(&self.names.access_token, "");
        self.set(&self.names.refresh_token, "");
    }
}

/// Find `name` in a `Cookie` header value (`a=1; b=2`)
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("https://app.example.com/").unwrap()
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_empty());

        store.replace(&TokenPair::new("access-1", "refresh-1"));
        assert_eq!(
            store.load(),
            Session {
                access_token: Some("access-1".into()),
                refresh_token: Some("refresh-1".into()),
            }
        );

        store.clear();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_cookie_store_roundtrip() {
        let store = CookieSessionStore::new(scope());
        assert!(store.load().is_empty());

        store.replace(&TokenPair::new("access-1", "refresh-1"));
        store.replace(&TokenPair::new("access-2", "refresh-2"));

        let session = store.load();
        assert_eq!(session.access_token.as_deref(), Some("access-2"));
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[test]
    fn test_cookie_store_is_root_scoped() {
        let store = CookieSessionStore::new(scope());
        store.replace(&TokenPair::new("a", "r"));

        let deep = Url::parse("https://app.example.com/tenants/acme/settings").unwrap();
        let header = store.jar().cookies(&deep).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("access_token=a"));
        assert!(header.contains("refresh_token=r"));
    }

    #[test]
    fn test_cookie_store_clear() {
        let store = CookieSessionStore::new(scope());
        store.replace(&TokenPair::new("a", "r"));
        store.clear();

        assert!(store.load().is_empty());
    }

    #[test]
    fn test_custom_cookie_names() {
        let store = CookieSessionStore::new(scope()).with_names(CookieNames {
            access_token: "tg_access".into(),
            refresh_token: "tg_refresh".into(),
        });
        store.replace(&TokenPair::new("a", "r"));

        let header = store.jar().cookies(&scope()).unwrap();
        assert!(header.to_str().unwrap().contains("tg_access=a"));
        assert_eq!(store.load().refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_cookie_value() {
        assert_eq!(cookie_value("a=1; b=2", "b").as_deref(), Some("2"));
        assert_eq!(cookie_value("ab=1; b=", "b"), None);
        assert_eq!(cookie_value("a=1", "c"), None);
        assert_eq!(cookie_value("t=x.y=z", "t").as_deref(), Some("x.y=z"));
    }

    #[test]
    fn test_token_pair_wire_format() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"token":"t","refreshToken":"r"}"#).unwrap();
        assert_eq!(pair, TokenPair::new("t", "r"));
    }
}
