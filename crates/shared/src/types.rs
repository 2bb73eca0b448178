//! Common types used across TenantGate

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Key prefix under which tenant records live in the key-value store
pub const DIRECTORY_KEY_PREFIX: &str = "subdomain:";

/// Icon reported for records whose stored value is missing or unreadable
pub const FALLBACK_ICON: &str = "❓";

/// Build the store key for an already sanitized subdomain
pub fn directory_key(sanitized_subdomain: &str) -> String {
    format!("{DIRECTORY_KEY_PREFIX}{sanitized_subdomain}")
}

/// Strip the store prefix from a key, returning the subdomain
pub fn subdomain_from_key(key: &str) -> &str {
    key.strip_prefix(DIRECTORY_KEY_PREFIX).unwrap_or(key)
}

// =============================================================================
// Tenant Records
// =============================================================================

/// A registered tenant, keyed by its sanitized subdomain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub subdomain: String,
    pub icon: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TenantRecord {
    /// Create a record stamped with the current time
    pub fn new(subdomain: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            icon: icon.into(),
            created_at: truncate_to_millis(OffsetDateTime::now_utc()),
        }
    }

    /// Rebuild a record from its stored value.
    ///
    /// Missing fields fall back to [`FALLBACK_ICON`] and the current time,
    /// so a damaged entry still shows up in listings.
    pub fn from_stored(subdomain: impl Into<String>, stored: Option<StoredTenant>) -> Self {
        let stored = stored.unwrap_or_default();
        let created_at = stored
            .created_at
            .and_then(millis_to_datetime)
            .unwrap_or_else(|| truncate_to_millis(OffsetDateTime::now_utc()));

        Self {
            subdomain: subdomain.into(),
            icon: stored
                .emoji
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| FALLBACK_ICON.to_string()),
            created_at,
        }
    }

    /// The value written to the store for this record
    pub fn to_stored(&self) -> StoredTenant {
        StoredTenant {
            emoji: Some(self.icon.clone()),
            created_at: Some(datetime_to_millis(self.created_at)),
        }
    }
}

/// Stored value layout: `{"emoji": "...", "createdAt": <epoch ms>}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTenant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Registration payload for a new tenant
#[derive(Debug, Clone, Deserialize)]
pub struct NewTenant {
    pub subdomain: String,
    pub icon: String,
}

// =============================================================================
// Timestamp helpers
// =============================================================================

fn datetime_to_millis(dt: OffsetDateTime) -> i64 {
    (dt.unix_timestamp_nanos() / 1_000_000) as i64
}

fn millis_to_datetime(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
}

fn truncate_to_millis(dt: OffsetDateTime) -> OffsetDateTime {
    millis_to_datetime(datetime_to_millis(dt)).unwrap_or(dt)
}
