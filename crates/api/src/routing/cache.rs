//! In-memory tenant cache with TTL
//!
//! Caches directory lookups so the router does not hit the key-value store
//! on every root-path request.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tenantgate_shared::TenantRecord;

/// Default cache TTL (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache entry with expiration
#[derive(Clone)]
struct CacheEntry {
    record: Option<TenantRecord>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(record: Option<TenantRecord>, ttl: Duration) -> Self {
        Self {
            record,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe cache keyed by sanitized subdomain
pub struct TenantCache {
    /// `None` records mean "looked up, not registered"
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for TenantCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantCache {
    /// Create a new cache with default TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    /// Create a new cache with custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a cached lookup.
    /// Returns Some(Some(record)) for a known tenant,
    /// Some(None) for a cached miss,
    /// None if not in cache or expired
    pub fn get(&self, subdomain: &str) -> Option<Option<TenantRecord>> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(subdomain)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.record.clone())
        }
    }

    /// Cache a lookup result
    pub fn set(&self, subdomain: &str, record: Option<TenantRecord>) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(subdomain.to_string(), CacheEntry::new(record, self.ttl));
        }
    }

    /// Invalidate a specific subdomain
    pub fn invalidate(&self, subdomain: &str) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(subdomain);
        }
    }

    /// Clear expired entries (call periodically for memory management)
    pub fn cleanup(&self) -> usize {
        match self.cache.write() {
            Ok(mut cache) => {
                let before = cache.len();
                cache.retain(|_, entry| !entry.is_expired());
                before - cache.len()
            }
            Err(_) => 0,
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        if let Ok(cache) = self.cache.read() {
            let total = cache.len();
            let expired = cache.values().filter(|e| e.is_expired()).count();
            let negative = cache
                .values()
                .filter(|e| !e.is_expired() && e.record.is_none())
                .count();
            CacheStats {
                total_entries: total,
                expired_entries: expired,
                active_entries: total - expired,
                negative_entries: negative,
            }
        } else {
            CacheStats::default()
        }
    }
}

/// Cache statistics
#[derive(Default, Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
    pub negative_entries: usize,
}
