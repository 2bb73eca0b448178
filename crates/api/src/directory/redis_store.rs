//! Redis-backed tenant directory
//!
//! Records live under `subdomain:<name>` as JSON `{"emoji", "createdAt"}`.
//! Listing walks the keyspace with SCAN and fetches values in one MGET.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tenantgate_shared::{
    directory_key, sanitize_subdomain, subdomain_from_key, StoredTenant, TenantError,
    TenantRecord, TenantResult, DIRECTORY_KEY_PREFIX,
};

use super::TenantDirectory;

/// Keys requested per SCAN round trip
const SCAN_BATCH: usize = 200;

#[derive(Clone)]
pub struct RedisTenantDirectory {
    conn: ConnectionManager,
}

fn storage_error(err: redis::RedisError) -> TenantError {
    TenantError::Storage(err.to_string())
}

/// Decode a stored value, tolerating damaged entries
fn decode(key: &str, raw: Option<String>) -> Option<StoredTenant> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(stored) => Some(stored),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "Unreadable tenant record");
            None
        }
    }
}

impl RedisTenantDirectory {
    /// Connect to Redis and verify the connection
    pub async fn connect(redis_url: &str) -> TenantResult<Self> {
        let client = redis::Client::open(redis_url).map_err(storage_error)?;
        let conn = ConnectionManager::new(client).await.map_err(storage_error)?;
        let directory = Self { conn };
        directory.ping().await?;

        tracing::info!("Connected to Redis tenant directory");
        Ok(directory)
    }
}

#[async_trait]
impl TenantDirectory for RedisTenantDirectory {
    async fn get(&self, subdomain: &str) -> TenantResult<Option<TenantRecord>> {
        let sanitized = sanitize_subdomain(subdomain);
        if sanitized.is_empty() {
            return Ok(None);
        }

        let key = directory_key(&sanitized);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&key).await.map_err(storage_error)?;

        Ok(raw.map(|value| TenantRecord::from_stored(sanitized, decode(&key, Some(value)))))
    }

    async fn list_all(&self) -> TenantResult<Vec<TenantRecord>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{DIRECTORY_KEY_PREFIX}*");

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(storage_error)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;

        Ok(keys
            .iter()
            .zip(values.into_iter().chain(std::iter::repeat(None)))
            .map(|(key, raw)| TenantRecord::from_stored(subdomain_from_key(key), decode(key, raw)))
            .collect())
    }

    async fn insert(&self, record: TenantRecord) -> TenantResult<()> {
        let sanitized = sanitize_subdomain(&record.subdomain);
        let key = directory_key(&sanitized);
        let value = serde_json::to_string(&record.to_stored())
            .map_err(|e| TenantError::Storage(e.to_string()))?;

        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;

        match reply {
            Some(_) => Ok(()),
            None => Err(TenantError::AlreadyExists(sanitized)),
        }
    }

    async fn ping(&self) -> TenantResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_tolerates_garbage() {
        assert!(decode("subdomain:x", None).is_none());
        assert!(decode("subdomain:x", Some("not json".into())).is_none());

        let stored = decode("subdomain:x", Some(r#"{"emoji":"🔥"}"#.into())).unwrap();
        assert_eq!(stored.emoji.as_deref(), Some("🔥"));
        assert!(stored.created_at.is_none());
    }

    #[tokio::test]
    #[ignore = "Requires REDIS_URL"]
    async fn test_redis_roundtrip() {
        let url = std::env::var("REDIS_URL").unwrap();
        let directory = RedisTenantDirectory::connect(&url).await.unwrap();

        let subdomain = format!("it-{}", std::process::id());
        directory
            .insert(TenantRecord::new(subdomain.clone(), "🧪"))
            .await
            .unwrap();
        assert!(matches!(
            directory.insert(TenantRecord::new(subdomain.clone(), "🧪")).await,
            Err(TenantError::AlreadyExists(_))
        ));

        let fetched = directory.get(&subdomain.to_uppercase()).await.unwrap().unwrap();
        assert_eq!(fetched.icon, "🧪");

        let all = directory.list_all().await.unwrap();
        assert!(all.iter().any(|r| r.subdomain == subdomain));

        let mut conn = directory.conn.clone();
        let _: () = conn.del(directory_key(&subdomain)).await.unwrap();
    }
}
