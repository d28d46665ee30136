use std::collections::HashMap;
use std::sync::Mutex;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Cached summaries go stale after a day.
pub fn default_ttl() -> Duration {
    Duration::hours(24)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CachedSummary {
    pub title: String,
    pub excerpt: String,
    pub summary: String,
}

struct Entry {
    value: CachedSummary,
    expires_at: DateTime<Utc>,
}

/// In-memory summary cache keyed by URL, with per-entry expiry.
///
/// Entries are evicted lazily on read; there is no size bound. Entries
/// are small and the cache lives only as long as the process, so this
/// is acceptable here — a shared deployment would want an external
/// bounded cache instead.
pub struct SummaryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value, or None (evicting the entry) if it has
    /// passed its expiry instant.
    pub fn get(&self, key: &str) -> Option<CachedSummary> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if Utc::now() > entry.expires_at => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Stores `value` under `key`, overwriting any prior entry.
    pub fn put(&self, key: String, value: CachedSummary, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new()
    }
}
