use crate::models::chat::ChatTurn;
use log::debug;
use moka::sync::Cache;
use std::time::{ Duration, Instant };

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// Completed responses keyed by the turns that produced them.
///
/// Backed by `moka`: entries expire `ttl` after insertion and, past `capacity`, moka's
/// TinyLFU policy picks what to evict. Eviction runs lazily, so `len` is approximate
/// until pending maintenance has run.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, CacheEntry>,
    capacity: u64,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { entries, capacity, ttl }
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            self.entries.invalidate(key);
            return None;
        }
        debug!("Response cache hit");
        Some(entry.value)
    }

    pub fn insert(&self, key: String, value: String) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: String, value: String, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        let entry = CacheEntry {
            key: key.clone(),
            value,
            inserted_at: now,
            ttl: self.ttl,
        };
        self.entries.insert(key, entry);
    }
}

/// Cache key for a request: the turns it would send, trimmed. Case is kept.
pub fn normalize(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}:{}", turn.role, turn.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
