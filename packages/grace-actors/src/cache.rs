//! Process-local existence cache.
//!
//! Short-TTL map used to short-circuit existence checks without taking a
//! turn on an actor. Three states per key: *unknown* (absent), `Exists`
//! (with the resolved id), `DoesNotExist`. Never authoritative: misses,
//! expiry and contradictions all fall through to the actor.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedEntity {
    Exists(Uuid),
    DoesNotExist,
}

/// Thread-safe cache with absolute expiration.
pub struct ExistenceCache {
    entries: DashMap<String, (CachedEntity, Instant)>,
    ttl: Duration,
}

impl ExistenceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedEntity> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = *entry;
            if Instant::now() < expires_at {
                return Some(value);
            }
        }
        // Expired entries are dropped on read.
        self.entries
            .remove_if(key, |_, (_, expires_at)| Instant::now() >= *expires_at);
        None
    }

    pub fn put_exists(&self, key: impl Into<String>, id: Uuid) {
        self.entries
            .insert(key.into(), (CachedEntity::Exists(id), Instant::now() + self.ttl));
    }

    pub fn put_missing(&self, key: impl Into<String>) {
        self.entries
            .insert(key.into(), (CachedEntity::DoesNotExist, Instant::now() + self.ttl));
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }
}

impl Default for ExistenceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_then_exists_then_invalidated() {
        let cache = ExistenceCache::default();
        let id = Uuid::new_v4();

        assert_eq!(cache.get("Owner:alice"), None);

        cache.put_exists("Owner:alice", id);
        assert_eq!(cache.get("Owner:alice"), Some(CachedEntity::Exists(id)));

        cache.invalidate("Owner:alice");
        assert_eq!(cache.get("Owner:alice"), None);
    }

    #[test]
    fn negative_entries_are_cached_too() {
        let cache = ExistenceCache::default();
        cache.put_missing("Repo:demo|o|g");
        assert_eq!(cache.get("Repo:demo|o|g"), Some(CachedEntity::DoesNotExist));
    }

    #[test]
    fn entries_expire_absolutely() {
        let cache = ExistenceCache::new(Duration::from_millis(0));
        cache.put_exists("Owner:bob", Uuid::new_v4());
        assert_eq!(cache.get("Owner:bob"), None);
    }
}
