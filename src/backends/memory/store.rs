//! Cache Store Module
//!
//! HashMap storage combined with LRU tracking and TTL expiration.

use std::collections::HashMap;

use bytes::Bytes;

use super::{CacheEntry, LruTracker};
use crate::error::{CacheError, Result};
use crate::ttl;

// == Cache Store ==
/// Bounded in-process store with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    max_entries: usize,
    /// Default TTL in seconds applied when a put carries 0
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    pub fn new(max_entries: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries,
            default_ttl,
        }
    }

    // == Set ==
    /// Stores a payload, overwriting any previous value and resetting its TTL.
    ///
    /// At capacity, the least recently used entry is evicted first. A
    /// `ttl_seconds` of 0 applies the store default.
    pub fn set(&mut self, key: String, value: Bytes, ttl_seconds: u64) -> Result<()> {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(evicted_key) => {
                    self.entries.remove(&evicted_key);
                }
                None => {
                    return Err(CacheError::Backend(
                        "Memory store is full and eviction failed".to_string(),
                    ))
                }
            }
        }

        let effective_ttl = ttl::resolve(ttl_seconds, self.default_ttl);
        self.entries
            .insert(key.clone(), CacheEntry::new(value, effective_ttl));
        self.lru.touch(&key);

        Ok(())
    }

    // == Get ==
    /// Retrieves a payload by key.
    ///
    /// Missing and expired keys both yield `NotFound`; expired entries are
    /// dropped on the way.
    pub fn get(&mut self, key: &str) -> Result<Bytes> {
        let expired = match self.entries.get(key) {
            None => return Err(CacheError::NotFound(key.to_string())),
            Some(entry) => entry.is_expired(),
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            return Err(CacheError::NotFound(key.to_string()));
        }

        self.lru.touch(key);
        self.entries
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn val(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(100, 300);

        store.set("key1".to_string(), val("value1"), 0).unwrap();

        assert_eq!(store.get("key1").unwrap(), val("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(100, 300);
        assert!(matches!(store.get("nonexistent"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(100, 300);

        store.set("key1".to_string(), val("value1"), 0).unwrap();
        store.set("key1".to_string(), val("value2"), 0).unwrap();

        assert_eq!(store.get("key1").unwrap(), val("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_expired_is_not_found() {
        let mut store = CacheStore::new(100, 300);

        store.set("key1".to_string(), val("value1"), 1).unwrap();
        assert!(store.get("key1").is_ok());

        sleep(Duration::from_millis(1100));

        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_zero_default_never_expires() {
        let mut store = CacheStore::new(100, 0);
        store.set("key1".to_string(), val("value1"), 0).unwrap();

        let entry = store.entries.get("key1").unwrap();
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(3, 300);

        store.set("key1".to_string(), val("value1"), 0).unwrap();
        store.set("key2".to_string(), val("value2"), 0).unwrap();
        store.set("key3".to_string(), val("value3"), 0).unwrap();
        store.set("key4".to_string(), val("value4"), 0).unwrap();

        assert_eq!(store.len(), 3);
        assert!(matches!(store.get("key1"), Err(CacheError::NotFound(_))));
        assert!(store.get("key4").is_ok());
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(3, 300);

        store.set("key1".to_string(), val("value1"), 0).unwrap();
        store.set("key2".to_string(), val("value2"), 0).unwrap();
        store.set("key3".to_string(), val("value3"), 0).unwrap();
        store.get("key1").unwrap();
        store.set("key4".to_string(), val("value4"), 0).unwrap();

        assert!(store.get("key1").is_ok());
        assert!(matches!(store.get("key2"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(100, 300);

        store.set("key1".to_string(), val("value1"), 1).unwrap();
        store.set("key2".to_string(), val("value2"), 10).unwrap();

        sleep(Duration::from_millis(1100));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_ok());
    }

}
