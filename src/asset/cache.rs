use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::LoadedAsset;

/// Process-lifetime cache of loaded assets keyed by logical key.
///
/// Append-only. Tracks in-flight keys so a second request for the same key
/// does not fetch again.
#[derive(Debug, Default)]
pub struct ClipCache {
    entries: HashMap<String, Arc<LoadedAsset>>,
    pending: HashSet<String>,
}

impl ClipCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<LoadedAsset>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a loaded asset. A duplicate insert replaces the previous entry.
    pub fn put(&mut self, key: impl Into<String>, asset: LoadedAsset) -> Arc<LoadedAsset> {
        let key = key.into();
        self.pending.remove(&key);
        let asset = Arc::new(asset);
        self.entries.insert(key, Arc::clone(&asset));
        asset
    }

    /// Mark `key` as being fetched.
    ///
    /// Returns false when the key is already cached or in flight, in which
    /// case the caller must not start another fetch.
    pub fn begin_load(&mut self, key: &str) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.pending.insert(key.to_string())
    }

    /// Forget an in-flight key after its fetch failed.
    pub fn abandon(&mut self, key: &str) {
        self.pending.remove(key);
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::fixtures;
    use wasm_bindgen_test::*;

    #[test]
    #[wasm_bindgen_test]
    fn test_in_flight_key_is_fetched_once() {
        let mut cache = ClipCache::new();
        assert!(cache.begin_load("hi"));
        assert!(!cache.begin_load("hi"));
        assert!(cache.is_pending("hi"));

        cache.put("hi", fixtures::external_asset("hi", 1.0));
        assert!(!cache.is_pending("hi"));
        assert!(!cache.begin_load("hi"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_abandon_allows_retry() {
        let mut cache = ClipCache::new();
        assert!(cache.begin_load("no"));
        cache.abandon("no");
        assert!(cache.get("no").is_none());
        assert!(cache.begin_load("no"));
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_duplicate_put_is_last_writer_wins() {
        let mut cache = ClipCache::new();
        cache.put("yes", fixtures::external_asset("yes", 1.0));
        let second = cache.put("yes", fixtures::external_asset("yes", 2.0));
        assert!(Arc::ptr_eq(&second, &cache.get("yes").unwrap()));
        assert_eq!(cache.len(), 1);
    }
}
