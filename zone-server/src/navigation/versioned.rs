//! Version-rotation cache
//!
//! Keys embed the current version of their domain. Invalidation bumps the
//! version; entries written under older versions are never read again and
//! stay in memory until [`VersionedCache::flush`]. O(1) invalidation is paid
//! for with unbounded growth of abandoned entries between flushes.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;

use crate::core::ResourceVersions;

pub struct VersionedCache<V> {
    domain: &'static str,
    versions: Arc<ResourceVersions>,
    entries: DashMap<String, V>,
}

impl<V: Clone> VersionedCache<V> {
    pub fn new(domain: &'static str, versions: Arc<ResourceVersions>) -> Self {
        Self {
            domain,
            versions,
            entries: DashMap::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.versions.get(self.domain)
    }

    fn key_at(&self, version: u64, query_key: &str) -> String {
        format!("{}:v{}:{}", self.domain, version, query_key)
    }

    /// Versioned storage key for `query_key` at the current version
    pub fn key(&self, query_key: &str) -> String {
        self.key_at(self.version(), query_key)
    }

    pub fn get(&self, query_key: &str) -> Option<V> {
        self.entries.get(&self.key(query_key)).map(|v| v.value().clone())
    }

    pub fn insert(&self, query_key: &str, value: V) {
        self.entries.insert(self.key(query_key), value);
    }

    /// Cached value, or compute and store it under the version current at
    /// the start of the call
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, query_key: &str, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = self.key(query_key);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.value().clone());
        }
        let value = f().await?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    /// Abandon every entry of this domain; returns the new version
    pub fn bump(&self) -> u64 {
        let version = self.versions.increment(self.domain);
        tracing::debug!(domain = self.domain, version, "Cache version bumped");
        version
    }

    /// Drop all entries, abandoned or not
    pub fn flush(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Stored entries, including abandoned ones
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

    fn cache() -> VersionedCache<i32> {
        VersionedCache::new("apartments", Arc::new(ResourceVersions::new()))
    }

    #[test]
    fn test_key_embeds_version() {
        let cache = cache();
        assert_eq!(cache.key("page=1"), "apartments:v0:page=1");
        cache.bump();
        assert_eq!(cache.key("page=1"), "apartments:v1:page=1");
    }

    #[test]
    fn test_bump_abandons_entries() {
        let cache = cache();
        cache.insert("page=1", 10);
        assert_eq!(cache.get("page=1"), Some(10));

        cache.bump();
        assert_eq!(cache.get("page=1"), None);
        // Abandoned, not deleted
        assert_eq!(cache.len(), 1);

        cache.insert("page=1", 11);
        assert_eq!(cache.get("page=1"), Some(11));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.flush(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_domains_are_independent() {
        let versions = Arc::new(ResourceVersions::new());
        let a: VersionedCache<i32> = VersionedCache::new("a", versions.clone());
        let b: VersionedCache<i32> = VersionedCache::new("b", versions);
        a.insert("k", 1);
        b.insert("k", 2);

        a.bump();
        assert_eq!(a.get("k"), None);
        assert_eq!(b.get("k"), Some(2));
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with() {
        let cache = cache();
        let v: Result<i32, ()> = cache.get_or_try_insert_with("q", || async { Ok(5) }).await;
        assert_eq!(v, Ok(5));

        // Served from cache, closure not consulted
        let v: Result<i32, ()> = cache.get_or_try_insert_with("q", || async { Err(()) }).await;
        assert_eq!(v, Ok(5));

        let v: Result<i32, &str> = cache
            .get_or_try_insert_with("other", || async { Err("boom") })
            .await;
        assert_eq!(v, Err("boom"));
        assert_eq!(cache.len(), 1);
    }
}
