//! # Result Cache
//! In-memory keyword → forecast store with an absolute TTL.
//!
//! Expiry is lazy: a stale entry stays in the map but reads as a miss until
//! the next successful forecast overwrites it. Nothing is persisted.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use tokio::time::Instant;

use crate::series::ForecastResponse;

/// Default time-to-live for cached forecasts (10 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: Arc<ForecastResponse>,
    created_at: Instant,
}

/// Diagnostic view of one entry (see `/debug/cache`).
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheEntryInfo {
    pub keyword: String,
    pub age_ms: u64,
    pub fresh: bool,
}

/// Thread-safe result cache. Entries are replaced wholesale, last writer wins.
///
/// Expired entries stay in the map until the next successful forecast for the
/// same keyword overwrites them; there is no sweep.
#[derive(Debug)]
pub struct ResultCache {
    inner: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl ResultCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached response only while its age is strictly below the TTL.
    pub fn get(&self, keyword: &str) -> Option<Arc<ForecastResponse>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let entry = map.get(keyword)?;
        if entry.created_at.elapsed() < self.ttl {
            Some(Arc::clone(&entry.response))
        } else {
            None
        }
    }

    /// Unconditionally overwrite the entry for `keyword`, stamped with "now".
    pub fn put(&self, keyword: &str, response: Arc<ForecastResponse>) {
        let entry = CacheEntry {
            response,
            created_at: Instant::now(),
        };
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(keyword.to_string(), entry);
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(keyword)
    }

    /// Entries sorted by keyword, with age and freshness.
    pub fn snapshot(&self) -> Vec<CacheEntryInfo> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = map
            .iter()
            .map(|(k, e)| {
                let age = e.created_at.elapsed();
                CacheEntryInfo {
                    keyword: k.clone(),
                    age_ms: u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
                    fresh: age < self.ttl,
                }
            })
            .collect::<Vec<_>>();
        out.sort_by(|a, b| a.keyword.cmp(&b.keyword));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::HistoricalSeries;

    fn response(keyword: &str) -> Arc<ForecastResponse> {
        Arc::new(ForecastResponse {
            keyword: keyword.to_string(),
            historical: HistoricalSeries::empty(),
            forecast: vec![],
        })
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_miss_at_ttl() {
        let cache = ResultCache::with_ttl(Duration::from_secs(600));
        cache.put("rust", response("rust"));

        tokio::time::advance(Duration::from_secs(599)).await;
        assert!(cache.get("rust").is_some());

        // age == ttl is already stale
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("rust").is_none());
        // lazily expired, not removed
        assert!(cache.contains("rust"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn put_overwrites_and_restamps() {
        let cache = ResultCache::with_ttl(Duration::from_secs(10));
        cache.put("rust", response("first"));
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get("rust").is_none());

        cache.put("rust", response("second"));
        let hit = cache.get("rust").expect("fresh after overwrite");
        assert_eq!(hit.keyword, "second");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reports_freshness() {
        let cache = ResultCache::with_ttl(Duration::from_secs(5));
        cache.put("b", response("b"));
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.put("a", response("a"));

        let snap = cache.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].keyword, "a");
        assert!(snap[0].fresh);
        assert!(!snap[1].fresh);
        assert!(snap[1].age_ms >= 6_000);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_kept_until_overwritten() {
        let cache = ResultCache::with_ttl(Duration::from_secs(1));
        cache.put("a", response("a"));
        cache.put("b", response("b"));
        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(cache.get("a").is_none() && cache.get("b").is_none());
        assert_eq!(cache.len(), 2);
        assert!(cache.snapshot().iter().all(|e| !e.fresh));

        cache.put("a", response("a2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.snapshot()[0].keyword, "a");
        assert!(cache.snapshot()[0].fresh);
    }

    #[test]
    fn unknown_keyword_is_a_miss() {
        let cache = ResultCache::default();
        assert!(cache.get("nothing").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.ttl(), DEFAULT_TTL);
    }
}
