//! Memoized URL parsing.
//!
//! Operations hit a small set of distinct URLs at high frequency, so each raw
//! string is parsed once and the result is shared. The published map sits
//! behind an `ArcSwap`, so lookups take no lock and never wait on a writer.
//! Writers serialize on a mutex, copy the map with the new entry added and
//! store the copy. Entries are never evicted or changed once published.

use crate::error::{MnsError, RequestError};
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

type UrlMap = HashMap<String, Arc<Url>>;

static SHARED: Lazy<Arc<UrlCache>> = Lazy::new(|| Arc::new(UrlCache::new()));

/// Append-only cache from raw URL strings to parsed URLs.
pub struct UrlCache {
    current: ArcSwap<UrlMap>,
    write_lock: Mutex<()>,
    parses: AtomicUsize,
}

impl UrlCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
            parses: AtomicUsize::new(0),
        }
    }

    /// Process-wide default cache.
    pub fn shared() -> Arc<UrlCache> {
        Arc::clone(&SHARED)
    }

    fn snapshot(&self) -> Arc<UrlMap> {
        self.current.load_full()
    }

    /// Parse `raw`, or return the value parsed by an earlier call.
    pub fn resolve(&self, raw: &str) -> Result<Arc<Url>, MnsError> {
        if let Some(url) = self.current.load().get(raw) {
            return Ok(Arc::clone(url));
        }

        let _guard = self.write_lock.lock();

        let map = self.snapshot();
        if let Some(url) = map.get(raw) {
            return Ok(Arc::clone(url));
        }

        self.parses.fetch_add(1, Ordering::Relaxed);
        let url = Url::parse(raw).map_err(|e| RequestError::MalformedUrl {
            url: raw.to_string(),
            message: e.to_string(),
        })?;
        let url = Arc::new(url);

        let mut next = UrlMap::with_capacity(map.len() + 1);
        next.extend(map.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        next.insert(raw.to_string(), Arc::clone(&url));
        self.current.store(Arc::new(next));

        Ok(url)
    }

    /// Number of times the underlying parser ran, failures included.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for UrlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UrlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlCache")
            .field("entries", &self.len())
            .field("parses", &self.parse_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const QUEUE_URL: &str = "https://123456.mns.cn-hangzhou.aliyuncs.com/queues/orders/messages";

    #[test]
    fn test_resolve_parses_once() {
        let cache = UrlCache::new();
        let first = cache.resolve(QUEUE_URL).unwrap();
        let second = cache.resolve(QUEUE_URL).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.path(), "/queues/orders/messages");
        assert_eq!(cache.parse_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_malformed_url() {
        let cache = UrlCache::new();
        let err = cache.resolve("not a url").unwrap_err();
        assert!(matches!(
            err,
            MnsError::Request(RequestError::MalformedUrl { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_resolve_same_url() {
        let cache = Arc::new(UrlCache::new());
        let workers: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.resolve(QUEUE_URL).unwrap())
            })
            .collect();

        let urls: Vec<Arc<Url>> = workers.into_iter().map(|w| w.join().unwrap()).collect();
        assert!(urls.iter().all(|u| **u == *urls[0]));
        assert_eq!(cache.parse_count(), 1);
    }

    #[test]
    fn test_lookup_does_not_wait_for_writer() {
        let cache = Arc::new(UrlCache::new());
        cache.resolve(QUEUE_URL).unwrap();

        let _writer = cache.write_lock.lock();
        let reader = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.resolve(QUEUE_URL).unwrap())
        };

        let url = reader.join().unwrap();
        assert_eq!(url.path(), "/queues/orders/messages");
        assert_eq!(cache.parse_count(), 1);
    }

    #[test]
    fn test_distinct_urls_are_kept() {
        let cache = UrlCache::new();
        for name in ["a", "b", "c"] {
            let raw = format!("https://123456.mns.cn-hangzhou.aliyuncs.com/queues/{}", name);
            cache.resolve(&raw).unwrap();
        }
        let old = cache.snapshot();
        cache
            .resolve("https://123456.mns.cn-hangzhou.aliyuncs.com/topics/t")
            .unwrap();

        assert_eq!(old.len(), 3);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.parse_count(), 4);
    }
}
