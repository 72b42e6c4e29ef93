//! Scene content cache.
//!
//! Bounded least-recently-used mapping from a content fingerprint of
//! `(lyric text, style, mood)` to a previously generated background.
//! Shared across the sequential and parallel generation paths and across
//! jobs; both `get` and `put` promote the entry, and the promote/evict
//! sequence runs under one lock so concurrent access cannot corrupt the
//! recency order. No negative caching: a miss always triggers synthesis.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::RgbaImage;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;

/// Deterministic cache key over the synthesis arguments.
pub fn cache_key(lyric_text: &str, style_key: &str, mood: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(lyric_text.as_bytes());
    hasher.update([0]);
    hasher.update(style_key.as_bytes());
    hasher.update([0]);
    hasher.update(mood.as_bytes());
    format!("{:x}", hasher.finalize())
}

struct CacheInner {
    map: HashMap<String, Arc<RgbaImage>>,
    recency: VecDeque<String>,
}

/// Bounded LRU cache of generated backgrounds.
pub struct SceneContentCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl SceneContentCache {
    /// Cache holding at most `capacity` backgrounds.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                recency: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Look up a background, promoting the entry to most-recently-used.
    pub async fn get(&self, key: &str) -> Option<Arc<RgbaImage>> {
        let mut inner = self.inner.lock().await;
        let value = inner.map.get(key).cloned()?;
        promote(&mut inner.recency, key);
        Some(value)
    }

    /// Insert (or refresh) a background, evicting the least-recently-used
    /// entry when the cache is over capacity.
    pub async fn put(&self, key: String, value: Arc<RgbaImage>) {
        let mut inner = self.inner.lock().await;
        let existed = inner.map.insert(key.clone(), value).is_some();
        if existed {
            promote(&mut inner.recency, &key);
        } else {
            inner.recency.push_back(key);
        }

        while inner.map.len() > self.capacity {
            let Some(evicted) = inner.recency.pop_front() else {
                break;
            };
            inner.map.remove(&evicted);
            debug!(key = %evicted, "Evicted LRU cache entry");
        }
    }

    /// Current entry count.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.map.is_empty()
    }
}

fn promote(recency: &mut VecDeque<String>, key: &str) {
    if let Some(pos) = recency.iter().position(|k| k == key) {
        let key = recency.remove(pos).expect("position is valid");
        recency.push_back(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn bg(shade: u8) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(4, 4, Rgba([shade, shade, shade, 255])))
    }

    #[test]
    fn test_cache_key_deterministic() {
        assert_eq!(cache_key("a", "b", "c"), cache_key("a", "b", "c"));
        assert_ne!(cache_key("a", "b", "c"), cache_key("a", "b", "d"));
        // The separator prevents boundary collisions
        assert_ne!(cache_key("ab", "c", "d"), cache_key("a", "bc", "d"));
    }

    #[tokio::test]
    async fn test_capacity_never_exceeded() {
        let cache = SceneContentCache::new(3);
        for i in 0..10u8 {
            cache.put(format!("key{}", i), bg(i)).await;
            assert!(cache.len().await <= 3);
        }
    }

    #[tokio::test]
    async fn test_evicts_exactly_the_lru_entry() {
        let cache = SceneContentCache::new(3);
        cache.put("a".to_string(), bg(1)).await;
        cache.put("b".to_string(), bg(2)).await;
        cache.put("c".to_string(), bg(3)).await;

        // Insert a fourth distinct key: "a" is the least recently used
        cache.put("d".to_string(), bg(4)).await;

        assert!(cache.get("a").await.is_none());
        assert!(cache.get("b").await.is_some());
        assert!(cache.get("c").await.is_some());
        assert!(cache.get("d").await.is_some());
    }

    #[tokio::test]
    async fn test_get_promotes_to_mru() {
        let cache = SceneContentCache::new(3);
        cache.put("a".to_string(), bg(1)).await;
        cache.put("b".to_string(), bg(2)).await;
        cache.put("c".to_string(), bg(3)).await;

        // Touch "a" so "b" becomes the LRU
        assert!(cache.get("a").await.is_some());
        cache.put("d".to_string(), bg(4)).await;

        assert!(cache.get("a").await.is_some());
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn test_put_refreshes_existing() {
        let cache = SceneContentCache::new(2);
        cache.put("a".to_string(), bg(1)).await;
        cache.put("b".to_string(), bg(2)).await;

        // Refresh "a": it becomes MRU, so inserting "c" evicts "b"
        cache.put("a".to_string(), bg(9)).await;
        cache.put("c".to_string(), bg(3)).await;

        let refreshed = cache.get("a").await.unwrap();
        assert_eq!(refreshed.get_pixel(0, 0).0[0], 9);
        assert!(cache.get("b").await.is_none());
    }
}
