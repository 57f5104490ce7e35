use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ner::RecognizedEntity;

/// Thread-safe LRU cache of recognizer output, keyed by the exact span text.
///
/// Narrow and wide windows around neighbouring identifiers frequently cover
/// the same text; caching avoids re-sending those spans to the NER service.
pub struct MentionCache {
    cache: Mutex<LruCache<String, Vec<RecognizedEntity>>>,
}

impl MentionCache {
    /// Create a cache holding at most `capacity` spans (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<RecognizedEntity>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached entities for `span`, refreshing its LRU position.
    pub fn get(&self, span: &str) -> Option<Vec<RecognizedEntity>> {
        self.lock().get(span).cloned()
    }

    pub fn put(&self, span: String, entities: Vec<RecognizedEntity>) {
        self.lock().put(span, entities);
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ner::EntityLabel;

    fn person(name: &str) -> Vec<RecognizedEntity> {
        vec![RecognizedEntity {
            text: name.to_string(),
            label: EntityLabel::Person,
            offset: 0,
        }]
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = MentionCache::new(10);
        cache.put("Mr. Ravi Shah".to_string(), person("Ravi Shah"));

        let retrieved = cache.get("Mr. Ravi Shah");
        assert_eq!(retrieved, Some(person("Ravi Shah")));
        assert!(cache.get("Mr. Ravi Sha").is_none());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = MentionCache::new(2);

        cache.put("span1".to_string(), person("One"));
        cache.put("span2".to_string(), person("Two"));
        // Access span1 so span2 becomes least recently used
        let _ = cache.get("span1");
        cache.put("span3".to_string(), person("Three"));

        assert!(cache.get("span1").is_some());
        assert!(cache.get("span2").is_none()); // Evicted
        assert!(cache.get("span3").is_some());
    }

    #[test]
    fn test_cache_zero_capacity_holds_one() {
        let cache = MentionCache::new(0);
        cache.put("span1".to_string(), person("One"));
        cache.put("span2".to_string(), person("Two"));
        assert_eq!(cache.len(), 1);
    }
}
