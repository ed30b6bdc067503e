/*!
A bounded, thread-safe cache of compiled patterns.
*/

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::engine::CompiledPattern;

/// Maps verbatim pattern strings to their compiled artifacts.
///
/// Reads are concurrent; writes are exclusive. The cache is bounded: when an
/// insertion would exceed the bound, the oldest entry by insertion order is
/// evicted (FIFO). Entries are `Arc`-shared, so an evicted pattern stays
/// alive for any operation still holding it.
pub struct PatternCache {
    max_size: usize,
    inner: RwLock<Inner>,
}

struct Inner {
    map: FxHashMap<String, Arc<CompiledPattern>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
}

impl PatternCache {
    pub fn new(max_size: usize) -> PatternCache {
        PatternCache {
            max_size,
            inner: RwLock::new(Inner {
                map: FxHashMap::default(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn get(&self, pattern: &str) -> Option<Arc<CompiledPattern>> {
        self.inner.read().map.get(pattern).cloned()
    }

    pub fn insert(&self, pattern: String, compiled: Arc<CompiledPattern>) {
        if self.max_size == 0 {
            return;
        }
        let mut inner = self.inner.write();
        if inner.map.contains_key(&pattern) {
            return;
        }
        while inner.map.len() >= self.max_size {
            match inner.order.pop_front() {
                None => break,
                Some(oldest) => {
                    inner.map.remove(&oldest);
                }
            }
        }
        inner.order.push_back(pattern.clone());
        inner.map.insert(pattern, compiled);
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.map.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CompiledPattern;

    fn compiled(pattern: &str) -> Arc<CompiledPattern> {
        Arc::new(CompiledPattern::for_tests(pattern))
    }

    #[test]
    fn get_returns_inserted_value() {
        let cache = PatternCache::new(4);
        cache.insert("a+".to_string(), compiled("a+"));
        assert!(cache.get("a+").is_some());
        assert!(cache.get("b+").is_none());
    }

    #[test]
    fn size_never_exceeds_bound() {
        let cache = PatternCache::new(3);
        for i in 0..10 {
            let pattern = format!("p{}", i);
            cache.insert(pattern.clone(), compiled(&pattern));
            assert!(cache.len() <= 3);
        }
        assert_eq!(3, cache.len());
    }

    #[test]
    fn evicts_oldest_first() {
        let cache = PatternCache::new(2);
        cache.insert("first".to_string(), compiled("first"));
        cache.insert("second".to_string(), compiled("second"));
        cache.insert("third".to_string(), compiled("third"));
        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn reinsert_does_not_duplicate() {
        let cache = PatternCache::new(2);
        cache.insert("a".to_string(), compiled("a"));
        cache.insert("a".to_string(), compiled("a"));
        assert_eq!(1, cache.len());
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = PatternCache::new(2);
        cache.insert("a".to_string(), compiled("a"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
