//! Bounded in-memory cache in front of the persistent store.
//!
//! Eviction is by insertion order, not access order: reads never reorder
//! entries and updating a resident key keeps its original slot. When the
//! cache is full, every `set` evicts the oldest entry first, even when the
//! key being set is already resident.

use std::collections::VecDeque;

use hashbrown::HashMap;

/// Insertion-ordered cache with a fixed capacity.
///
/// Not synchronized; the engine wraps it in a mutex.
#[derive(Debug)]
pub struct BoundedCache {
    entries: HashMap<Vec<u8>, Vec<u8>>,
    /// Keys oldest-first. Always holds exactly the keys of `entries`.
    order: VecDeque<Vec<u8>>,
    capacity: usize,
}

impl BoundedCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or update `key`.
    ///
    /// Returns the evicted key, if any.
    pub fn set(&mut self, key: &[u8], value: &[u8]) -> Option<Vec<u8>> {
        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        match self.entries.get_mut(key) {
            Some(slot) => {
                slot.clear();
                slot.extend_from_slice(value);
            }
            None => {
                self.entries.insert(key.to_vec(), value.to_vec());
                self.order.push_back(key.to_vec());
            }
        }
        evicted
    }

    fn evict_oldest(&mut self) -> Option<Vec<u8>> {
        let oldest = self.order.pop_front()?;
        self.entries.remove(&oldest);
        Some(oldest)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident keys, oldest-inserted first.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.order.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut cache = BoundedCache::new(2);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        let evicted = cache.set(b"c", b"3");

        assert_eq!(evicted, Some(b"a".to_vec()));
        assert!(!cache.contains(b"a"));
        assert_eq!(cache.get(b"b"), Some(&b"2"[..]));
        assert_eq!(cache.get(b"c"), Some(&b"3"[..]));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_access_does_not_reorder() {
        let mut cache = BoundedCache::new(2);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        // A true LRU would now evict "b"
        assert!(cache.get(b"a").is_some());
        cache.set(b"c", b"3");
        assert!(!cache.contains(b"a"));
        assert!(cache.contains(b"b"));
    }

    #[test]
    fn test_update_keeps_position() {
        let mut cache = BoundedCache::new(3);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        cache.set(b"a", b"1-new");
        let keys: Vec<&[u8]> = cache.keys().collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..]]);
        assert_eq!(cache.get(b"a"), Some(&b"1-new"[..]));
    }

    #[test]
    fn test_update_at_capacity_still_evicts() {
        let mut cache = BoundedCache::new(2);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        let evicted = cache.set(b"b", b"2-new");
        assert_eq!(evicted, Some(b"a".to_vec()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(b"b"), Some(&b"2-new"[..]));
    }

    #[test]
    fn test_update_of_oldest_at_capacity_moves_it_to_back() {
        let mut cache = BoundedCache::new(2);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        cache.set(b"a", b"1-new");
        let keys: Vec<&[u8]> = cache.keys().collect();
        assert_eq!(keys, vec![&b"b"[..], &b"a"[..]]);
    }

    #[test]
    fn test_clear() {
        let mut cache = BoundedCache::new(4);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.keys().count(), 0);
    }

    #[test]
    fn test_zero_capacity_is_one() {
        let mut cache = BoundedCache::new(0);
        cache.set(b"a", b"1");
        cache.set(b"b", b"2");
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(b"b"));
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(
            capacity in 1usize..8,
            keys in proptest::collection::vec(0u8..16, 0..64),
        ) {
            let mut cache = BoundedCache::new(capacity);
            for k in keys {
                cache.set(&[k], &[k, k]);
                prop_assert!(cache.len() <= capacity);
                prop_assert_eq!(cache.keys().count(), cache.len());
                prop_assert_eq!(cache.get(&[k]), Some(&[k, k][..]));
            }
        }
    }
}
