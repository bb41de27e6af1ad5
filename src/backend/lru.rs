//! LRU Index Module
//!
//! Tracks access recency for the in-memory backend's capacity eviction.

use std::collections::{BTreeMap, HashMap};

// == LRU Index ==
/// Access-order index keyed by a logical clock.
///
/// Each touch stamps the key with the next tick; the smallest tick is the
/// least recently used key.
#[derive(Debug, Default)]
pub struct LruIndex {
    ticks: HashMap<String, u64>,
    order: BTreeMap<u64, String>,
    clock: u64,
}

impl LruIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, adding it if new.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        if let Some(old) = self.ticks.insert(key.to_string(), self.clock) {
            self.order.remove(&old);
        }
        self.order.insert(self.clock, key.to_string());
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruIndex::new();
        assert!(lru.is_empty());
    }

    #[test]
    fn test_evict_in_insertion_order() {
        let mut lru = LruIndex::new();
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_touch_refreshes_recency() {
        let mut lru = LruIndex::new();
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_repeated_touch_tracks_once() {
        let mut lru = LruIndex::new();
        lru.touch("a");
        lru.touch("a");
        lru.touch("a");
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut lru = LruIndex::new();
        lru.touch("a");
        lru.touch("b");
        lru.remove("a");
        lru.remove("missing");
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));

        lru.touch("c");
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
    }
}
