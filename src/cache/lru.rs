//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::HashMap;

const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Node {
    key: String,
    prev: usize,
    next: usize,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// A doubly-linked list stored in a slab, plus a key index, so touch,
/// remove and evict are all O(1):
/// - head = least recently used
/// - tail = most recently used
#[derive(Debug)]
pub struct LruTracker {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    head: usize,
    tail: usize,
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if absent.
    pub fn touch(&mut self, key: &str) {
        if let Some(&slot) = self.index.get(key) {
            if slot != self.tail {
                self.unlink(slot);
                self.push_tail(slot);
            }
            return;
        }

        let node = Node {
            key: key.to_string(),
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(key.to_string(), slot);
        self.push_tail(slot);
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.release(slot);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        if self.head == NIL {
            return None;
        }
        let slot = self.head;
        let key = std::mem::take(&mut self.nodes[slot].key);
        self.index.remove(&key);
        self.release(slot);
        Some(key)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let node = &self.nodes[cursor];
            cursor = node.next;
            Some(node.key.as_str())
        })
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    fn release(&mut self, slot: usize) {
        self.unlink(slot);
        self.nodes[slot].key.clear();
        self.free.push(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.nodes[next].prev = prev;
        }
        self.nodes[slot].prev = NIL;
        self.nodes[slot].next = NIL;
    }

    fn push_tail(&mut self, slot: usize) {
        self.nodes[slot].prev = self.tail;
        self.nodes[slot].next = NIL;
        if self.tail == NIL {
            self.head = slot;
        } else {
            self.nodes[self.tail].next = slot;
        }
        self.tail = slot;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn order(lru: &LruTracker) -> Vec<&str> {
        lru.iter().collect()
    }

    fn tracker(keys: &[&str]) -> LruTracker {
        let mut lru = LruTracker::new();
        for key in keys {
            lru.touch(key);
        }
        lru
    }

    #[test]
    fn test_empty_tracker() {
        let mut lru = LruTracker::default();
        assert!(lru.is_empty());
        assert_eq!(lru.iter().next(), None);
        assert_eq!(lru.evict_oldest(), None);
        assert!(!lru.remove("ghost"));
    }

    #[test]
    fn test_insertion_order_is_recency_order() {
        let lru = tracker(&["user:1", "user:2", "user:3"]);

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.iter().next(), Some("user:1"));
        assert_eq!(order(&lru), vec!["user:1", "user:2", "user:3"]);
    }

    #[test]
    fn test_touch_moves_key_to_most_recent() {
        let mut lru = tracker(&["user:1", "user:2", "user:3"]);

        lru.touch("user:1");

        assert_eq!(order(&lru), vec!["user:2", "user:3", "user:1"]);
        // Touching the current tail is a no-op
        lru.touch("user:1");
        assert_eq!(order(&lru), vec!["user:2", "user:3", "user:1"]);
    }

    #[test]
    fn test_evict_drains_in_recency_order() {
        let mut lru = tracker(&["a", "b", "c", "a", "c", "b"]);

        let drained: Vec<String> = std::iter::from_fn(|| lru.evict_oldest()).collect();
        assert_eq!(drained, vec!["a", "c", "b"]);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_remove_middle_head_and_tail() {
        let mut lru = tracker(&["a", "b", "c", "d"]);

        assert!(lru.remove("b"));
        assert_eq!(order(&lru), vec!["a", "c", "d"]);

        assert!(lru.remove("a"));
        assert!(lru.remove("d"));
        assert_eq!(order(&lru), vec!["c"]);

        lru.touch("e");
        assert_eq!(order(&lru), vec!["c", "e"]);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut lru = LruTracker::new();

        for i in 0..10 {
            lru.touch(&format!("k{}", i));
        }
        for _ in 0..10 {
            lru.evict_oldest();
        }
        for i in 0..10 {
            lru.touch(&format!("n{}", i));
        }

        assert_eq!(lru.nodes.len(), 10);
        assert_eq!(lru.iter().next(), Some("n0"));
    }

    #[test]
    fn test_clear_resets_links() {
        let mut lru = tracker(&["a", "b"]);
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.iter().next(), None);
        lru.touch("c");
        assert_eq!(order(&lru), vec!["c"]);
    }
}
