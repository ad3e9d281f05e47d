//! Specialized collection types

use std::collections::HashMap;
use std::hash::Hash;

pub use slotmap::{new_key_type, SlotMap};

/// Bounded least-recently-used cache.
///
/// Backed by a hash map plus an intrusive doubly-linked list over a slab of
/// entries. Both lookup and insert are O(1); when the cache is full the
/// least recently touched entry is evicted.
#[derive(Debug)]
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    entries: Vec<Entry<K, V>>,
    capacity: usize,
    head: Option<usize>,
    tail: Option<usize>,
    free: Vec<usize>,
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K: Clone + Eq + Hash, V> LruCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            capacity,
            head: None,
            tail: None,
            free: Vec::new(),
        }
    }

    /// Number of entries currently cached
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a key, marking it as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let index = *self.map.get(key)?;
        self.touch(index);
        Some(&self.entries[index].value)
    }

    /// Look up a key without refreshing its recency
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|&index| &self.entries[index].value)
    }

    /// Insert or replace a value, evicting the least recently used entry if full
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(&index) = self.map.get(&key) {
            self.entries[index].value = value;
            self.touch(index);
            return;
        }

        if self.map.len() >= self.capacity {
            self.evict_tail();
        }

        let entry = Entry {
            key: key.clone(),
            value,
            prev: None,
            next: self.head,
        };
        let index = if let Some(slot) = self.free.pop() {
            self.entries[slot] = entry;
            slot
        } else {
            self.entries.push(entry);
            self.entries.len() - 1
        };

        if let Some(head) = self.head {
            self.entries[head].prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
        self.map.insert(key, index);
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.map.clear();
        self.entries.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    fn touch(&mut self, index: usize) {
        if self.head == Some(index) {
            return;
        }
        self.unlink(index);
        self.entries[index].prev = None;
        self.entries[index].next = self.head;
        if let Some(head) = self.head {
            self.entries[head].prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = (self.entries[index].prev, self.entries[index].next);
        match prev {
            Some(p) => self.entries[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n].prev = prev,
            None => self.tail = prev,
        }
        self.entries[index].prev = None;
        self.entries[index].next = None;
    }

    fn evict_tail(&mut self) {
        if let Some(tail) = self.tail {
            let key = self.entries[tail].key.clone();
            self.map.remove(&key);
            self.unlink(tail);
            self.free.push(tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_insert_and_get() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_evicts_least_recent() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.get(&"a"); // refresh "a"; "b" is now the eviction candidate
        cache.insert("c", 3);
        assert_eq!(cache.peek(&"b"), None);
        assert_eq!(cache.peek(&"a"), Some(&1));
        assert_eq!(cache.peek(&"c"), Some(&3));
    }

    #[test]
    fn test_lru_replace_existing() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("a", 5);
        assert_eq!(cache.get(&"a"), Some(&5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(4);
        cache.insert(1, "x");
        cache.clear();
        assert!(cache.is_empty());
    }
}
