//! Size- and TTL-bounded LRU cache.
//!
//! # Responsibilities
//! - Back the dynamic partitions of the entity stores and the exchange cache
//! - Evict least-recently-used entries beyond capacity
//! - Drop entries past their time-to-live
//!
//! # Design Decisions
//! - Plain map + recency vector under one lock owned by the caller; small
//!   capacities (hundreds) make O(n) recency updates a non-issue
//! - Expired entries are purged on insert and filtered on read, so a stale
//!   entry is never observable even before its slot is reclaimed

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct TimedEntry<V> {
    value: V,
    stored_at: Instant,
}

/// LRU cache with optional per-entry TTL.
pub struct LruCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    entries: HashMap<K, TimedEntry<V>>,
    /// Keys ordered least- to most-recently used.
    order: Vec<K>,
}

impl<K: Clone + Eq + Hash, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::with_capacity(capacity.max(1)),
            order: Vec::with_capacity(capacity.max(1)),
        }
    }

    fn is_expired(&self, entry: &TimedEntry<V>) -> bool {
        match self.ttl {
            Some(ttl) => entry.stored_at.elapsed() >= ttl,
            None => false,
        }
    }

    /// Look up a key, refreshing its recency.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => self.is_expired(entry),
            None => return None,
        };
        if expired {
            self.remove(key);
            return None;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Upsert a key, evicting the least-recently-used entry beyond capacity.
    pub fn insert(&mut self, key: K, value: V) {
        self.purge_expired();

        if self.entries.contains_key(&key) {
            if let Some(pos) = self.order.iter().position(|k| k == &key) {
                self.order.remove(pos);
            }
        } else if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.first().cloned() {
                self.entries.remove(&oldest);
                self.order.remove(0);
            }
        }

        self.entries.insert(
            key.clone(),
            TimedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
        self.order.push(key);
    }

    pub fn remove(&mut self, key: &K) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        true
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

    /// Unexpired values, least-recently-used first. Does not refresh recency.
    pub fn values(&self) -> Vec<V> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k))
            .filter(|e| !self.is_expired(e))
            .map(|e| e.value.clone())
            .collect()
    }

    /// Unexpired keys, least-recently-used first. Does not refresh recency.
    pub fn keys(&self) -> Vec<K> {
        self.order
            .iter()
            .filter(|k| {
                self.entries
                    .get(*k)
                    .map(|e| !self.is_expired(e))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn purge_expired(&mut self) {
        if self.ttl.is_none() {
            return;
        }
        let expired: Vec<K> = self
            .order
            .iter()
            .filter(|k| {
                self.entries
                    .get(*k)
                    .map(|e| self.is_expired(e))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }
}
