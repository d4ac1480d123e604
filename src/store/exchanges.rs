//! Exchange cache.
//!
//! # Responsibilities
//! - Hold matched request/response pairs for operator inspection
//! - Evict by LRU under size pressure and by TTL over time
//!
//! # Design Decisions
//! - Lossy by design: the response phase tolerates a missing entry, so
//!   eviction never has to coordinate with in-flight requests

use std::time::Duration;

use parking_lot::RwLock;

use crate::domain::exchange::Exchange;
use crate::store::lru::LruCache;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(90 * 60);

/// Size- and TTL-bounded store of proxied exchanges, keyed by correlation id.
pub struct ExchangeCache {
    cache: RwLock<LruCache<String, Exchange>>,
}

impl ExchangeCache {
    /// `0` capacity or a zero TTL fall back to the defaults.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        Self {
            cache: RwLock::new(LruCache::new(capacity, Some(ttl))),
        }
    }

    /// Upsert: both the request phase (create) and the response phase
    /// (complete) land here.
    pub fn set(&self, exchange: Exchange) {
        self.cache.write().insert(exchange.id.clone(), exchange);
    }

    pub fn get(&self, id: &str) -> Option<Exchange> {
        self.cache.write().get(&id.to_string())
    }

    pub fn get_all(&self) -> Vec<Exchange> {
        self.cache.read().values()
    }

    pub fn get_all_ids(&self) -> Vec<String> {
        self.cache.read().keys()
    }

    /// Operator action from the administrative surface.
    pub fn delete_all(&self) {
        self.cache.write().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl Default for ExchangeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
