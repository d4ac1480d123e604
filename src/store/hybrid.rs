//! Two-partition entity store.
//!
//! # Responsibilities
//! - Merge the immutable config-seeded partition with the mutable,
//!   size/TTL-bounded partition of API-managed entities
//! - Guard mutations: system entities and read-only entries are rejected
//! - Assign fresh random ids on create
//!
//! # Design Decisions
//! - Lookup checks the static partition first; config sets are small enough
//!   that a linear scan beats any indexing
//! - Ids stay below 2^53 so JSON consumers read them exactly
//! - Collisions in the 53-bit id space are treated as negligible

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::lru::LruCache;

/// Largest id that survives an f64 round-trip, `(1 << 53) - 1`.
pub const MAX_SAFE_ID: i64 = 9_007_199_254_740_991;

/// An entity the hybrid store can manage.
pub trait Entity: Clone {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn read_only(&self) -> bool;
}

/// Source of generated identifiers, injectable for deterministic tests.
pub trait IdSource: Send + Sync {
    /// Fresh id for a created entity.
    fn entity_id(&self) -> i64;
    /// Correlation id joining the request and response phases of one
    /// proxied exchange.
    fn correlation_id(&self) -> String;
}

/// Production id source backed by the thread-local RNG.
pub struct RandomIds;

impl IdSource for RandomIds {
    fn entity_id(&self) -> i64 {
        fastrand::i64(1..=MAX_SAFE_ID)
    }

    fn correlation_id(&self) -> String {
        fastrand::u64(..).to_string()
    }
}

/// Config-seeded static partition plus an LRU/TTL-bounded dynamic partition.
pub struct HybridStore<T: Entity> {
    fixed: Vec<T>,
    cache: RwLock<LruCache<i64, T>>,
    ids: Arc<dyn IdSource>,
}

impl<T: Entity> HybridStore<T> {
    pub fn new(
        fixed: Vec<T>,
        capacity: usize,
        ttl: Option<Duration>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            fixed,
            cache: RwLock::new(LruCache::new(capacity, ttl)),
            ids,
        }
    }

    /// Union snapshot: dynamic entries first, static entries appended.
    pub fn get_all(&self) -> Vec<T> {
        let mut result = self.cache.read().values();
        result.extend(self.fixed.iter().cloned());
        result
    }

    /// Lookup by id, static partition first.
    pub fn get(&self, id: i64) -> Option<T> {
        if let Some(entity) = self.fixed_by_id(id) {
            return Some(entity.clone());
        }
        self.cache.write().get(&id)
    }

    pub(crate) fn is_fixed(&self, id: i64) -> bool {
        self.fixed_by_id(id).is_some()
    }

    fn fixed_by_id(&self, id: i64) -> Option<&T> {
        self.fixed.iter().find(|e| e.id() == id)
    }

    /// Create (id 0) or update (existing dynamic id) an entity.
    pub fn save(&self, mut entity: T) -> Result<T, StoreError> {
        if entity.id() == 0 {
            entity.set_id(self.ids.entity_id());
            self.cache.write().insert(entity.id(), entity.clone());
            return Ok(entity);
        }

        if self.is_fixed(entity.id()) {
            return Err(StoreError::SystemEntity);
        }

        let mut cache = self.cache.write();
        match cache.get(&entity.id()) {
            Some(existing) if existing.read_only() => Err(StoreError::ReadOnly),
            Some(_) => {
                cache.insert(entity.id(), entity.clone());
                Ok(entity)
            }
            None => Err(StoreError::NotFound),
        }
    }

    /// Evict a dynamic entity. Returns false for missing, static or
    /// read-only targets.
    pub fn remove(&self, id: i64) -> bool {
        if self.is_fixed(id) {
            return false;
        }

        let mut cache = self.cache.write();
        match cache.get(&id) {
            Some(existing) if existing.read_only() => false,
            Some(_) => cache.remove(&id),
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Item {
        pub id: i64,
        pub name: String,
        pub read_only: bool,
    }

    impl Entity for Item {
        fn id(&self) -> i64 {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
        fn read_only(&self) -> bool {
            self.read_only
        }
    }

    /// Deterministic id source handing out sequential ids.
    pub(crate) struct SequentialIds(pub AtomicI64);

    impl SequentialIds {
        pub(crate) fn starting_at(first: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(first)))
        }
    }

    impl IdSource for SequentialIds {
        fn entity_id(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
        fn correlation_id(&self) -> String {
            self.entity_id().to_string()
        }
    }

    fn item(id: i64, name: &str, read_only: bool) -> Item {
        Item {
            id,
            name: name.to_string(),
            read_only,
        }
    }

    fn store_with_fixed() -> HybridStore<Item> {
        HybridStore::new(
            vec![item(1, "system", true)],
            4,
            None,
            SequentialIds::starting_at(1000),
        )
    }

    #[test]
    fn test_create_assigns_fresh_id_and_round_trips() {
        let store = store_with_fixed();
        let saved = store.save(item(0, "created", false)).unwrap();
        assert_eq!(saved.id, 1000);

        let fetched = store.get(saved.id).unwrap();
        assert_eq!(fetched, saved);
    }

    #[test]
    fn test_save_over_static_entity_is_rejected() {
        let store = store_with_fixed();
        let err = store.save(item(1, "overwrite", false)).unwrap_err();
        assert_eq!(err, StoreError::SystemEntity);
        // idempotently rejected regardless of payload
        let err = store.save(item(1, "other-payload", true)).unwrap_err();
        assert_eq!(err, StoreError::SystemEntity);
    }

    #[test]
    fn test_save_over_read_only_dynamic_entity_is_rejected() {
        let store = store_with_fixed();
        let saved = store.save(item(0, "locked", true)).unwrap();
        let err = store.save(item(saved.id, "update", false)).unwrap_err();
        assert_eq!(err, StoreError::ReadOnly);
    }

    #[test]
    fn test_save_unknown_id_is_not_found() {
        let store = store_with_fixed();
        let err = store.save(item(4242, "ghost", false)).unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[test]
    fn test_update_existing_dynamic_entity() {
        let store = store_with_fixed();
        let saved = store.save(item(0, "first", false)).unwrap();
        let updated = store.save(item(saved.id, "second", false)).unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(store.get(saved.id).unwrap().name, "second");
    }

    #[test]
    fn test_remove_rejects_static_read_only_and_missing() {
        let store = store_with_fixed();
        assert!(!store.remove(1)); // static
        assert!(!store.remove(4242)); // missing

        let locked = store.save(item(0, "locked", true)).unwrap();
        assert!(!store.remove(locked.id)); // read-only

        let open = store.save(item(0, "open", false)).unwrap();
        assert!(store.remove(open.id));
        assert!(store.get(open.id).is_none());
    }

    #[test]
    fn test_get_all_lists_dynamic_before_static() {
        let store = store_with_fixed();
        store.save(item(0, "dynamic", false)).unwrap();

        let all = store.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "dynamic");
        assert_eq!(all[1].name, "system");
    }

    #[test]
    fn test_static_entries_survive_cache_pressure() {
        let store = HybridStore::new(
            vec![item(1, "system", true)],
            2,
            None,
            SequentialIds::starting_at(1000),
        );
        for _ in 0..5 {
            store.save(item(0, "filler", false)).unwrap();
        }
        let all = store.get_all();
        // dynamic partition capped at 2, static entry still present
        assert_eq!(all.len(), 3);
        assert!(store.get(1).is_some());
    }
}
