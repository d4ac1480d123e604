//! Rule store.
//!
//! # Responsibilities
//! - Expose the hybrid rule partition union as a matchable `RuleSet`
//! - Guard mutations from the administrative API

use std::sync::Arc;
use std::time::Duration;

use crate::domain::rule::{Rule, RuleSet};
use crate::error::StoreError;
use crate::store::hybrid::{Entity, HybridStore, IdSource};

/// Dynamic partition bound used when configuration supplies none.
pub const DEFAULT_CACHE_SIZE: usize = 200;

impl Entity for Rule {
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

pub struct RuleStore {
    inner: HybridStore<Rule>,
}

impl RuleStore {
    /// `fixed` holds the config-seeded rules; `capacity`/`ttl` bound the
    /// dynamic partition (`0` capacity falls back to the default).
    pub fn new(
        fixed: Vec<Rule>,
        capacity: usize,
        ttl: Option<Duration>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CACHE_SIZE
        } else {
            capacity
        };
        Self {
            inner: HybridStore::new(fixed, capacity, ttl, ids),
        }
    }

    pub fn get_all(&self) -> RuleSet {
        RuleSet::new(self.inner.get_all())
    }

    pub fn get(&self, id: i64) -> Option<Rule> {
        self.inner.get(id)
    }

    pub fn save(&self, rule: Rule) -> Result<Rule, StoreError> {
        self.inner.save(rule)
    }

    pub fn remove(&self, id: i64) -> bool {
        self.inner.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::hybrid::tests::SequentialIds;

    fn rule(service: &str, priority: i64) -> Rule {
        Rule {
            id: 0,
            server: "mock".to_string(),
            service: service.to_string(),
            priority,
            matcher_remote_addr: Vec::new(),
            matcher_regex: Vec::new(),
            request_replacements: Vec::new(),
            response_replacements: Vec::new(),
            read_only: false,
        }
    }

    #[test]
    fn test_save_then_get_round_trips_fields() {
        let store = RuleStore::new(Vec::new(), 8, None, SequentialIds::starting_at(50));
        let mut r = rule("rr.rr456.v1", 100);
        r.matcher_remote_addr = vec!["10.".to_string()];
        let saved = store.save(r).unwrap();

        let fetched = store.get(saved.id).unwrap();
        assert_eq!(fetched.service, "rr.rr456.v1");
        assert_eq!(fetched.priority, 100);
        assert_eq!(fetched.matcher_remote_addr, vec!["10.".to_string()]);
        assert!(!fetched.read_only);
    }

    #[test]
    fn test_union_is_matchable() {
        let mut seeded = rule("rr.rr456.v1", 10);
        seeded.id = 1;
        seeded.read_only = true;
        let store = RuleStore::new(vec![seeded], 8, None, SequentialIds::starting_at(50));
        store.save(rule("rr.rr456.v1", 100)).unwrap();

        let matched = store
            .get_all()
            .match_service("rr.rr456.v1")
            .match_regex(b"<x/>")
            .unwrap();
        assert_eq!(matched.priority, 100);
    }
}
