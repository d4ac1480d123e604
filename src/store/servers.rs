//! Server store.
//!
//! # Responsibilities
//! - Resolve the default server, destinations by name and owners by host
//! - Enforce case-insensitive name uniqueness across both partitions
//!
//! # Design Decisions
//! - The uniqueness check runs against the full union so a dynamic entry can
//!   never shadow a config-seeded server

use std::sync::Arc;
use std::time::Duration;

use crate::domain::server::{ProxyServer, ProxyServers};
use crate::error::StoreError;
use crate::store::hybrid::{Entity, HybridStore, IdSource};

/// Dynamic partition bound; servers are few, this is generous.
pub const DEFAULT_CACHE_SIZE: usize = 100;

impl Entity for ProxyServer {
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

pub struct ServerStore {
    inner: HybridStore<ProxyServer>,
}

impl ServerStore {
    pub fn new(fixed: Vec<ProxyServer>, ttl: Option<Duration>, ids: Arc<dyn IdSource>) -> Self {
        Self {
            inner: HybridStore::new(fixed, DEFAULT_CACHE_SIZE, ttl, ids),
        }
    }

    pub fn get_all(&self) -> ProxyServers {
        ProxyServers::new(self.inner.get_all())
    }

    pub fn get(&self, id: i64) -> Option<ProxyServer> {
        self.inner.get(id)
    }

    pub fn default_server(&self) -> Option<ProxyServer> {
        self.get_all().default_server().cloned()
    }

    pub fn find(&self, name: &str) -> Option<ProxyServer> {
        self.get_all().find(name).cloned()
    }

    /// Owner of `host[:port]`, for transport selection.
    pub fn find_by_host(&self, authority: &str) -> Option<ProxyServer> {
        self.get_all().find_by_host(authority).cloned()
    }

    pub fn save(&self, server: ProxyServer) -> Result<ProxyServer, StoreError> {
        if server.id != 0 && self.inner.is_fixed(server.id) {
            return Err(StoreError::SystemEntity);
        }
        if !self.is_unique_name(&server) {
            return Err(StoreError::DuplicateName);
        }
        self.inner.save(server)
    }

    pub fn remove(&self, id: i64) -> bool {
        self.inner.remove(id)
    }

    fn is_unique_name(&self, candidate: &ProxyServer) -> bool {
        !self
            .get_all()
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(&candidate.name) && s.id != candidate.id)
    }
}
