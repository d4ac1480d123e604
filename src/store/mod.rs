//! Entity storage subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     config-seeded rules/servers
//!     → static partition (immutable, never evicted)
//!
//! Administrative API:
//!     Save/Remove
//!     → dynamic partition (size/TTL-bounded LRU behind a RwLock)
//!
//! Proxy hot path:
//!     get_all() → union snapshot (dynamic first, static appended)
//!     get(id)   → static scan first, then cache
//!
//! Proxy pipeline:
//!     matched exchanges → exchange cache (LRU + TTL, keyed by correlation id)
//! ```
//!
//! # Design Decisions
//! - Readers get owned snapshots (copy-on-read); internal collections are
//!   never handed out by reference
//! - Static entries are immutable by construction: Save/Remove against them
//!   is rejected, so the static partition needs no locking at all
//! - Random entity ids come from an injectable source so tests stay
//!   deterministic

pub mod exchanges;
pub mod hybrid;
pub mod lru;
pub mod rules;
pub mod servers;

pub use exchanges::ExchangeCache;
pub use hybrid::{Entity, HybridStore, IdSource, RandomIds};
pub use rules::RuleStore;
pub use servers::ServerStore;
