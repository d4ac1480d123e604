//! Domain model for routing decisions.
//!
//! # Data Flow
//! ```text
//! config (routes.servers / routes.rules)
//!     → server.rs / rule.rs conversion (compile regexes, build transports)
//!     → static partitions of the entity stores
//!
//! Incoming request body
//!     → rule.rs matching (remote addr → service → regex, priority ordered)
//!     → server.rs lookup (destination by name, transport by host)
//!     → exchange.rs record (cached request/response pair)
//! ```
//!
//! # Design Decisions
//! - Rules and servers are plain cloneable values; stores hand out snapshots,
//!   never references into shared mutable state
//! - Matching is chainable AND across filter stages, OR within one stage
//! - Empty condition = always matches (wildcard)

pub mod exchange;
pub mod rule;
pub mod server;

pub use exchange::Exchange;
pub use rule::{Replacement, Rule, RuleSet};
pub use server::{HttpsClient, ProxyServer, ProxyServers};
