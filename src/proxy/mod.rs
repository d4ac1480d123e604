//! Proxy pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! POST {context_path}
//!     → server.rs (buffer body, remote addr)
//!     → pipeline.rs director (envelope → rules → destination → rewrite,
//!       exchange created, correlation headers attached)
//!     → transport.rs (client for the destination host)
//!     → upstream round-trip
//!     → pipeline.rs response modifier (rule by carried id → rewrite,
//!       exchange completed)
//!     → client
//! ```
//!
//! # Design Decisions
//! - The director and the response modifier are separate phases that share
//!   no stack state; the correlation headers on the outbound request are the
//!   only cross-phase channel
//! - Every degenerate path (unparseable envelope, no matching rule, unknown
//!   destination) converges on the default server with the body untouched;
//!   rule-engine failures never fail the HTTP exchange

pub mod pipeline;
pub mod server;
pub mod transport;

pub use pipeline::{Pipeline, DEFAULT_CONTEXT_PATH, REQUEST_ID_HEADER, RULE_ID_HEADER};
pub use server::{build_proxy_router, AppState};
pub use transport::TransportSwitch;
