//! Rule-based reverse proxy for X-Road SOAP services.
//!
//! Inspects the XML envelope of inbound requests, matches the extracted
//! service identity (plus remote address and body regexes) against a
//! prioritized rule set, rewrites bodies per rule, and forwards the request
//! to one of several backends, each potentially demanding its own TLS client
//! identity. Matched exchanges are cached for operator inspection through an
//! administrative API.

// Core subsystems
pub mod config;
pub mod domain;
pub mod proxy;
pub mod soap;
pub mod store;

// Cross-cutting concerns
pub mod api;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ProxyConf;
pub use error::StoreError;
pub use lifecycle::Shutdown;
pub use proxy::{Pipeline, TransportSwitch};
