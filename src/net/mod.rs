//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Listener side:
//!     config [server.tls]
//!     → tls.rs (load PEM cert/key)
//!     → axum-server rustls acceptor
//!
//! Client side:
//!     per-server TLS block (ca/cert/key files, or inline PEM via the API)
//!     → tls.rs (rustls ClientConfig with client auth)
//!     → dedicated hyper client for that backend
//!
//!     no TLS block
//!     → process default client (webpki roots, no client auth)
//! ```
//!
//! # Design Decisions
//! - One client per trust domain: backends demanding distinct client
//!   certificates never share a connection pool
//! - TLS material is loaded once at construction; rotation means replacing
//!   the server entry

pub mod tls;
