//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build stores/pipeline → Start listeners
//!
//! Shutdown:
//!     SIGTERM/SIGINT (signals.rs)
//!     → Shutdown coordinator (shutdown.rs)
//!     → every listener drains and exits
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the signal out to however many listeners
//!   the configuration enabled

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
