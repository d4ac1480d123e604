//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (structured logs)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Log filter comes from RUST_LOG when set, from config otherwise
//! - Metric updates are cheap enough for the hot path; the exporter is
//!   opt-in and lives on its own listener

pub mod logging;
pub mod metrics;
