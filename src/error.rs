//! Store mutation errors.
//!
//! # Responsibilities
//! - Distinguish the rejection reasons for Save/Remove on the entity stores
//! - Carry enough context for the admin API to map to an HTTP status
//!
//! # Design Decisions
//! - Proxy-path failures (parse, no match) are NOT errors; they degrade to
//!   the default route inside the pipeline and never reach this type

use thiserror::Error;

/// Rejection reasons for mutations on the rule and server stores.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Target id belongs to the config-seeded partition.
    #[error("cannot modify system entity")]
    SystemEntity,

    /// Target is a dynamic entry flagged read-only.
    #[error("cannot modify read-only entity")]
    ReadOnly,

    /// Target id resolves to neither partition.
    #[error("not found")]
    NotFound,

    /// Server name collides with another entry (case-insensitive).
    #[error("invalid name: server name must be unique")]
    DuplicateName,
}
