//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors shared by every layer that touches aggregates or the journal.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Optimistic concurrency conflict while appending to a stream.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version the writer believed was current.
        expected: i64,
        /// The version actually stored.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The journal or another piece of infrastructure failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// An event payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
