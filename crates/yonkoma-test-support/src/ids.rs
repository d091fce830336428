//! Test ids — a deterministic `IdSource`.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;
use yonkoma_core::determinism::IdSource;

/// Hands out `Uuid::from_u128(start)`, `Uuid::from_u128(start + 1)`, ...
///
/// Two sources built with the same start produce the same sequence, which
/// is what makes journal comparisons between runs meaningful.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a source whose first id is `Uuid::from_u128(start)`.
    #[must_use]
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Returns the id `offset` steps after `start` without consuming it.
    #[must_use]
    pub fn nth(start: u64, offset: u64) -> Uuid {
        Uuid::from_u128(u128::from(start + offset))
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}
