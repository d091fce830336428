//! Clock and identifier seams.
//!
//! Everything that would otherwise make a session non-reproducible (wall
//! time, freshly minted UUIDs) goes through these traits. Production code
//! uses the system implementations; tests inject fixed ones so that two runs
//! produce identical event journals.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Abstraction over system time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of opaque unique identifiers.
///
/// Takes `&self` so one source can be shared by concurrently running
/// operations; implementations use interior mutability when they keep state.
pub trait IdSource: Send + Sync {
    /// Returns an identifier never handed out before by this source.
    fn next_id(&self) -> Uuid;
}

/// Production identifier source backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
