//! Shared test doubles for the Yonkoma comic studio.

mod clock;
mod ids;
mod journal;

pub use clock::{FixedClock, fixed_now};
pub use ids::SequentialIds;
pub use journal::{FailingEventJournal, FlakyEventJournal, RecordingEventJournal};
