//! Test journals — mock `EventJournal` implementations for tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;
use yonkoma_core::error::DomainError;
use yonkoma_core::journal::{EventJournal, StoredEvent};

/// A journal that records every append and serves them back from
/// `load_events`. Appends always succeed; no version checks are made.
#[derive(Debug, Default)]
pub struct RecordingEventJournal {
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventJournal {
    /// Creates an empty recording journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every `append_events` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns the event types of every appended event, in append order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_types(&self) -> Vec<String> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, _, events)| events.iter().map(|e| e.event_type.clone()))
            .collect()
    }
}

#[async_trait]
impl EventJournal for RecordingEventJournal {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .appended
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| *id == aggregate_id)
            .flat_map(|(_, _, events)| events.iter().cloned())
            .collect())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// A journal that always returns an infrastructure error. Useful for
/// testing that a rejected append leaves the aggregate untouched.
#[derive(Debug)]
pub struct FailingEventJournal;

#[async_trait]
impl EventJournal for FailingEventJournal {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("journal unavailable".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("journal unavailable".into()))
    }
}

/// A recording journal that refuses chosen appends, counted from 1.
/// Refused appends are not recorded.
#[derive(Debug, Default)]
pub struct FlakyEventJournal {
    inner: RecordingEventJournal,
    refused: HashSet<usize>,
    attempts: AtomicUsize,
}

impl FlakyEventJournal {
    /// Creates a journal that refuses the appends numbered in `refused`.
    #[must_use]
    pub fn refusing(refused: impl IntoIterator<Item = usize>) -> Self {
        Self {
            refused: refused.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Number of `append_events` calls made so far, refused ones included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Event types of the accepted appends.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.inner.event_types()
    }
}

#[async_trait]
impl EventJournal for FlakyEventJournal {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refused.contains(&attempt) {
            return Err(DomainError::Infrastructure(format!(
                "append {attempt} refused"
            )));
        }
        self.inner
            .append_events(aggregate_id, expected_version, events)
            .await
    }
}
