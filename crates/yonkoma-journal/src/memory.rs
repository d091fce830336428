//! In-memory implementation of the `EventJournal` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use yonkoma_core::error::DomainError;
use yonkoma_core::journal::{EventJournal, StoredEvent};

/// Event journal holding every stream in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEventJournal {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of events stored for `aggregate_id`.
    pub async fn stream_len(&self, aggregate_id: Uuid) -> usize {
        self.streams
            .read()
            .await
            .get(&aggregate_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventJournal for InMemoryEventJournal {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .streams
            .read()
            .await
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id).or_default();

        let actual = stream.last().map_or(0, |e| e.sequence_number);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let mut next = expected_version;
        for event in events {
            next += 1;
            if event.aggregate_id != aggregate_id || event.sequence_number != next {
                return Err(DomainError::Validation(format!(
                    "event {} does not continue stream {aggregate_id} at sequence {next}",
                    event.event_id
                )));
            }
        }

        stream.extend_from_slice(events);
        debug!(%aggregate_id, appended = events.len(), version = next, "appended events");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::InMemoryEventJournal;
    use yonkoma_core::error::DomainError;
    use yonkoma_core::journal::{EventJournal, StoredEvent};

    fn stored(aggregate_id: Uuid, sequence_number: i64) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id,
            event_type: "project.config_updated".to_owned(),
            payload: serde_json::json!({ "sequence": sequence_number }),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_append_then_load_returns_events_in_order() {
        // Arrange
        let journal = InMemoryEventJournal::new();
        let project_id = Uuid::new_v4();

        // Act
        journal
            .append_events(project_id, 0, &[stored(project_id, 1), stored(project_id, 2)])
            .await
            .unwrap();
        journal
            .append_events(project_id, 2, &[stored(project_id, 3)])
            .await
            .unwrap();

        // Assert
        let events = journal.load_events(project_id).await.unwrap();
        let sequence: Vec<i64> = events.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
        assert_eq!(journal.stream_len(project_id).await, 3);
    }

    #[tokio::test]
    async fn test_append_with_stale_version_is_a_conflict() {
        // Arrange
        let journal = InMemoryEventJournal::new();
        let project_id = Uuid::new_v4();
        journal
            .append_events(project_id, 0, &[stored(project_id, 1)])
            .await
            .unwrap();

        // Act
        let result = journal
            .append_events(project_id, 0, &[stored(project_id, 1)])
            .await;

        // Assert
        match result.unwrap_err() {
            DomainError::ConcurrencyConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
        assert_eq!(journal.stream_len(project_id).await, 1);
    }

    #[tokio::test]
    async fn test_append_rejects_gap_in_sequence() {
        // Arrange
        let journal = InMemoryEventJournal::new();
        let project_id = Uuid::new_v4();

        // Act
        let result = journal
            .append_events(project_id, 0, &[stored(project_id, 2)])
            .await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(journal.load_events(project_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_unknown_stream_is_empty() {
        let journal = InMemoryEventJournal::new();

        let events = journal.load_events(Uuid::new_v4()).await.unwrap();

        assert!(events.is_empty());
    }
}
