//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::determinism::{Clock, IdSource};
use crate::error::DomainError;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Aggregate/stream this event belongs to.
    pub aggregate_id: Uuid,
    /// Monotonically increasing version within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID shared by every event one operation produced.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the payload cannot be encoded.
    fn to_payload(&self) -> Result<serde_json::Value, DomainError>;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;
}

/// Everything a domain method needs to stamp the events it raises.
#[derive(Clone, Copy)]
pub struct EventContext<'a> {
    /// Correlation ID of the operation raising the events.
    pub correlation_id: Uuid,
    /// Time source for `occurred_at`.
    pub clock: &'a dyn Clock,
    /// Identifier source for event ids and any ids minted by the domain.
    pub ids: &'a dyn IdSource,
}

impl<'a> EventContext<'a> {
    /// Creates a context for one operation.
    #[must_use]
    pub fn new(correlation_id: Uuid, clock: &'a dyn Clock, ids: &'a dyn IdSource) -> Self {
        Self {
            correlation_id,
            clock,
            ids,
        }
    }

    /// Builds metadata for the next event of `aggregate_id`.
    #[must_use]
    pub fn metadata(
        &self,
        event_type: &'static str,
        aggregate_id: Uuid,
        sequence_number: i64,
    ) -> EventMetadata {
        EventMetadata {
            event_id: self.ids.next_id(),
            event_type: event_type.to_owned(),
            aggregate_id,
            sequence_number,
            correlation_id: self.correlation_id,
            occurred_at: self.clock.now(),
        }
    }
}

impl std::fmt::Debug for EventContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}
