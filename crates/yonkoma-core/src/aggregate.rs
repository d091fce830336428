//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// Trait for aggregate roots whose state is a fold over their event stream.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Folds one event into the aggregate. Used both for replay and for
    /// committing freshly raised events once the journal accepted them.
    fn apply(&mut self, event: &Self::Event);

    /// Returns events raised by domain methods but not yet committed.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Drains the uncommitted events, leaving the buffer empty.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;

    /// Applies every event in order.
    fn replay<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: 'a,
    {
        for event in events {
            self.apply(event);
        }
    }
}
