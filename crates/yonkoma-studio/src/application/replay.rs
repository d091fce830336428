//! Rebuilding a project from its journal.
//!
//! Because every mutation is an event folded in by a pure reducer, replaying
//! a project's stream reproduces the exact state the orchestrator published.

use uuid::Uuid;
use yonkoma_core::aggregate::AggregateRoot;
use yonkoma_core::error::DomainError;
use yonkoma_core::event::EventMetadata;
use yonkoma_core::journal::{EventJournal, StoredEvent};

use crate::domain::aggregates::Project;
use crate::domain::events::{ProjectEvent, ProjectEventKind};
use crate::domain::state::ProjectState;

/// Reconstitutes a `Project` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Serialization` if an event payload cannot be decoded.
pub fn reconstitute(project_id: Uuid, stored: &[StoredEvent]) -> Result<Project, DomainError> {
    let mut project = Project::new(project_id);
    for event in stored {
        let kind: ProjectEventKind = serde_json::from_value(event.payload.clone())?;
        project.apply(&ProjectEvent {
            metadata: EventMetadata {
                event_id: event.event_id,
                event_type: event.event_type.clone(),
                aggregate_id: event.aggregate_id,
                sequence_number: event.sequence_number,
                correlation_id: event.correlation_id,
                occurred_at: event.occurred_at,
            },
            kind,
        });
    }
    Ok(project)
}

/// Loads a project's stream from `journal` and returns its state.
///
/// # Errors
///
/// Returns `DomainError` if loading or decoding fails.
pub async fn replay_project(
    project_id: Uuid,
    journal: &dyn EventJournal,
) -> Result<ProjectState, DomainError> {
    let stored = journal.load_events(project_id).await?;
    let project = reconstitute(project_id, &stored)?;
    tracing::debug!(%project_id, version = project.version(), "replayed project");
    Ok(project.state().clone())
}
