//! What observers of a project see after each mutation.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::domain::state::ProjectState;

/// Per-item work in flight outside the global batch flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyIndicator {
    /// Characters whose design sheet is being drawn.
    pub characters: BTreeSet<Uuid>,
    /// Panels being regenerated one at a time.
    pub panels: BTreeSet<u32>,
}

impl BusyIndicator {
    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.characters.is_empty() && self.panels.is_empty()
    }
}

/// A consistent view of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioSnapshot {
    /// Project (aggregate) identifier.
    pub project_id: Uuid,
    /// Number of events committed so far.
    pub version: i64,
    /// The project state as of `version`.
    pub state: ProjectState,
    /// Per-item in-flight markers.
    pub busy: BusyIndicator,
}

impl StudioSnapshot {
    pub(crate) fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            version: 0,
            state: ProjectState::new(),
            busy: BusyIndicator::default(),
        }
    }

    /// Whether anything at all is running: a global batch or a single item.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.is_generating() || !self.busy.is_idle()
    }
}
