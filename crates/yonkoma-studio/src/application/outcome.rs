//! Typed per-item results of a panel batch.

use crate::domain::panels::GeneratedPanel;
use crate::error::StudioError;

/// What happened to one panel in a batch.
#[derive(Debug)]
pub enum PanelStatus {
    /// The panel was rendered and stored.
    Rendered(GeneratedPanel),
    /// The script no longer had this panel when its turn came.
    Skipped,
    /// The gateway (or the journal) failed; the panel was left as it was.
    Failed(StudioError),
}

/// Outcome for one panel.
#[derive(Debug)]
pub struct PanelOutcome {
    /// The panel this outcome belongs to.
    pub panel_number: u32,
    /// Result of the attempt.
    pub status: PanelStatus,
}

impl PanelOutcome {
    /// Builds an outcome from a single-panel result.
    #[must_use]
    pub fn from_result(
        panel_number: u32,
        result: Result<Option<GeneratedPanel>, StudioError>,
    ) -> Self {
        let status = match result {
            Ok(Some(panel)) => PanelStatus::Rendered(panel),
            Ok(None) => PanelStatus::Skipped,
            Err(err) => PanelStatus::Failed(err),
        };
        Self {
            panel_number,
            status,
        }
    }

    /// Whether the panel was rendered.
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        matches!(self.status, PanelStatus::Rendered(_))
    }
}

/// Result of rendering every panel of a script.
///
/// Outcomes are listed in script order, regardless of the order in which
/// the gateway calls completed.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One outcome per script entry.
    pub outcomes: Vec<PanelOutcome>,
}

impl BatchReport {
    /// Panel numbers rendered in this batch.
    #[must_use]
    pub fn rendered_numbers(&self) -> Vec<u32> {
        self.outcomes
            .iter()
            .filter(|o| o.is_rendered())
            .map(|o| o.panel_number)
            .collect()
    }

    /// Panel numbers whose attempt failed, for a targeted retry.
    #[must_use]
    pub fn failed_numbers(&self) -> Vec<u32> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PanelStatus::Failed(_)))
            .map(|o| o.panel_number)
            .collect()
    }

    /// Whether every attempted panel was rendered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(PanelOutcome::is_rendered)
    }
}
