//! Workflow stages and the step controller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// One of the four sequential phases of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Topic, genre, style and story prompt.
    Topic = 0,
    /// Reviewing and editing the generated script.
    Script = 1,
    /// Character design sheets.
    Characters = 2,
    /// Rendered panels.
    Final = 3,
}

impl Stage {
    /// All stages in workflow order.
    pub const ALL: [Self; 4] = [Self::Topic, Self::Script, Self::Characters, Self::Final];

    /// Short label for navigation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Script => "script",
            Self::Characters => "characters",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tracks the active stage and the furthest stage ever reached.
///
/// Navigation is free among stages at or below the high-water mark.
/// Moving the mark forward only happens through [`StepController::advance`],
/// which the project calls when a stage's generation step completes. The
/// mark never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepController {
    current: Stage,
    high_water: Stage,
}

impl StepController {
    /// Starts at `Topic` with nothing else reached.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: Stage::Topic,
            high_water: Stage::Topic,
        }
    }

    /// The stage being displayed.
    #[must_use]
    pub const fn current(&self) -> Stage {
        self.current
    }

    /// The furthest stage ever reached.
    #[must_use]
    pub const fn high_water(&self) -> Stage {
        self.high_water
    }

    /// Whether navigation to `stage` is allowed.
    #[must_use]
    pub fn can_visit(&self, stage: Stage) -> bool {
        stage <= self.high_water
    }

    /// Whether the workflow has moved past `stage`.
    #[must_use]
    pub fn is_completed(&self, stage: Stage) -> bool {
        self.high_water > stage
    }

    /// Navigates to an already reached stage.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::StageLocked` if `stage` is beyond the mark.
    pub fn visit(self, stage: Stage) -> Result<Self, StudioError> {
        if !self.can_visit(stage) {
            return Err(StudioError::StageLocked {
                requested: stage,
                high_water: self.high_water,
            });
        }
        Ok(Self {
            current: stage,
            ..self
        })
    }

    /// Moves to `stage` after its producing step completed, raising the mark.
    #[must_use]
    pub fn advance(self, stage: Stage) -> Self {
        Self {
            current: stage,
            high_water: self.high_water.max(stage),
        }
    }

    /// Stages the presentation layer should enable.
    pub fn reachable(&self) -> impl Iterator<Item = Stage> + '_ {
        Stage::ALL.into_iter().filter(|stage| self.can_visit(*stage))
    }
}

impl Default for StepController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_topic_with_topic_mark() {
        let controller = StepController::new();

        assert_eq!(controller.current(), Stage::Topic);
        assert_eq!(controller.high_water(), Stage::Topic);
        assert_eq!(controller.reachable().collect::<Vec<_>>(), vec![Stage::Topic]);
    }

    #[test]
    fn test_visit_beyond_mark_is_rejected() {
        // Arrange
        let controller = StepController::new().advance(Stage::Script);

        // Act
        let result = controller.visit(Stage::Characters);

        // Assert
        match result.unwrap_err() {
            StudioError::StageLocked {
                requested,
                high_water,
            } => {
                assert_eq!(requested, Stage::Characters);
                assert_eq!(high_water, Stage::Script);
            }
            other => panic!("expected StageLocked, got {other:?}"),
        }
    }

    #[test]
    fn test_after_final_every_stage_is_reachable_both_ways() {
        // Arrange
        let controller = StepController::new()
            .advance(Stage::Script)
            .advance(Stage::Characters)
            .advance(Stage::Final);

        // Act
        let back = controller.visit(Stage::Topic).unwrap();
        let forward = back.visit(Stage::Final).unwrap();

        // Assert
        assert_eq!(controller.high_water(), Stage::Final);
        assert_eq!(back.current(), Stage::Topic);
        assert_eq!(back.high_water(), Stage::Final);
        assert_eq!(forward.current(), Stage::Final);
        assert_eq!(forward.reachable().count(), 4);
    }

    #[test]
    fn test_advance_to_earlier_stage_keeps_mark() {
        let controller = StepController::new()
            .advance(Stage::Script)
            .advance(Stage::Characters)
            .advance(Stage::Script);

        assert_eq!(controller.current(), Stage::Script);
        assert_eq!(controller.high_water(), Stage::Characters);
        assert!(controller.is_completed(Stage::Script));
        assert!(!controller.is_completed(Stage::Characters));
    }

    #[test]
    fn test_stages_are_ordered_by_workflow_position() {
        let mut sorted = Stage::ALL;
        sorted.sort();

        assert_eq!(sorted, Stage::ALL);
        assert!(Stage::Topic < Stage::Final);
        assert_eq!(Stage::Characters.to_string(), "characters");
    }
}
