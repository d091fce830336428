//! Error types for the studio context.

use thiserror::Error;
use uuid::Uuid;
use yonkoma_core::error::DomainError;

use crate::domain::stage::Stage;
use crate::domain::state::BatchTask;

/// Failures reported by a generation gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No usable output: malformed or empty response, transport failure.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The service declined on content-policy grounds.
    #[error("generation refused by content policy")]
    Refusal {
        /// Whatever explanation the service gave.
        explanation: Option<String>,
    },
}

impl GatewayError {
    /// A refusal carrying the service's explanation.
    #[must_use]
    pub fn refusal(explanation: impl Into<String>) -> Self {
        Self::Refusal {
            explanation: Some(explanation.into()),
        }
    }
}

/// Errors returned by studio operations.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The gateway failed; nothing was changed for the affected item.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A global batch is already running.
    #[error("{task} is already in progress")]
    Busy {
        /// The running batch.
        task: BatchTask,
    },

    /// An image for this character is already being generated.
    #[error("an image for character {0} is already being generated")]
    CharacterInFlight(Uuid),

    /// This panel is already being regenerated on its own.
    #[error("panel {0} is already being regenerated")]
    PanelInFlight(u32),

    /// Navigation beyond the furthest reached stage.
    #[error("stage {requested} is not reachable yet; furthest stage reached is {high_water}")]
    StageLocked {
        /// The stage asked for.
        requested: Stage,
        /// The high-water mark at the time.
        high_water: Stage,
    },

    /// No character with this id.
    #[error("unknown character: {0}")]
    UnknownCharacter(Uuid),

    /// No script entry with this panel number.
    #[error("unknown panel: {0}")]
    UnknownPanel(u32),

    /// Journal or serialization failure.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StudioError {
    /// Whether invoking the same operation again may succeed without the
    /// user changing anything.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Gateway(GatewayError::Generation(_))
                | Self::Busy { .. }
                | Self::CharacterInFlight(_)
                | Self::PanelInFlight(_)
        )
    }

    /// Short text for transient user-facing feedback.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(GatewayError::Generation(_)) => {
                "Generation failed. Please try again.".to_owned()
            }
            Self::Gateway(GatewayError::Refusal { explanation }) => match explanation {
                Some(text) => format!("The request was declined: {text}. Try rewording it."),
                None => "The request was declined. Try rewording it.".to_owned(),
            },
            Self::Busy { task } => format!("Please wait, {task} is still running."),
            Self::CharacterInFlight(_) | Self::PanelInFlight(_) => {
                "This image is already being drawn.".to_owned()
            }
            Self::StageLocked { requested, .. } => {
                format!("Finish the earlier steps before opening the {requested} step.")
            }
            Self::UnknownCharacter(_) | Self::UnknownPanel(_) | Self::Domain(_) => {
                "Something went wrong. Please try again.".to_owned()
            }
        }
    }
}
