//! Domain events for a comic project.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yonkoma_core::error::DomainError;
use yonkoma_core::event::{DomainEvent, EventMetadata};

use super::characters::Character;
use super::config::ComicConfig;
use super::panels::GeneratedPanel;
use super::script::PanelScript;
use super::stage::Stage;
use super::state::BatchTask;

/// Emitted when a global generation batch starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStarted {
    /// The batch that is now running.
    pub task: BatchTask,
}

/// Emitted when a global generation batch has settled, successfully or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettled {
    /// The batch that finished.
    pub task: BatchTask,
    /// Whether the batch produced everything it was asked for.
    pub succeeded: bool,
}

/// Emitted when the user edits one script entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntryEdited {
    /// The edited panel.
    pub panel_number: u32,
    /// New description.
    pub description: String,
    /// New dialogue.
    pub dialogue: String,
}

/// Emitted when a character design sheet was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterImageGenerated {
    /// The character the image belongs to.
    pub character_id: Uuid,
    /// Image reference.
    pub image_url: String,
}

/// Event payload variants for a comic project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectEventKind {
    /// The configuration was replaced.
    ConfigUpdated(ComicConfig),
    /// A global batch started.
    GenerationStarted(GenerationStarted),
    /// A global batch settled.
    GenerationSettled(GenerationSettled),
    /// A generated script replaced the current one.
    ScriptGenerated(Vec<PanelScript>),
    /// A script entry was edited.
    ScriptEntryEdited(ScriptEntryEdited),
    /// Analysis produced a new roster (already merged with prior identities).
    CharactersAnalyzed(Vec<Character>),
    /// One character received an image.
    CharacterImageGenerated(CharacterImageGenerated),
    /// The user moved on to the final stage.
    FinalStageEntered,
    /// One panel image was rendered.
    PanelRendered(GeneratedPanel),
    /// The user navigated to a reached stage.
    StageSelected(Stage),
}

impl ProjectEventKind {
    /// Event type name used for journal routing.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::ConfigUpdated(_) => "project.config_updated",
            Self::GenerationStarted(_) => "project.generation_started",
            Self::GenerationSettled(_) => "project.generation_settled",
            Self::ScriptGenerated(_) => "project.script_generated",
            Self::ScriptEntryEdited(_) => "project.script_entry_edited",
            Self::CharactersAnalyzed(_) => "project.characters_analyzed",
            Self::CharacterImageGenerated(_) => "project.character_image_generated",
            Self::FinalStageEntered => "project.final_stage_entered",
            Self::PanelRendered(_) => "project.panel_rendered",
            Self::StageSelected(_) => "project.stage_selected",
        }
    }
}

/// Domain event envelope for a comic project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProjectEventKind,
}

impl DomainEvent for ProjectEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        Ok(serde_json::to_value(&self.kind)?)
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
