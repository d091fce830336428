//! The project aggregate's state and its reducer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::characters::{self, Character};
use super::config::ComicConfig;
use super::events::ProjectEventKind;
use super::panels::{self, GeneratedPanel};
use super::script::PanelScript;
use super::stage::{Stage, StepController};

/// A global generation batch. At most one runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchTask {
    /// Drafting the four-panel script.
    Script,
    /// Deriving characters from the script.
    CharacterAnalysis,
    /// Rendering every panel.
    AllPanels,
}

impl BatchTask {
    /// Message for the busy overlay while the batch runs.
    #[must_use]
    pub const fn progress_message(self) -> &'static str {
        match self {
            Self::Script => "Writing a four-panel story...",
            Self::CharacterAnalysis => "Analyzing the characters in the script...",
            Self::AllPanels => "Drawing the panels...",
        }
    }
}

impl fmt::Display for BatchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Script => "script generation",
            Self::CharacterAnalysis => "character analysis",
            Self::AllPanels => "panel rendering",
        })
    }
}

/// Everything the presentation layer renders for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    navigation: StepController,
    config: ComicConfig,
    script: Vec<PanelScript>,
    characters: Vec<Character>,
    panels: Vec<GeneratedPanel>,
    generating: Option<BatchTask>,
}

impl ProjectState {
    /// The state of a fresh project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state after `event`. Pure: `self` is left untouched.
    #[must_use]
    pub fn apply(&self, event: &ProjectEventKind) -> Self {
        let mut next = self.clone();
        match event {
            ProjectEventKind::ConfigUpdated(config) => next.config = config.clone(),
            ProjectEventKind::GenerationStarted(started) => next.generating = Some(started.task),
            ProjectEventKind::GenerationSettled(_) => next.generating = None,
            ProjectEventKind::ScriptGenerated(script) => {
                next.script.clone_from(script);
                next.navigation = next.navigation.advance(Stage::Script);
            }
            ProjectEventKind::ScriptEntryEdited(edit) => {
                if let Some(entry) = next
                    .script
                    .iter_mut()
                    .find(|p| p.panel_number == edit.panel_number)
                {
                    entry.description.clone_from(&edit.description);
                    entry.dialogue.clone_from(&edit.dialogue);
                }
            }
            ProjectEventKind::CharactersAnalyzed(roster) => {
                next.characters.clone_from(roster);
                next.navigation = next.navigation.advance(Stage::Characters);
            }
            ProjectEventKind::CharacterImageGenerated(image) => {
                next.characters =
                    characters::with_image(&next.characters, image.character_id, &image.image_url);
            }
            ProjectEventKind::FinalStageEntered => {
                next.navigation = next.navigation.advance(Stage::Final);
            }
            ProjectEventKind::PanelRendered(panel) => {
                next.panels = panels::upsert(&next.panels, panel.clone());
            }
            ProjectEventKind::StageSelected(stage) => {
                // Events are only raised after `visit` succeeded; replaying a
                // stale one must not move past the mark.
                if let Ok(navigation) = next.navigation.visit(*stage) {
                    next.navigation = navigation;
                }
            }
        }
        next
    }

    /// Stage machine position.
    #[must_use]
    pub const fn navigation(&self) -> StepController {
        self.navigation
    }

    /// The stage being displayed.
    #[must_use]
    pub const fn current_stage(&self) -> Stage {
        self.navigation.current()
    }

    /// Topic configuration.
    #[must_use]
    pub const fn config(&self) -> &ComicConfig {
        &self.config
    }

    /// The script, ordered as generated.
    #[must_use]
    pub fn script(&self) -> &[PanelScript] {
        &self.script
    }

    /// Looks up a script entry by panel number.
    #[must_use]
    pub fn script_entry(&self, panel_number: u32) -> Option<&PanelScript> {
        self.script.iter().find(|p| p.panel_number == panel_number)
    }

    /// The character roster.
    #[must_use]
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Looks up a character by id.
    #[must_use]
    pub fn character(&self, id: uuid::Uuid) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Rendered panels, sorted by panel number.
    #[must_use]
    pub fn panels(&self) -> &[GeneratedPanel] {
        &self.panels
    }

    /// Looks up a rendered panel by number.
    #[must_use]
    pub fn panel(&self, panel_number: u32) -> Option<&GeneratedPanel> {
        self.panels.iter().find(|p| p.panel_number == panel_number)
    }

    /// The running global batch, if any.
    #[must_use]
    pub const fn generating(&self) -> Option<BatchTask> {
        self.generating
    }

    /// Whether a global batch is outstanding.
    #[must_use]
    pub const fn is_generating(&self) -> bool {
        self.generating.is_some()
    }

    /// Script panel numbers that have no rendered image yet.
    #[must_use]
    pub fn missing_panels(&self) -> Vec<u32> {
        self.script
            .iter()
            .map(|p| p.panel_number)
            .filter(|n| self.panel(*n).is_none())
            .collect()
    }

    /// Whether the final stage is showing with nothing rendered or running,
    /// i.e. the first batch should start on its own.
    #[must_use]
    pub fn needs_initial_render(&self) -> bool {
        self.current_stage() == Stage::Final && self.panels.is_empty() && !self.is_generating()
    }
}
