//! Inbound requests from the presentation layer.

use uuid::Uuid;
use yonkoma_core::command::Command;

use super::config::ComicConfig;
use super::stage::Stage;

/// Every operation the presentation layer may invoke on a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioCommand {
    /// Replace the topic configuration.
    SetConfig(ComicConfig),
    /// Edit one script entry; the panel number stays fixed.
    EditScriptEntry {
        /// Panel to edit.
        panel_number: u32,
        /// New description.
        description: String,
        /// New dialogue.
        dialogue: String,
    },
    /// Generate (or regenerate) the script from the current configuration.
    RequestScriptGeneration,
    /// Derive characters from the current script.
    RequestCharacterAnalysis,
    /// Generate one character's design sheet.
    RequestCharacterImage(Uuid),
    /// Move on to the final stage.
    ProceedToFinal,
    /// Render every panel of the script.
    RequestAllPanels,
    /// Re-render one panel.
    RequestSinglePanel(u32),
    /// Navigate to a reached stage.
    NavigateTo(Stage),
}

impl Command for StudioCommand {
    fn command_type(&self) -> &'static str {
        match self {
            Self::SetConfig(_) => "set_config",
            Self::EditScriptEntry { .. } => "edit_script_entry",
            Self::RequestScriptGeneration => "request_script_generation",
            Self::RequestCharacterAnalysis => "request_character_analysis",
            Self::RequestCharacterImage(_) => "request_character_image",
            Self::ProceedToFinal => "proceed_to_final",
            Self::RequestAllPanels => "request_all_panels",
            Self::RequestSinglePanel(_) => "request_single_panel",
            Self::NavigateTo(_) => "navigate_to",
        }
    }

    fn is_generative(&self) -> bool {
        matches!(
            self,
            Self::RequestScriptGeneration
                | Self::RequestCharacterAnalysis
                | Self::RequestCharacterImage(_)
                | Self::RequestAllPanels
                | Self::RequestSinglePanel(_)
        )
    }
}
