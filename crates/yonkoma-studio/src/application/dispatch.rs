//! Routes presentation-layer commands to orchestrator operations.

use tracing::{info, instrument};
use yonkoma_core::command::Command;

use super::orchestrator::Orchestrator;
use super::outcome::BatchReport;
use crate::domain::commands::StudioCommand;
use crate::domain::panels::GeneratedPanel;
use crate::domain::state::ProjectState;
use crate::error::StudioError;

/// What a dispatched command produced.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The project state after the command.
    State(ProjectState),
    /// A single panel attempt; `None` if the script has no such panel.
    Panel(Option<GeneratedPanel>),
    /// A full panel batch.
    Batch(BatchReport),
}

impl Orchestrator {
    /// Handles one command from the presentation layer.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying operation returns.
    #[instrument(skip(self, command), fields(command_type = command.command_type()))]
    pub async fn dispatch(&self, command: StudioCommand) -> Result<CommandOutcome, StudioError> {
        info!(generative = command.is_generative(), "handling command");
        match command {
            StudioCommand::SetConfig(config) => {
                self.set_config(config).await.map(CommandOutcome::State)
            }
            StudioCommand::EditScriptEntry {
                panel_number,
                description,
                dialogue,
            } => self
                .edit_script_entry(panel_number, description, dialogue)
                .await
                .map(CommandOutcome::State),
            StudioCommand::RequestScriptGeneration => {
                self.generate_script().await.map(CommandOutcome::State)
            }
            StudioCommand::RequestCharacterAnalysis => {
                self.analyze_characters().await.map(CommandOutcome::State)
            }
            StudioCommand::RequestCharacterImage(character_id) => self
                .generate_character_image(character_id)
                .await
                .map(CommandOutcome::State),
            StudioCommand::ProceedToFinal => {
                self.proceed_to_final().await.map(CommandOutcome::State)
            }
            StudioCommand::RequestAllPanels => {
                self.generate_all_panels().await.map(CommandOutcome::Batch)
            }
            StudioCommand::RequestSinglePanel(panel_number) => self
                .regenerate_single_panel(panel_number)
                .await
                .map(CommandOutcome::Panel),
            StudioCommand::NavigateTo(stage) => {
                self.navigate_to(stage).await.map(CommandOutcome::State)
            }
        }
    }
}
