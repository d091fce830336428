//! The project aggregate root.

use uuid::Uuid;
use yonkoma_core::aggregate::AggregateRoot;
use yonkoma_core::event::EventContext;

use super::characters::{self, CharacterDraft};
use super::config::ComicConfig;
use super::events::{
    CharacterImageGenerated, GenerationSettled, GenerationStarted, ProjectEvent, ProjectEventKind,
    ScriptEntryEdited,
};
use super::panels::GeneratedPanel;
use super::script::{self, PanelScript};
use super::stage::Stage;
use super::state::{BatchTask, ProjectState};
use crate::error::StudioError;

/// The aggregate root for one comic project.
///
/// Domain methods validate against the committed state and raise events
/// into the uncommitted buffer. State only changes through
/// [`AggregateRoot::apply`], which delegates to the pure
/// [`ProjectState::apply`] reducer.
#[derive(Debug)]
pub struct Project {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    version: i64,
    /// Committed state.
    state: ProjectState,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<ProjectEvent>,
}

impl Project {
    /// Creates an empty project.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            state: ProjectState::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Committed state.
    #[must_use]
    pub const fn state(&self) -> &ProjectState {
        &self.state
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn raise(&mut self, kind: ProjectEventKind, ctx: &EventContext<'_>) {
        let metadata = ctx.metadata(kind.event_type(), self.id, self.next_sequence_number());
        self.uncommitted_events.push(ProjectEvent { metadata, kind });
    }

    /// Replaces the configuration.
    pub fn update_config(&mut self, config: ComicConfig, ctx: &EventContext<'_>) {
        self.raise(ProjectEventKind::ConfigUpdated(config), ctx);
    }

    /// Edits the description and dialogue of one script entry.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::UnknownPanel` if the script has no such panel.
    pub fn edit_script_entry(
        &mut self,
        panel_number: u32,
        description: String,
        dialogue: String,
        ctx: &EventContext<'_>,
    ) -> Result<(), StudioError> {
        if self.state.script_entry(panel_number).is_none() {
            return Err(StudioError::UnknownPanel(panel_number));
        }
        self.raise(
            ProjectEventKind::ScriptEntryEdited(ScriptEntryEdited {
                panel_number,
                description,
                dialogue,
            }),
            ctx,
        );
        Ok(())
    }

    /// Navigates to a reached stage.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::StageLocked` if `stage` is beyond the mark.
    pub fn select_stage(&mut self, stage: Stage, ctx: &EventContext<'_>) -> Result<(), StudioError> {
        self.state.navigation().visit(stage)?;
        self.raise(ProjectEventKind::StageSelected(stage), ctx);
        Ok(())
    }

    /// Marks a global batch as running.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Busy` if another global batch is outstanding.
    pub fn begin_generation(
        &mut self,
        task: BatchTask,
        ctx: &EventContext<'_>,
    ) -> Result<(), StudioError> {
        if let Some(running) = self.state.generating() {
            return Err(StudioError::Busy { task: running });
        }
        self.raise(
            ProjectEventKind::GenerationStarted(GenerationStarted { task }),
            ctx,
        );
        Ok(())
    }

    /// Clears the global busy flag.
    pub fn settle_generation(&mut self, task: BatchTask, succeeded: bool, ctx: &EventContext<'_>) {
        self.raise(
            ProjectEventKind::GenerationSettled(GenerationSettled { task, succeeded }),
            ctx,
        );
    }

    /// Replaces the script with a generated one and moves to the script stage.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Gateway` if the script is empty or its panel
    /// numbers are not unique and positive.
    pub fn record_script(
        &mut self,
        script: Vec<PanelScript>,
        ctx: &EventContext<'_>,
    ) -> Result<(), StudioError> {
        script::validate_generated(&script)?;
        self.raise(ProjectEventKind::ScriptGenerated(script), ctx);
        Ok(())
    }

    /// Merges analysis drafts into the roster and moves to the characters
    /// stage. New characters get ids from `ctx.ids`.
    pub fn record_characters(&mut self, drafts: Vec<CharacterDraft>, ctx: &EventContext<'_>) {
        let roster = characters::recover_identities(self.state.characters(), drafts, ctx.ids);
        self.raise(ProjectEventKind::CharactersAnalyzed(roster), ctx);
    }

    /// Stores a character's design sheet.
    pub fn record_character_image(
        &mut self,
        character_id: Uuid,
        image_url: String,
        ctx: &EventContext<'_>,
    ) {
        self.raise(
            ProjectEventKind::CharacterImageGenerated(CharacterImageGenerated {
                character_id,
                image_url,
            }),
            ctx,
        );
    }

    /// Moves on to the final stage.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::StageLocked` until characters have been analyzed.
    pub fn enter_final(&mut self, ctx: &EventContext<'_>) -> Result<(), StudioError> {
        let navigation = self.state.navigation();
        if !navigation.can_visit(Stage::Characters) {
            return Err(StudioError::StageLocked {
                requested: Stage::Final,
                high_water: navigation.high_water(),
            });
        }
        self.raise(ProjectEventKind::FinalStageEntered, ctx);
        Ok(())
    }

    /// Upserts a rendered panel.
    pub fn record_panel(&mut self, panel: GeneratedPanel, ctx: &EventContext<'_>) {
        self.raise(ProjectEventKind::PanelRendered(panel), ctx);
    }
}

impl AggregateRoot for Project {
    type Event = ProjectEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.state = self.state.apply(&event.kind);
        self.version = event.metadata.sequence_number;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.uncommitted_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yonkoma_core::event::DomainEvent;
    use yonkoma_test_support::{FixedClock, SequentialIds, fixed_now};

    fn script() -> Vec<PanelScript> {
        (1..=4)
            .map(|n| PanelScript {
                panel_number: n,
                description: format!("scene {n}"),
                dialogue: String::new(),
            })
            .collect()
    }

    fn commit(project: &mut Project) {
        let events = project.take_uncommitted_events();
        project.replay(&events);
    }

    #[test]
    fn test_record_script_produces_script_generated_event() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIds::starting_at(1);
        let correlation_id = Uuid::from_u128(99);
        let ctx = EventContext::new(correlation_id, &clock, &ids);
        let project_id = Uuid::from_u128(500);
        let mut project = Project::new(project_id);

        // Act
        project.record_script(script(), &ctx).unwrap();

        // Assert
        let events = project.uncommitted_events();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.event_type(), "project.script_generated");

        let meta = event.metadata();
        assert_eq!(meta.event_id, Uuid::from_u128(1));
        assert_eq!(meta.aggregate_id, project_id);
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        assert_eq!(meta.occurred_at, fixed_now());
        assert!(project.state().script().is_empty());
    }

    #[test]
    fn test_begin_generation_twice_is_busy() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIds::default();
        let ctx = EventContext::new(Uuid::nil(), &clock, &ids);
        let mut project = Project::new(Uuid::from_u128(500));
        project.begin_generation(BatchTask::Script, &ctx).unwrap();
        commit(&mut project);

        // Act
        let result = project.begin_generation(BatchTask::CharacterAnalysis, &ctx);

        // Assert
        match result.unwrap_err() {
            StudioError::Busy { task } => assert_eq!(task, BatchTask::Script),
            other => panic!("expected Busy, got {other:?}"),
        }
        assert!(project.uncommitted_events().is_empty());
    }

    #[test]
    fn test_edit_of_unknown_panel_is_rejected() {
        let clock = FixedClock::default();
        let ids = SequentialIds::default();
        let ctx = EventContext::new(Uuid::nil(), &clock, &ids);
        let mut project = Project::new(Uuid::from_u128(500));

        let result = project.edit_script_entry(9, String::new(), String::new(), &ctx);

        assert!(matches!(result, Err(StudioError::UnknownPanel(9))));
    }

    #[test]
    fn test_enter_final_requires_analyzed_characters() {
        // Arrange
        let clock = FixedClock::default();
        let ids = SequentialIds::default();
        let ctx = EventContext::new(Uuid::nil(), &clock, &ids);
        let mut project = Project::new(Uuid::from_u128(500));
        project.record_script(script(), &ctx).unwrap();
        commit(&mut project);

        // Act
        let locked = project.enter_final(&ctx);
        project.record_characters(Vec::new(), &ctx);
        commit(&mut project);
        let allowed = project.enter_final(&ctx);
        commit(&mut project);

        // Assert
        assert!(matches!(locked, Err(StudioError::StageLocked { .. })));
        assert!(allowed.is_ok());
        assert_eq!(project.state().current_stage(), Stage::Final);
        assert_eq!(project.version(), 3);
    }

    #[test]
    fn test_sequence_numbers_continue_across_buffered_events() {
        let clock = FixedClock::default();
        let ids = SequentialIds::default();
        let ctx = EventContext::new(Uuid::nil(), &clock, &ids);
        let mut project = Project::new(Uuid::from_u128(500));

        project.begin_generation(BatchTask::Script, &ctx).unwrap();
        project.record_script(script(), &ctx).unwrap();
        project.settle_generation(BatchTask::Script, true, &ctx);

        let numbers: Vec<i64> = project
            .uncommitted_events()
            .iter()
            .map(|e| e.metadata.sequence_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
