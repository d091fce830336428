//! The generation orchestrator.
//!
//! Owns the project aggregate and is its only writer. Every operation reads
//! the latest committed state, calls the gateway without holding any lock,
//! and commits the result as events: the events are journaled, folded into
//! the aggregate through the pure reducer, and the whole new state is
//! published as one snapshot. Concurrent operations on different keys
//! interleave freely; commits serialize on the aggregate mutex, so for the
//! same key the last call to resolve wins.
//!
//! There is no cancellation and no timeout. Operations that call the
//! gateway run on their own task; the returned future only waits for it, so
//! a caller that gives up early does not cut the work short. The result
//! still lands and the busy flag still clears.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tracing::{Instrument, debug, error, info, instrument, warn};
use uuid::Uuid;
use yonkoma_core::aggregate::AggregateRoot;
use yonkoma_core::determinism::{Clock, IdSource, RandomIds, SystemClock};
use yonkoma_core::error::DomainError;
use yonkoma_core::event::EventContext;
use yonkoma_core::journal::{EventJournal, StoredEvent};
use yonkoma_journal::InMemoryEventJournal;

use super::gateway::GenerationGateway;
use super::outcome::{BatchReport, PanelOutcome};
use super::snapshot::StudioSnapshot;
use crate::domain::aggregates::Project;
use crate::domain::config::ComicConfig;
use crate::domain::panels::GeneratedPanel;
use crate::domain::stage::Stage;
use crate::domain::state::{BatchTask, ProjectState};
use crate::error::{GatewayError, StudioError};
use crate::settings::StudioSettings;

/// External services an orchestrator works with.
#[derive(Clone)]
pub struct Collaborators {
    /// Text and image synthesis.
    pub gateway: Arc<dyn GenerationGateway>,
    /// Event log for the session.
    pub journal: Arc<dyn EventJournal>,
    /// Event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Project, correlation, event and character ids.
    pub ids: Arc<dyn IdSource>,
}

impl Collaborators {
    /// Production collaborators around `gateway`: an in-memory journal, the
    /// system clock and random ids.
    #[must_use]
    pub fn in_memory(gateway: Arc<dyn GenerationGateway>) -> Self {
        Self {
            gateway,
            journal: Arc::new(InMemoryEventJournal::new()),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
enum InFlightKey {
    Character(Uuid),
    Panel(u32),
}

/// Marks one character or panel as in flight for as long as it lives.
///
/// Released on drop, so the marker is cleared even if the caller abandons
/// the future.
struct InFlightGuard<'a> {
    snapshots: &'a watch::Sender<StudioSnapshot>,
    key: InFlightKey,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(snapshots: &'a watch::Sender<StudioSnapshot>, key: InFlightKey) -> Option<Self> {
        let acquired = snapshots.send_if_modified(|snapshot| match key {
            InFlightKey::Character(id) => snapshot.busy.characters.insert(id),
            InFlightKey::Panel(panel_number) => snapshot.busy.panels.insert(panel_number),
        });
        if acquired {
            Some(Self { snapshots, key })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let key = self.key;
        self.snapshots.send_modify(|snapshot| match key {
            InFlightKey::Character(id) => {
                snapshot.busy.characters.remove(&id);
            }
            InFlightKey::Panel(panel_number) => {
                snapshot.busy.panels.remove(&panel_number);
            }
        });
    }
}

/// Journal attempts made to clear the busy flag before giving up.
const SETTLE_ATTEMPTS: u32 = 2;

/// Drives generation for one comic project.
pub struct Orchestrator {
    studio: Arc<Studio>,
}

/// Everything an operation works on. Shared with the tasks that run
/// gateway-bound operations.
struct Studio {
    project: Mutex<Project>,
    snapshots: watch::Sender<StudioSnapshot>,
    gateway: Arc<dyn GenerationGateway>,
    journal: Arc<dyn EventJournal>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    settings: StudioSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("project_id", &self.project_id())
            .field("settings", &self.studio.settings)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Starts a new, empty project.
    #[must_use]
    pub fn new(collaborators: Collaborators, settings: StudioSettings) -> Self {
        let Collaborators {
            gateway,
            journal,
            clock,
            ids,
        } = collaborators;
        let project_id = ids.next_id();
        let (snapshots, _) = watch::channel(StudioSnapshot::new(project_id));
        info!(%project_id, "started comic project");
        Self {
            studio: Arc::new(Studio {
                project: Mutex::new(Project::new(project_id)),
                snapshots,
                gateway,
                journal,
                clock,
                ids,
                settings,
            }),
        }
    }

    /// The project's aggregate id, also its journal stream id.
    #[must_use]
    pub fn project_id(&self) -> Uuid {
        self.studio.snapshots.borrow().project_id
    }

    /// Settings this orchestrator runs with.
    #[must_use]
    pub fn settings(&self) -> &StudioSettings {
        &self.studio.settings
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StudioSnapshot {
        self.studio.snapshots.borrow().clone()
    }

    /// The latest committed project state.
    #[must_use]
    pub fn state(&self) -> ProjectState {
        self.studio.read(ProjectState::clone)
    }

    /// A receiver notified after every commit and every in-flight change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StudioSnapshot> {
        self.studio.snapshots.subscribe()
    }

    /// Runs `body` on its own task and waits for it.
    ///
    /// Dropping the returned future detaches the task instead of aborting
    /// it. A panic in the task resumes on the caller.
    async fn detached<T, F, Fut>(&self, body: F) -> Result<T, StudioError>
    where
        F: FnOnce(Arc<Studio>) -> Fut,
        Fut: Future<Output = Result<T, StudioError>> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::spawn(body(Arc::clone(&self.studio)).in_current_span());
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                Err(DomainError::Infrastructure(format!("generation task ended: {err}")).into())
            }
        }
    }

    /// Replaces the topic configuration.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Domain` if the journal rejects the event.
    #[instrument(skip(self, config))]
    pub async fn set_config(&self, config: ComicConfig) -> Result<ProjectState, StudioError> {
        let correlation_id = self.studio.ids.next_id();
        self.studio
            .commit(correlation_id, move |project, ctx| {
                project.update_config(config, ctx);
                Ok(())
            })
            .await
    }

    /// Edits the description and dialogue of one script entry.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::UnknownPanel` if the script has no such panel.
    #[instrument(skip(self, description, dialogue))]
    pub async fn edit_script_entry(
        &self,
        panel_number: u32,
        description: String,
        dialogue: String,
    ) -> Result<ProjectState, StudioError> {
        let correlation_id = self.studio.ids.next_id();
        self.studio
            .commit(correlation_id, move |project, ctx| {
                project.edit_script_entry(panel_number, description, dialogue, ctx)
            })
            .await
    }

    /// Navigates to a stage at or below the high-water mark.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::StageLocked` if the stage was never reached.
    #[instrument(skip(self))]
    pub async fn navigate_to(&self, stage: Stage) -> Result<ProjectState, StudioError> {
        let correlation_id = self.studio.ids.next_id();
        self.studio
            .commit(correlation_id, move |project, ctx| {
                project.select_stage(stage, ctx)
            })
            .await
    }

    /// Moves on from character design to the final stage.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::StageLocked` if characters were never analyzed.
    #[instrument(skip(self))]
    pub async fn proceed_to_final(&self) -> Result<ProjectState, StudioError> {
        let correlation_id = self.studio.ids.next_id();
        self.studio
            .commit(correlation_id, |project, ctx| project.enter_final(ctx))
            .await
    }

    /// Generates a script from the current configuration.
    ///
    /// On success the script is replaced and the workflow moves to the
    /// script stage. On failure script and stage are untouched and the
    /// configuration is kept for a retry.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Busy` if a global batch is running, and
    /// `StudioError::Gateway` if generation failed or produced an unusable
    /// script.
    #[instrument(skip(self))]
    pub async fn generate_script(&self) -> Result<ProjectState, StudioError> {
        self.detached(|studio| async move { studio.generate_script().await })
            .await
    }

    /// Derives characters from the current script and merges them with the
    /// existing roster by name, keeping ids and images of characters that
    /// are still present.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Busy` if a global batch is running, and
    /// `StudioError::Gateway` if analysis failed.
    #[instrument(skip(self))]
    pub async fn analyze_characters(&self) -> Result<ProjectState, StudioError> {
        self.detached(|studio| async move { studio.analyze_characters().await })
            .await
    }

    /// Draws one character's design sheet in the configured style.
    ///
    /// Calls for different characters may run concurrently; each success
    /// updates only its own character's image.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::UnknownCharacter` for an unknown id,
    /// `StudioError::CharacterInFlight` if this character is already being
    /// drawn, and `StudioError::Gateway` if generation failed or was refused.
    #[instrument(skip(self))]
    pub async fn generate_character_image(
        &self,
        character_id: Uuid,
    ) -> Result<ProjectState, StudioError> {
        self.detached(move |studio| async move {
            studio.generate_character_image(character_id).await
        })
        .await
    }

    /// Renders one panel with the current style and full character roster.
    ///
    /// Returns `Ok(None)` without calling the gateway if the script has no
    /// such panel.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Gateway` if rendering failed; no panel entry
    /// is written or changed in that case.
    #[instrument(skip(self))]
    pub async fn generate_panel_image(
        &self,
        panel_number: u32,
    ) -> Result<Option<GeneratedPanel>, StudioError> {
        self.detached(move |studio| async move {
            let correlation_id = studio.ids.next_id();
            studio.render_panel(panel_number, correlation_id).await
        })
        .await
    }

    /// Renders every panel of the script concurrently.
    ///
    /// Waits for every call to settle; one failure neither cancels nor
    /// blocks the others. The global busy flag is raised for the whole
    /// batch. Returns one typed outcome per panel in script order.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::Busy` if a global batch is already running.
    /// Per-panel failures are reported in the [`BatchReport`], not here.
    #[instrument(skip(self))]
    pub async fn generate_all_panels(&self) -> Result<BatchReport, StudioError> {
        self.detached(|studio| async move { studio.generate_all_panels().await })
            .await
    }

    /// Re-renders one panel under its own in-flight marker, independent of
    /// the global busy flag.
    ///
    /// # Errors
    ///
    /// Returns `StudioError::PanelInFlight` if this panel is already being
    /// regenerated on its own, and `StudioError::Gateway` if rendering failed.
    #[instrument(skip(self))]
    pub async fn regenerate_single_panel(
        &self,
        panel_number: u32,
    ) -> Result<Option<GeneratedPanel>, StudioError> {
        self.detached(move |studio| async move {
            studio.regenerate_single_panel(panel_number).await
        })
        .await
    }
}

impl Studio {
    fn read<T>(&self, f: impl FnOnce(&ProjectState) -> T) -> T {
        f(&self.snapshots.borrow().state)
    }

    /// Runs `change` against the aggregate, journals whatever it raised,
    /// folds the events in and publishes the new state.
    ///
    /// If `change` fails or the journal rejects the append, the raised
    /// events are discarded and the state is left as it was.
    async fn commit<F>(&self, correlation_id: Uuid, change: F) -> Result<ProjectState, StudioError>
    where
        F: FnOnce(&mut Project, &EventContext<'_>) -> Result<(), StudioError> + Send,
    {
        let mut project = self.project.lock().await;
        let ctx = EventContext::new(correlation_id, self.clock.as_ref(), self.ids.as_ref());

        let changed = change(&mut *project, &ctx);
        let events = project.take_uncommitted_events();
        changed?;
        if events.is_empty() {
            return Ok(project.state().clone());
        }

        let stored = events
            .iter()
            .map(StoredEvent::capture)
            .collect::<Result<Vec<_>, _>>()?;
        self.journal
            .append_events(project.aggregate_id(), project.version(), &stored)
            .await?;

        project.replay(&events);
        let state = project.state().clone();
        let version = project.version();
        self.snapshots.send_modify(|snapshot| {
            snapshot.version = version;
            snapshot.state = state.clone();
        });
        debug!(%correlation_id, version, events = events.len(), "committed");
        Ok(state)
    }

    async fn begin_batch(
        &self,
        task: BatchTask,
        correlation_id: Uuid,
    ) -> Result<ProjectState, StudioError> {
        self.commit(correlation_id, move |project, ctx| {
            project.begin_generation(task, ctx)
        })
        .await
    }

    /// Clears the busy flag, trying the journal once more if it refuses.
    async fn settle(&self, task: BatchTask, succeeded: bool, correlation_id: Uuid) {
        for attempt in 1..=SETTLE_ATTEMPTS {
            let settled = self
                .commit(correlation_id, move |project, ctx| {
                    project.settle_generation(task, succeeded, ctx);
                    Ok(())
                })
                .await;
            match settled {
                Ok(_) => return,
                Err(err) if attempt < SETTLE_ATTEMPTS => {
                    warn!(%correlation_id, %task, attempt, error = %err, "retrying busy flag clear");
                }
                Err(err) => {
                    error!(%correlation_id, %task, error = %err, "could not clear the busy flag");
                }
            }
        }
    }

    /// Commits a batch's result together with the settle event, or, if the
    /// gateway or the commit failed, only clears the busy flag.
    async fn finish_batch<T, F>(
        &self,
        task: BatchTask,
        correlation_id: Uuid,
        generated: Result<T, GatewayError>,
        record: F,
    ) -> Result<ProjectState, StudioError>
    where
        T: Send,
        F: FnOnce(&mut Project, T, &EventContext<'_>) -> Result<(), StudioError> + Send,
    {
        let outcome = match generated {
            Ok(value) => {
                self.commit(correlation_id, move |project, ctx| {
                    record(&mut *project, value, ctx)?;
                    project.settle_generation(task, true, ctx);
                    Ok(())
                })
                .await
            }
            Err(err) => Err(err.into()),
        };

        match &outcome {
            Ok(_) => info!(%correlation_id, %task, "generation completed"),
            Err(err) => {
                warn!(%correlation_id, %task, error = %err, "generation failed; previous state kept");
                self.settle(task, false, correlation_id).await;
            }
        }
        outcome
    }

    async fn generate_script(&self) -> Result<ProjectState, StudioError> {
        let correlation_id = self.ids.next_id();
        let started = self.begin_batch(BatchTask::Script, correlation_id).await?;
        let config = started.config();
        info!(%correlation_id, topic = %config.topic, "generating script");

        let generated = self
            .gateway
            .generate_script(&config.topic, &config.genre, &config.story_prompt)
            .await;
        if let Ok(script) = &generated {
            if script.len() != self.settings.expected_panel_count {
                warn!(
                    %correlation_id,
                    panels = script.len(),
                    expected = self.settings.expected_panel_count,
                    "script panel count differs from the expected count"
                );
            }
        }

        self.finish_batch(
            BatchTask::Script,
            correlation_id,
            generated,
            |project, script, ctx| project.record_script(script, ctx),
        )
        .await
    }

    async fn analyze_characters(&self) -> Result<ProjectState, StudioError> {
        let correlation_id = self.ids.next_id();
        let started = self
            .begin_batch(BatchTask::CharacterAnalysis, correlation_id)
            .await?;
        info!(%correlation_id, panels = started.script().len(), "analyzing characters");

        let drafts = self.gateway.analyze_characters(started.script()).await;
        if let Ok(drafts) = &drafts {
            debug!(%correlation_id, candidates = drafts.len(), "analysis returned candidates");
        }

        self.finish_batch(
            BatchTask::CharacterAnalysis,
            correlation_id,
            drafts,
            |project, drafts, ctx| {
                project.record_characters(drafts, ctx);
                Ok(())
            },
        )
        .await
    }

    async fn generate_character_image(
        &self,
        character_id: Uuid,
    ) -> Result<ProjectState, StudioError> {
        let correlation_id = self.ids.next_id();
        let (character, style) = self
            .read(|state| {
                state
                    .character(character_id)
                    .map(|c| (c.clone(), state.config().style.clone()))
            })
            .ok_or(StudioError::UnknownCharacter(character_id))?;

        let _in_flight =
            InFlightGuard::acquire(&self.snapshots, InFlightKey::Character(character_id))
                .ok_or(StudioError::CharacterInFlight(character_id))?;
        info!(%correlation_id, name = %character.name, "drawing character");

        let image_url = self
            .gateway
            .generate_character_image(&character, &style)
            .await
            .inspect_err(|err| {
                warn!(%correlation_id, name = %character.name, error = %err, "character image failed");
            })?;

        let state = self
            .commit(correlation_id, move |project, ctx| {
                project.record_character_image(character_id, image_url, ctx);
                Ok(())
            })
            .await?;
        info!(%correlation_id, name = %character.name, "character image stored");
        Ok(state)
    }

    async fn generate_all_panels(&self) -> Result<BatchReport, StudioError> {
        let correlation_id = self.ids.next_id();
        let started = self
            .begin_batch(BatchTask::AllPanels, correlation_id)
            .await?;
        let panel_numbers: Vec<u32> = started.script().iter().map(|p| p.panel_number).collect();
        info!(%correlation_id, panels = panel_numbers.len(), "rendering all panels");

        let outcomes = join_all(panel_numbers.into_iter().map(|panel_number| async move {
            let result = self.render_panel(panel_number, correlation_id).await;
            PanelOutcome::from_result(panel_number, result)
        }))
        .await;
        let report = BatchReport { outcomes };

        self.settle(BatchTask::AllPanels, report.is_complete(), correlation_id)
            .await;
        info!(
            %correlation_id,
            rendered = ?report.rendered_numbers(),
            failed = ?report.failed_numbers(),
            "panel batch settled"
        );
        Ok(report)
    }

    async fn regenerate_single_panel(
        &self,
        panel_number: u32,
    ) -> Result<Option<GeneratedPanel>, StudioError> {
        let correlation_id = self.ids.next_id();
        let _in_flight = InFlightGuard::acquire(&self.snapshots, InFlightKey::Panel(panel_number))
            .ok_or(StudioError::PanelInFlight(panel_number))?;
        self.render_panel(panel_number, correlation_id).await
    }

    async fn render_panel(
        &self,
        panel_number: u32,
        correlation_id: Uuid,
    ) -> Result<Option<GeneratedPanel>, StudioError> {
        let Some((panel, style, roster)) = self.read(|state| {
            state.script_entry(panel_number).map(|panel| {
                (
                    panel.clone(),
                    state.config().style.clone(),
                    state.characters().to_vec(),
                )
            })
        }) else {
            debug!(%correlation_id, panel_number, "no script entry; nothing to render");
            return Ok(None);
        };

        let image_url = self
            .gateway
            .generate_panel_image(&panel, &style, &roster)
            .await
            .inspect_err(|err| {
                warn!(%correlation_id, panel_number, error = %err, "panel render failed");
            })?;

        let rendered = GeneratedPanel {
            panel_number,
            image_url,
        };
        let stored = rendered.clone();
        self.commit(correlation_id, move |project, ctx| {
            project.record_panel(stored, ctx);
            Ok(())
        })
        .await?;
        info!(%correlation_id, panel_number, "panel rendered");
        Ok(Some(rendered))
    }
}
