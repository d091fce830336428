//! Shared test helpers for orchestrator integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use yonkoma_core::journal::EventJournal;
use yonkoma_journal::InMemoryEventJournal;
use yonkoma_studio::domain::characters::{Character, CharacterDraft};
use yonkoma_studio::domain::config::ComicConfig;
use yonkoma_studio::domain::script::PanelScript;
use yonkoma_studio::{Collaborators, GatewayError, GenerationGateway, Orchestrator, StudioSettings};
use yonkoma_test_support::{FixedClock, SequentialIds};

/// One panel render as the gateway saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelCall {
    pub panel_number: u32,
    pub style: String,
    pub roster: Vec<String>,
}

#[derive(Default)]
struct Gate {
    taken: AtomicBool,
    entered: Notify,
    release: Notify,
}

/// A gateway whose answers are set up by the test.
///
/// The first call for a held key (`script`, `analysis`, `character:<name>`,
/// `panel:<n>`) is parked at its gate until the test releases it; later
/// calls for the same key pass straight through. This is how overlapping
/// operations are arranged without sleeping.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Option<Result<Vec<PanelScript>, GatewayError>>>,
    drafts: Mutex<Vec<CharacterDraft>>,
    failing_analysis: AtomicBool,
    failing_panels: Mutex<HashSet<u32>>,
    failing_characters: Mutex<HashSet<String>>,
    refused_characters: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
    calls: Mutex<Vec<String>>,
    panel_calls: Mutex<Vec<PanelCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        let gateway = Self::default();
        gateway.set_script(Ok(four_panel_script()));
        Arc::new(gateway)
    }

    pub fn set_script(&self, script: Result<Vec<PanelScript>, GatewayError>) {
        *self.script.lock().unwrap() = Some(script);
    }

    pub fn set_drafts(&self, drafts: &[(&str, &str)]) {
        *self.drafts.lock().unwrap() = drafts
            .iter()
            .map(|(name, description)| CharacterDraft {
                name: (*name).to_owned(),
                description: (*description).to_owned(),
            })
            .collect();
    }

    pub fn fail_analysis(&self, failing: bool) {
        self.failing_analysis.store(failing, Ordering::SeqCst);
    }

    pub fn fail_panel(&self, panel_number: u32) {
        self.failing_panels.lock().unwrap().insert(panel_number);
    }

    pub fn heal_panel(&self, panel_number: u32) {
        self.failing_panels.lock().unwrap().remove(&panel_number);
    }

    pub fn fail_character(&self, name: &str) {
        self.failing_characters.lock().unwrap().insert(name.to_owned());
    }

    pub fn refuse_character(&self, name: &str) {
        self.refused_characters.lock().unwrap().insert(name.to_owned());
    }

    /// Parks the next calls for `key` until [`Self::release`].
    pub fn hold(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_owned(), Arc::new(Gate::default()));
    }

    /// Resolves once a call for `key` is parked at its gate.
    pub async fn entered(&self, key: &str) {
        let gate = self.gate(key).expect("no gate held for key");
        gate.entered.notified().await;
    }

    pub fn release(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(key) {
            gate.release.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn panel_calls(&self) -> Vec<PanelCall> {
        self.panel_calls.lock().unwrap().clone()
    }

    fn gate(&self, key: &str) -> Option<Arc<Gate>> {
        self.gates.lock().unwrap().get(key).cloned()
    }

    async fn pass(&self, key: String) {
        self.calls.lock().unwrap().push(key.clone());
        let parked = self
            .gate(&key)
            .filter(|gate| !gate.taken.swap(true, Ordering::SeqCst));
        if let Some(gate) = parked {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn generate_script(
        &self,
        _topic: &str,
        _genre: &str,
        _story_prompt: &str,
    ) -> Result<Vec<PanelScript>, GatewayError> {
        self.pass("script".to_owned()).await;
        self.script
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(GatewayError::Generation("no script scripted".to_owned())))
    }

    async fn analyze_characters(
        &self,
        _script: &[PanelScript],
    ) -> Result<Vec<CharacterDraft>, GatewayError> {
        self.pass("analysis".to_owned()).await;
        if self.failing_analysis.load(Ordering::SeqCst) {
            return Err(GatewayError::Generation("analysis returned no JSON".to_owned()));
        }
        Ok(self.drafts.lock().unwrap().clone())
    }

    async fn generate_character_image(
        &self,
        character: &Character,
        style: &str,
    ) -> Result<String, GatewayError> {
        self.pass(format!("character:{}", character.name)).await;
        if self.refused_characters.lock().unwrap().contains(&character.name) {
            return Err(GatewayError::refusal("depicts a real person"));
        }
        if self.failing_characters.lock().unwrap().contains(&character.name) {
            return Err(GatewayError::Generation("no image returned".to_owned()));
        }
        Ok(format!("img://character/{}/{style}", character.name))
    }

    async fn generate_panel_image(
        &self,
        panel: &PanelScript,
        style: &str,
        roster: &[Character],
    ) -> Result<String, GatewayError> {
        let panel_number = panel.panel_number;
        self.pass(format!("panel:{panel_number}")).await;
        let attempt = {
            let mut panel_calls = self.panel_calls.lock().unwrap();
            panel_calls.push(PanelCall {
                panel_number,
                style: style.to_owned(),
                roster: roster.iter().map(|c| c.name.clone()).collect(),
            });
            panel_calls
                .iter()
                .filter(|c| c.panel_number == panel_number)
                .count()
        };
        if self.failing_panels.lock().unwrap().contains(&panel_number) {
            return Err(GatewayError::Generation(format!("panel {panel_number} timed out")));
        }
        Ok(format!("img://panel/{panel_number}/{attempt}"))
    }
}

pub fn panel(panel_number: u32) -> PanelScript {
    PanelScript {
        panel_number,
        description: format!("Scene {panel_number}"),
        dialogue: format!("Line {panel_number}"),
    }
}

pub fn four_panel_script() -> Vec<PanelScript> {
    (1..=4).map(panel).collect()
}

pub fn sample_config() -> ComicConfig {
    ComicConfig {
        topic: "Cat's day".to_owned(),
        style: "watercolor".to_owned(),
        genre: "slice of life".to_owned(),
        story_prompt: "A cat naps through a thunderstorm".to_owned(),
    }
}

/// Builds an orchestrator with a fixed clock and ids counting up from 1.
pub fn build_orchestrator(
    gateway: Arc<ScriptedGateway>,
    journal: Arc<dyn EventJournal>,
) -> Orchestrator {
    let collaborators = Collaborators {
        gateway,
        journal,
        clock: Arc::new(FixedClock::default()),
        ids: Arc::new(SequentialIds::default()),
    };
    Orchestrator::new(collaborators, StudioSettings::default())
}

/// Same as [`build_orchestrator`] with an in-memory journal.
pub fn build_in_memory(gateway: Arc<ScriptedGateway>) -> Orchestrator {
    build_orchestrator(gateway, Arc::new(InMemoryEventJournal::new()))
}

/// An orchestrator that has a config, a four-panel script and a roster of
/// Mina and Taro.
pub async fn build_with_roster(gateway: Arc<ScriptedGateway>) -> Orchestrator {
    gateway.set_drafts(&[("Mina", "a grey cat"), ("Taro", "a tall boy")]);
    let orchestrator = build_in_memory(gateway);
    orchestrator.set_config(sample_config()).await.unwrap();
    orchestrator.generate_script().await.unwrap();
    orchestrator.analyze_characters().await.unwrap();
    orchestrator
}

/// [`build_with_roster`] moved on to the final stage.
pub async fn build_at_final(gateway: Arc<ScriptedGateway>) -> Orchestrator {
    let orchestrator = build_with_roster(gateway).await;
    orchestrator.proceed_to_final().await.unwrap();
    orchestrator
}
