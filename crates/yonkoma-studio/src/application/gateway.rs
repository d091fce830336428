//! The generation gateway port.
//!
//! Prompt construction, model selection and response parsing all live on
//! the other side of this trait. The orchestrator only relies on each call
//! either returning content or failing with a [`GatewayError`]; it imposes
//! no timeout, so any deadline is the implementation's business.

use async_trait::async_trait;

use crate::domain::characters::{Character, CharacterDraft};
use crate::domain::script::PanelScript;
use crate::error::GatewayError;

/// Text and image synthesis for a comic project.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Writes a script, normally four panels, from the topic configuration.
    async fn generate_script(
        &self,
        topic: &str,
        genre: &str,
        story_prompt: &str,
    ) -> Result<Vec<PanelScript>, GatewayError>;

    /// Identifies the characters appearing in `script`.
    async fn analyze_characters(
        &self,
        script: &[PanelScript],
    ) -> Result<Vec<CharacterDraft>, GatewayError>;

    /// Draws a design sheet for `character`. Returns an image reference
    /// (a URI; binary content as a `data:` URI).
    async fn generate_character_image(
        &self,
        character: &Character,
        style: &str,
    ) -> Result<String, GatewayError>;

    /// Draws one panel. `roster` is the full character list, passed for
    /// visual consistency between panels.
    async fn generate_panel_image(
        &self,
        panel: &PanelScript,
        style: &str,
        roster: &[Character],
    ) -> Result<String, GatewayError>;
}
