//! Panel scripts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Description and dialogue for one panel. `panel_number` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelScript {
    /// One-based panel position; immutable once assigned.
    pub panel_number: u32,
    /// What happens visually in the panel.
    pub description: String,
    /// What the characters say, or narration.
    pub dialogue: String,
}

/// Checks a freshly generated script before it replaces the current one.
///
/// A usable script is non-empty and numbers its panels uniquely from 1.
/// The count is deliberately not checked here.
///
/// # Errors
///
/// Returns `GatewayError::Generation` describing the first problem found.
pub fn validate_generated(script: &[PanelScript]) -> Result<(), GatewayError> {
    if script.is_empty() {
        return Err(GatewayError::Generation("script response was empty".into()));
    }
    let mut seen = HashSet::with_capacity(script.len());
    for panel in script {
        if panel.panel_number == 0 {
            return Err(GatewayError::Generation(
                "script contains panel number 0".into(),
            ));
        }
        if !seen.insert(panel.panel_number) {
            return Err(GatewayError::Generation(format!(
                "script repeats panel number {}",
                panel.panel_number
            )));
        }
    }
    Ok(())
}
