//! Rendered panels.

use serde::{Deserialize, Serialize};

/// A successfully rendered panel image. `panel_number` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPanel {
    /// The script panel this image belongs to.
    pub panel_number: u32,
    /// Image reference returned by the gateway.
    pub image_url: String,
}

/// Inserts `panel`, replacing any entry with the same number, and returns
/// the result sorted by panel number.
#[must_use]
pub fn upsert(panels: &[GeneratedPanel], panel: GeneratedPanel) -> Vec<GeneratedPanel> {
    let mut next: Vec<GeneratedPanel> = panels
        .iter()
        .filter(|p| p.panel_number != panel.panel_number)
        .cloned()
        .collect();
    next.push(panel);
    next.sort_by_key(|p| p.panel_number);
    next
}
