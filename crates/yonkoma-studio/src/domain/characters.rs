//! Characters and the identity-recovery merge.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use yonkoma_core::determinism::IdSource;

/// A character derived from the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identity across re-analysis of the script.
    pub id: Uuid,
    /// Display name; the key used by identity recovery.
    pub name: String,
    /// Visual description used for image prompts.
    pub description: String,
    /// Design sheet, present once an image call succeeded.
    pub image_url: Option<String>,
}

/// A character candidate returned by script analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDraft {
    /// Character name as it appears in the script.
    pub name: String,
    /// Visual description.
    pub description: String,
}

/// Merges analysis candidates into the existing roster.
///
/// A candidate whose `name` equals an existing character's name, exactly and
/// case-sensitively, keeps that character's `id` and `image_url` and takes
/// the new description. Any other candidate gets a fresh id and no image.
/// A renamed character therefore loses its portrait; this is a known
/// limitation of matching on names.
///
/// Repeated names within `drafts` keep only the first occurrence, so two
/// entries can never end up sharing one id.
pub fn recover_identities(
    existing: &[Character],
    drafts: Vec<CharacterDraft>,
    ids: &dyn IdSource,
) -> Vec<Character> {
    let mut seen = HashSet::with_capacity(drafts.len());
    let mut merged = Vec::with_capacity(drafts.len());

    for draft in drafts {
        if !seen.insert(draft.name.clone()) {
            warn!(name = %draft.name, "analysis returned a duplicate character name; keeping the first");
            continue;
        }
        let character = match existing.iter().find(|c| c.name == draft.name) {
            Some(previous) => Character {
                id: previous.id,
                name: draft.name,
                description: draft.description,
                image_url: previous.image_url.clone(),
            },
            None => Character {
                id: ids.next_id(),
                name: draft.name,
                description: draft.description,
                image_url: None,
            },
        };
        merged.push(character);
    }

    merged
}

/// Returns `characters` with only the image of `character_id` replaced.
/// Unknown ids leave the roster as it was.
#[must_use]
pub fn with_image(characters: &[Character], character_id: Uuid, image_url: &str) -> Vec<Character> {
    characters
        .iter()
        .map(|c| {
            if c.id == character_id {
                Character {
                    image_url: Some(image_url.to_owned()),
                    ..c.clone()
                }
            } else {
                c.clone()
            }
        })
        .collect()
}
