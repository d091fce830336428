//! Comic configuration entered on the topic stage.

use serde::{Deserialize, Serialize};

/// What the comic is about and how it should look.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComicConfig {
    /// Short topic or title.
    pub topic: String,
    /// Art style passed to every image request.
    pub style: String,
    /// Story genre.
    pub genre: String,
    /// Free-form story details.
    pub story_prompt: String,
}

impl ComicConfig {
    /// Whether every field is filled in, i.e. the topic stage may be left.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of the fields that are still empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("topic", &self.topic),
            ("style", &self.style),
            ("genre", &self.genre),
            ("story_prompt", &self.story_prompt),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_missing_every_field() {
        let config = ComicConfig::default();

        assert!(!config.is_ready());
        assert_eq!(
            config.missing_fields(),
            vec!["topic", "style", "genre", "story_prompt"]
        );
    }

    #[test]
    fn test_filled_config_is_ready() {
        let config = ComicConfig {
            topic: "Late for school".to_owned(),
            style: "Modern webtoon".to_owned(),
            genre: "School life".to_owned(),
            story_prompt: "Toast in mouth, running.".to_owned(),
        };

        assert!(config.is_ready());
    }

    #[test]
    fn test_partially_filled_config_reports_the_gap() {
        let config = ComicConfig {
            topic: "Hero's day off".to_owned(),
            genre: "Fantasy".to_owned(),
            ..ComicConfig::default()
        };

        assert_eq!(config.missing_fields(), vec!["style", "story_prompt"]);
    }
}
