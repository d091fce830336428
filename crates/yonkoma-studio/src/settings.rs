//! Studio settings read from the environment.

use std::str::FromStr;

use thiserror::Error;

/// Default number of panels a generated script is expected to have.
pub const DEFAULT_EXPECTED_PANELS: usize = 4;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(SettingsError::Invalid {
                key: "YONKOMA_LOG_FORMAT",
                value: value.to_owned(),
                reason: "expected `json` or `pretty`".to_owned(),
            }),
        }
    }
}

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A variable is set but cannot be used.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Environment variable name.
        key: &'static str,
        /// The offending value.
        value: String,
        /// What was expected.
        reason: String,
    },
}

/// Runtime settings for a studio session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioSettings {
    /// Panel count a generated script should have; other counts are logged.
    pub expected_panel_count: usize,
    /// `EnvFilter` directive for tracing.
    pub log_filter: String,
    /// Tracing output format.
    pub log_format: LogFormat,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            expected_panel_count: DEFAULT_EXPECTED_PANELS,
            log_filter: "info".to_owned(),
            log_format: LogFormat::Json,
        }
    }
}

impl StudioSettings {
    /// Reads settings from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset keys.
    ///
    /// Recognised keys: `YONKOMA_EXPECTED_PANELS`, `YONKOMA_LOG`,
    /// `YONKOMA_LOG_FORMAT`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Invalid` if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let expected_panel_count = match lookup("YONKOMA_EXPECTED_PANELS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(count) if count > 0 => count,
                Ok(_) => {
                    return Err(SettingsError::Invalid {
                        key: "YONKOMA_EXPECTED_PANELS",
                        value: raw,
                        reason: "must be at least 1".to_owned(),
                    });
                }
                Err(e) => {
                    return Err(SettingsError::Invalid {
                        key: "YONKOMA_EXPECTED_PANELS",
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
            None => defaults.expected_panel_count,
        };

        let log_filter = lookup("YONKOMA_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let log_format = match lookup("YONKOMA_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            expected_panel_count,
            log_filter,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_unset_environment_uses_defaults() {
        let settings = StudioSettings::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(settings, StudioSettings::default());
        assert_eq!(settings.expected_panel_count, 4);
    }

    #[test]
    fn test_values_are_read_from_lookup() {
        let settings = StudioSettings::from_lookup(lookup_from(&[
            ("YONKOMA_EXPECTED_PANELS", "6"),
            ("YONKOMA_LOG", "yonkoma_studio=debug"),
            ("YONKOMA_LOG_FORMAT", "Pretty"),
        ]))
        .unwrap();

        assert_eq!(settings.expected_panel_count, 6);
        assert_eq!(settings.log_filter, "yonkoma_studio=debug");
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_zero_panels_is_invalid() {
        let result = StudioSettings::from_lookup(lookup_from(&[("YONKOMA_EXPECTED_PANELS", "0")]));

        match result.unwrap_err() {
            SettingsError::Invalid { key, .. } => assert_eq!(key, "YONKOMA_EXPECTED_PANELS"),
        }
    }

    #[test]
    fn test_unknown_log_format_is_invalid() {
        let result = StudioSettings::from_lookup(lookup_from(&[("YONKOMA_LOG_FORMAT", "xml")]));

        assert!(result.is_err());
    }
}
