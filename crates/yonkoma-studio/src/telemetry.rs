//! Tracing subscriber setup for applications embedding the studio.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::settings::{LogFormat, StudioSettings};

/// Telemetry setup errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Installs the global tracing subscriber described by `settings`.
///
/// `RUST_LOG` takes precedence over `settings.log_filter` when set.
///
/// # Errors
///
/// Returns `TelemetryError` if the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(settings: &StudioSettings) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_filter)?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match settings.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))?;

    tracing::info!(
        expected_panels = settings.expected_panel_count,
        "yonkoma studio tracing initialised"
    );
    Ok(())
}
