//! Yonkoma Studio — the four-panel comic bounded context.
//!
//! Takes a comic from topic, through script and character design, to
//! rendered panels. Text and image synthesis is delegated to a
//! [`GenerationGateway`](application::gateway::GenerationGateway); this crate
//! owns the project state, the stage machine, and the orchestration of
//! generation requests, including partial failure across per-character and
//! per-panel calls.

pub mod application;
pub mod domain;
pub mod error;
pub mod settings;
pub mod telemetry;

pub use application::gateway::GenerationGateway;
pub use application::orchestrator::{Collaborators, Orchestrator};
pub use error::{GatewayError, StudioError};
pub use settings::StudioSettings;
