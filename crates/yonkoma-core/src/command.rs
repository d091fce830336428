//! Command abstractions.

use uuid::Uuid;

/// Trait implemented by inbound requests from the presentation layer.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Whether handling this command calls out to a generation service.
    fn is_generative(&self) -> bool;
}
