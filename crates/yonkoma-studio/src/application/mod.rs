//! Application layer: the generation orchestrator and its ports.

pub mod dispatch;
pub mod gateway;
pub mod orchestrator;
pub mod outcome;
pub mod replay;
pub mod snapshot;
