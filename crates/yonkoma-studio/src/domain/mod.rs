//! Domain model for a comic project.

pub mod aggregates;
pub mod characters;
pub mod commands;
pub mod config;
pub mod events;
pub mod panels;
pub mod script;
pub mod stage;
pub mod state;
