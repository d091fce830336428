//! Yonkoma Journal — event journal implementations.
//!
//! Sessions are not persisted across process restarts, so the only journal
//! is an in-memory one. It still enforces the same append contract a durable
//! store would, which is what makes replay of a session trustworthy.

pub mod memory;

pub use memory::InMemoryEventJournal;
