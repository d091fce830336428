//! Yonkoma Core — shared domain abstractions.
//!
//! Traits and types the studio context and its infrastructure depend on:
//! aggregates, event envelopes, the event journal port, and the clock and
//! identifier seams that keep a session replayable. No infrastructure code
//! lives here.

pub mod aggregate;
pub mod command;
pub mod determinism;
pub mod error;
pub mod event;
pub mod journal;
