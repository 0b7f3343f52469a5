//! In-session playback telemetry.
//!
//! # PRIVACY INVARIANT
//! Events carry indices, counts and durations only. Token text never enters the log.
//!
//! Telemetry is a read-only side channel: nothing in the controller's decision
//! logic reads it back.

pub mod event;
pub mod metrics;
pub mod recorder;
