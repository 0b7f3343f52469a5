use std::collections::VecDeque;

use serde::Serialize;

use super::event::TelemetryEvent;
use crate::kernel::phase::PlaybackPhase;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub sessions: u64,
    pub ticks: u64,
    pub dwells: u64,
    pub plays: u64,
    /// Every stop, including the one at the end of a pass.
    pub pauses: u64,
    pub completions: u64,
    pub rate_changes: u64,
    pub seeks: u64,
    pub resets: u64,
    pub stale_timers: u64,
    pub avg_dwell_ms: f64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut total_dwell_ms = 0.0;

    for event in events {
        match event {
            TelemetryEvent::SessionStarted { .. } => snap.sessions += 1,
            TelemetryEvent::Advanced { .. } => snap.ticks += 1,
            TelemetryEvent::DwellScheduled { delay_ms } => {
                snap.dwells += 1;
                total_dwell_ms += delay_ms;
            }
            TelemetryEvent::PhaseTransition { from, to } => match (from, to) {
                (PlaybackPhase::Idle, PlaybackPhase::Playing) => snap.plays += 1,
                (PlaybackPhase::Playing | PlaybackPhase::Dwelling, PlaybackPhase::Idle) => {
                    snap.pauses += 1
                }
                _ => {}
            },
            TelemetryEvent::RateChanged { .. } => snap.rate_changes += 1,
            TelemetryEvent::Seeked { .. } => snap.seeks += 1,
            TelemetryEvent::StaleTimerDiscarded => snap.stale_timers += 1,
            TelemetryEvent::PassCompleted { .. } => snap.completions += 1,
            TelemetryEvent::Reset => snap.resets += 1,
        }
    }

    if snap.dwells > 0 {
        snap.avg_dwell_ms = total_dwell_ms / snap.dwells as f64;
    }

    snap
}
