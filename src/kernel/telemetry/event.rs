use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::phase::PlaybackPhase;
use crate::kernel::time::Tick;

// Allowed: IDs, indices, durations, counts, enums
// Forbidden: token text

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionStarted {
        session_id: Uuid,
        total_tokens: usize,
    },

    PhaseTransition {
        from: PlaybackPhase,
        to: PlaybackPhase,
    },

    Advanced {
        tick: Tick,
        index: usize,
    },

    DwellScheduled {
        delay_ms: f64,
    },

    RateChanged {
        from: u32,
        to: u32,
    },

    Seeked {
        index: usize,
    },

    /// The tick that found no further chunk to show.
    PassCompleted {
        index: usize,
    },

    /// A timer expiry arrived for a timer that had already been replaced or cancelled.
    StaleTimerDiscarded,

    Reset,
}
