use serde::{Deserialize, Serialize};

/// The explicit lifecycle states of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No tokens installed. Only a new text leaves this state.
    #[default]
    Empty,
    /// Tokens installed, no timer armed.
    Idle,
    /// Repeating tick armed.
    Playing,
    /// Punctuation dwell armed; the tick resumes when it expires.
    Dwelling,
}

impl PlaybackPhase {
    /// True exactly when a timer should be armed.
    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackPhase::Playing | PlaybackPhase::Dwelling)
    }
}

/// Requests for a phase change. The graph decides whether they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseRequest {
    TextLoaded { has_tokens: bool },
    Play,
    Pause,
    EndOfSequence,
    PunctuationDwell,
    DwellExpired,
    RateChanged,
    Reset,
}

pub struct PhaseGraph;

impl PhaseGraph {
    /// Pure function: (current phase, request) -> next phase.
    /// `None` means the request does not apply in the current phase.
    pub fn transition(current: PlaybackPhase, request: PhaseRequest) -> Option<PlaybackPhase> {
        use PhaseRequest::*;
        use PlaybackPhase::*;

        match (current, request) {
            (_, TextLoaded { has_tokens: false }) => Some(Empty),
            (_, TextLoaded { has_tokens: true }) => Some(Idle),

            (Idle, Play) => Some(Playing),

            (Playing, Pause) | (Dwelling, Pause) => Some(Idle),
            (Playing, EndOfSequence) => Some(Idle),
            (Playing, PunctuationDwell) => Some(Dwelling),

            (Dwelling, DwellExpired) => Some(Playing),
            // A rate change drops the pending dwell and restarts the tick.
            (Playing, RateChanged) | (Dwelling, RateChanged) => Some(Playing),

            (Idle, Reset) | (Playing, Reset) | (Dwelling, Reset) => Some(Idle),

            _ => None,
        }
    }
}
