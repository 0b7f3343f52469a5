use tokio::time::Instant;

use super::phase::PlaybackPhase;

/// Strict state delta. This is the ONLY way playback state mutates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateDelta {
    PhaseChanged(PlaybackPhase),
    IndexMoved(usize),
    SessionStarted(Instant),
    ReadingTimeSampled(f64),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    phase: PlaybackPhase,
    /// Index of the next token to display.
    current_index: usize,
    session_started_at: Option<Instant>,
    accumulated_reading_secs: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Empty,
            current_index: 0,
            session_started_at: None,
            accumulated_reading_secs: 0.0,
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure reduction: State + Delta -> Mutated State
    pub fn reduce(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::PhaseChanged(phase) => self.phase = phase,
            StateDelta::IndexMoved(index) => self.current_index = index,
            StateDelta::SessionStarted(at) => self.session_started_at = Some(at),
            StateDelta::ReadingTimeSampled(secs) => self.accumulated_reading_secs = secs,
            StateDelta::Reset => {
                // Phase is left alone: Empty stays Empty, anything else is set by the caller.
                self.current_index = 0;
                self.session_started_at = None;
                self.accumulated_reading_secs = 0.0;
            }
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn session_started_at(&self) -> Option<Instant> {
        self.session_started_at
    }

    pub fn accumulated_reading_secs(&self) -> f64 {
        self.accumulated_reading_secs
    }
}
