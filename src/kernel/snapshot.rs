use serde::Serialize;

use super::phase::PlaybackPhase;

/// Tokens either side of the current chunk, shown when context is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    pub previous: String,
    pub next: String,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    pub has_text: bool,
    pub current_index: usize,
    pub total_tokens: usize,
    pub current_display: String,
    /// 0.0 - 1.0
    pub progress_fraction: f64,
    pub remaining_seconds: f64,
    pub words_per_minute: u32,
    pub chunk_size: usize,
    pub pause_on_punctuation: bool,
    pub show_context: bool,
    pub accumulated_reading_seconds: f64,
    pub tokens_read: usize,
    /// Position controls should be disabled while playing.
    pub seek_enabled: bool,
    pub context: Option<ContextWindow>,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Empty,
            is_playing: false,
            has_text: false,
            current_index: 0,
            total_tokens: 0,
            current_display: String::new(),
            progress_fraction: 0.0,
            remaining_seconds: 0.0,
            words_per_minute: 0,
            chunk_size: 1,
            pause_on_punctuation: false,
            show_context: false,
            accumulated_reading_seconds: 0.0,
            tokens_read: 0,
            seek_enabled: true,
            context: None,
        }
    }
}

impl PlaybackSnapshot {
    pub fn progress_percent(&self) -> f64 {
        self.progress_fraction * 100.0
    }

    /// Whole seconds for display; halves round away from zero.
    pub fn remaining_seconds_rounded(&self) -> u64 {
        self.remaining_seconds.round() as u64
    }
}

/// "42s" under a minute, "3m 5s" otherwise.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        return format!("{}s", total);
    }
    format!("{}m {}s", total / 60, total % 60)
}
