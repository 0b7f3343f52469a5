use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::scheduler;

pub const WPM_RANGE: RangeInclusive<u32> = 100..=1000;
pub const CHUNK_RANGE: RangeInclusive<usize> = 1..=4;

/// Increment used by the faster/slower controls.
pub const DEFAULT_RATE_STEP: u32 = 25;

pub const DEFAULT_WPM: u32 = 300;

/// Reader-tunable playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// 100 - 1000. One tick per `60000 / wpm` ms regardless of chunk size.
    pub words_per_minute: u32,
    /// 1 - 4 tokens shown per tick.
    pub chunk_size: usize,
    pub pause_on_punctuation: bool,
    pub show_context: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WPM,
            chunk_size: 1,
            pause_on_punctuation: true,
            show_context: true,
        }
    }
}

impl PlaybackSettings {
    /// Milliseconds between ticks at the current rate.
    pub fn base_interval_millis(&self) -> f64 {
        scheduler::base_interval_millis(self.words_per_minute)
    }

    pub fn rate_in_range(wpm: u32) -> bool {
        WPM_RANGE.contains(&wpm)
    }

    pub fn clamp_chunk_size(n: usize) -> usize {
        n.clamp(*CHUNK_RANGE.start(), *CHUNK_RANGE.end())
    }

    /// Pulls an out-of-range rate or chunk size back to the nearest bound.
    pub fn sanitized(self) -> Self {
        Self {
            words_per_minute: self
                .words_per_minute
                .clamp(*WPM_RANGE.start(), *WPM_RANGE.end()),
            chunk_size: Self::clamp_chunk_size(self.chunk_size),
            ..self
        }
    }
}
