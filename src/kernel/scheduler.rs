use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::time::millis_to_duration;
use crate::error::PacingError;

/// Dwell length as a multiple of the base interval.
pub const DWELL_FACTOR: f64 = 1.5;

/// Identity of one armed timer. Every arm bumps the generation, so an id read
/// before a disarm/re-arm can never match the timer that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Repeating { interval: Duration },
    Dwell { delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFired {
    Tick,
    DwellElapsed,
}

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    id: TimerId,
    kind: TimerKind,
    due: Instant,
}

/// Owns the one timer slot of a playback session.
///
/// There is exactly one `Option` slot, so at most one timer can be live. Both timer
/// kinds share it: arming a dwell stops the repeating tick and re-arming the tick
/// drops any pending dwell.
#[derive(Debug, Default)]
pub struct PacingScheduler {
    armed: Option<ArmedTimer>,
    generation: u64,
}

impl PacingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the repeating tick, replacing whatever was armed.
    ///
    /// The slot is cleared before the interval is validated, so a rejected call still
    /// leaves zero timers running.
    pub fn arm(&mut self, interval_millis: f64, now: Instant) -> Result<TimerId, PacingError> {
        self.disarm();
        let interval = validate_interval(interval_millis)?;
        let id = self.install(TimerKind::Repeating { interval }, now + interval);
        debug!(generation = id.generation, interval_ms = interval_millis, "tick armed");
        Ok(id)
    }

    /// Cancels the repeating tick and any pending dwell. Idempotent.
    pub fn disarm(&mut self) {
        if let Some(timer) = self.armed.take() {
            debug!(generation = timer.id.generation, kind = ?timer.kind, "timer disarmed");
        }
    }

    /// Stops the tick and arms a one-shot dwell. When it fires the caller resumes the
    /// tick with [`arm`](Self::arm); a disarm before then means it never fires.
    pub fn schedule_dwell(&mut self, delay_millis: f64, now: Instant) -> Result<TimerId, PacingError> {
        self.disarm();
        let delay = validate_interval(delay_millis)?;
        let id = self.install(TimerKind::Dwell { delay }, now + delay);
        debug!(generation = id.generation, delay_ms = delay_millis, "dwell armed");
        Ok(id)
    }

    fn install(&mut self, kind: TimerKind, due: Instant) -> TimerId {
        debug_assert!(
            self.armed.is_none(),
            "timer race: arming while generation {:?} is still live",
            self.armed.map(|t| t.id)
        );
        self.generation += 1;
        let id = TimerId {
            generation: self.generation,
        };
        self.armed = Some(ArmedTimer { id, kind, due });
        id
    }

    /// Delivers an expiry for `id`.
    ///
    /// Returns `None` when `id` is no longer the live timer or is not yet due. A
    /// repeating timer stays armed for its next period; missed periods are skipped
    /// rather than replayed in a burst. A dwell empties the slot.
    pub fn fire(&mut self, id: TimerId, now: Instant) -> Option<TimerFired> {
        let timer = self.armed?;
        if timer.id != id || now < timer.due {
            return None;
        }

        match timer.kind {
            TimerKind::Repeating { interval } => {
                let mut next = timer.due + interval;
                if next <= now {
                    next = now + interval;
                }
                self.armed = Some(ArmedTimer { due: next, ..timer });
                Some(TimerFired::Tick)
            }
            TimerKind::Dwell { .. } => {
                self.armed = None;
                Some(TimerFired::DwellElapsed)
            }
        }
    }

    /// The live timer and when it is due.
    pub fn next_deadline(&self) -> Option<(TimerId, Instant)> {
        self.armed.map(|t| (t.id, t.due))
    }

    /// The live timer's id if it is due at `now`.
    pub fn due_at(&self, now: Instant) -> Option<TimerId> {
        self.armed.filter(|t| t.due <= now).map(|t| t.id)
    }

    pub fn armed_kind(&self) -> Option<TimerKind> {
        self.armed.map(|t| t.kind)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Count of live timers: always 0 or 1.
    pub fn live_timers(&self) -> usize {
        usize::from(self.armed.is_some())
    }
}

fn validate_interval(millis: f64) -> Result<Duration, PacingError> {
    if !millis.is_finite() || millis <= 0.0 {
        return Err(PacingError::InvalidInterval { millis });
    }
    let interval = millis_to_duration(millis);
    if interval.is_zero() {
        return Err(PacingError::InvalidInterval { millis });
    }
    Ok(interval)
}

/// Base tick interval in ms for a rate. Non-finite for a zero rate.
pub fn base_interval_millis(words_per_minute: u32) -> f64 {
    60_000.0 / f64::from(words_per_minute)
}

pub fn dwell_millis(base_interval_millis: f64) -> f64 {
    base_interval_millis * DWELL_FACTOR
}
