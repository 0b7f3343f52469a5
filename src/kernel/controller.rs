use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::phase::{PhaseGraph, PhaseRequest, PlaybackPhase};
use super::scheduler::{dwell_millis, PacingScheduler, TimerFired, TimerId, TimerKind};
use super::settings::PlaybackSettings;
use super::snapshot::{ContextWindow, PlaybackSnapshot};
use super::state::{PlaybackState, StateDelta};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::recorder::TelemetryRecorder;
use super::time::{Clock, Tick, TokioClock};
use super::tokenizer::{ends_clause, tokenize, TokenSequence};

/// The playback state machine and its public contract.
///
/// Every operation is a synchronous transition. Timer expiries come back in through
/// [`on_timer`](Self::on_timer), so the controller, its scheduler and every tick run
/// on one logical thread and need no locking.
///
/// **INVARIANT**: after any operation returns, the phase is `Playing`/`Dwelling` exactly
/// when the scheduler holds a live timer, and `Dwelling` exactly when that timer is a dwell.
#[derive(Debug)]
pub struct PlaybackController {
    tokens: TokenSequence,
    settings: PlaybackSettings,
    state: PlaybackState,
    scheduler: PacingScheduler,
    clock: Arc<dyn Clock>,
    pub telemetry: TelemetryRecorder,
    session_id: Uuid,
    tick: Tick,
}

impl PlaybackController {
    pub fn new(settings: PlaybackSettings) -> Self {
        Self::with_clock(settings, Arc::new(TokioClock))
    }

    pub fn with_clock(settings: PlaybackSettings, clock: Arc<dyn Clock>) -> Self {
        let mut controller = Self {
            tokens: TokenSequence::default(),
            settings: settings.sanitized(),
            state: PlaybackState::new(),
            scheduler: PacingScheduler::new(),
            clock,
            telemetry: TelemetryRecorder::new(),
            session_id: Uuid::nil(),
            tick: Tick::new(),
        };
        controller.install(TokenSequence::default());
        controller
    }

    /// Tokenizes `text` and installs it, discarding the previous session.
    pub fn load_text(&mut self, text: &str) {
        self.install(tokenize(text));
    }

    /// Replaces the token sequence. Timers are cancelled before anything else changes.
    pub fn install(&mut self, tokens: TokenSequence) {
        self.scheduler.disarm();
        self.apply(StateDelta::Reset);
        self.tokens = tokens;
        self.session_id = Uuid::new_v4();
        self.tick = Tick::new();

        let has_tokens = !self.tokens.is_empty();
        self.request(PhaseRequest::TextLoaded { has_tokens });
        self.telemetry.record(TelemetryEvent::SessionStarted {
            session_id: self.session_id,
            total_tokens: self.tokens.len(),
        });

        info!(
            session = %self.session_id,
            tokens = self.tokens.len(),
            "text installed"
        );
        self.check_invariants();
    }

    /// Starts ticking. No-op when already playing or when there is nothing to play.
    pub fn play(&mut self) -> bool {
        if self.state.is_playing() || self.tokens.is_empty() {
            return false;
        }
        if !self.request(PhaseRequest::Play) {
            return false;
        }

        let now = self.clock.now();
        if self.state.session_started_at().is_none() {
            self.apply(StateDelta::SessionStarted(now));
        }
        self.arm_tick(now);

        info!(
            index = self.state.current_index(),
            wpm = self.settings.words_per_minute,
            "playback started"
        );
        self.check_invariants();
        true
    }

    /// Stops ticking. Reading time stays at its last sample.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        self.stop(PhaseRequest::Pause);
        info!(index = self.state.current_index(), "playback paused");
        self.check_invariants();
        true
    }

    pub fn toggle(&mut self) -> bool {
        if self.state.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Tick handler: move forward one chunk, or stop at the end of the text.
    ///
    /// Ignored unless the phase is `Playing`, so a late tick after a pause or during a
    /// dwell changes nothing.
    pub fn advance(&mut self) {
        if self.state.phase() != PlaybackPhase::Playing {
            debug!(phase = ?self.state.phase(), "advance ignored");
            return;
        }

        let total = self.tokens.len();
        let chunk = self.settings.chunk_size;
        let index = self.state.current_index();

        if index + chunk >= total {
            let last_start = total.saturating_sub(chunk);
            self.apply(StateDelta::IndexMoved(last_start));
            self.telemetry
                .record(TelemetryEvent::PassCompleted { index: last_start });
            self.stop(PhaseRequest::EndOfSequence);
            info!(index = last_start, "reached end of text");
            self.check_invariants();
            return;
        }

        let now = self.clock.now();
        self.sample_reading_time(now);

        // Only the chunk's last token decides the dwell, not punctuation mid-chunk.
        let leaving_clause = ends_clause(&self.tokens[index + chunk - 1]);
        let next = index + chunk;
        let dwell = self.settings.pause_on_punctuation && leaving_clause && next + chunk < total;

        self.apply(StateDelta::IndexMoved(next));
        self.tick = self.tick.next();
        self.telemetry.record(TelemetryEvent::Advanced {
            tick: self.tick,
            index: next,
        });
        debug!(tick = self.tick.frame, index = next, "advanced");

        if dwell {
            self.begin_dwell(now);
        }
        self.check_invariants();
    }

    /// Delivers a timer expiry. Returns false when `id` is not the live timer
    /// (already replaced or cancelled) or is not due yet.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        let now = self.clock.now();
        let Some(fired) = self.scheduler.fire(id, now) else {
            if self.scheduler.next_deadline().map(|(live, _)| live) == Some(id) {
                debug!(generation = id.generation, "timer not due yet");
            } else {
                warn!(generation = id.generation, "discarding stale timer expiry");
                self.telemetry.record(TelemetryEvent::StaleTimerDiscarded);
            }
            return false;
        };

        match fired {
            TimerFired::Tick => self.advance(),
            TimerFired::DwellElapsed => {
                if self.request(PhaseRequest::DwellExpired) {
                    self.arm_tick(now);
                }
            }
        }
        self.check_invariants();
        true
    }

    /// Fires every timer due at the clock's current instant. Returns how many fired.
    pub fn poll(&mut self) -> usize {
        let mut fired = 0;
        while let Some(id) = self.scheduler.due_at(self.clock.now()) {
            if !self.on_timer(id) {
                break;
            }
            fired += 1;
        }
        fired
    }

    /// Moves to `index`, clamped into the token range. Legal while playing; the
    /// running timer keeps its interval.
    pub fn seek(&mut self, index: i64) -> usize {
        let last = self.tokens.len().saturating_sub(1) as i64;
        let target = index.clamp(0, last) as usize;
        if target as i64 != index {
            debug!(requested = index, applied = target, "seek clamped");
        }

        self.apply(StateDelta::IndexMoved(target));
        self.telemetry.record(TelemetryEvent::Seeked { index: target });
        self.check_invariants();
        target
    }

    /// Relative seek, e.g. one token back or forward.
    pub fn step(&mut self, delta: i64) -> usize {
        let current = self.state.current_index() as i64;
        self.seek(current.saturating_add(delta))
    }

    /// Back to the start with no timers armed. A pending dwell is cancelled with the rest.
    pub fn reset(&mut self) {
        self.scheduler.disarm();
        self.request(PhaseRequest::Reset);
        self.apply(StateDelta::Reset);
        self.tick = Tick::new();
        self.telemetry.record(TelemetryEvent::Reset);
        info!(session = %self.session_id, "playback reset");
        self.check_invariants();
    }

    /// Sets an absolute rate. Out-of-range values are rejected and change nothing.
    ///
    /// While playing, the old timer (tick or dwell) is cancelled and a fresh tick armed
    /// at the new interval before this returns.
    pub fn set_rate(&mut self, words_per_minute: u32) -> bool {
        if !PlaybackSettings::rate_in_range(words_per_minute) {
            warn!(requested = words_per_minute, "rate out of range, ignored");
            return false;
        }

        let from = self.settings.words_per_minute;
        if from == words_per_minute {
            return true;
        }
        self.settings.words_per_minute = words_per_minute;
        self.telemetry.record(TelemetryEvent::RateChanged {
            from,
            to: words_per_minute,
        });

        if self.state.is_playing() {
            let now = self.clock.now();
            self.scheduler.disarm();
            self.request(PhaseRequest::RateChanged);
            self.arm_tick(now);
        }

        info!(from, to = words_per_minute, "rate changed");
        self.check_invariants();
        true
    }

    /// Relative rate change; rejected when the result would leave the allowed range.
    pub fn adjust_rate(&mut self, delta: i32) -> bool {
        let target = i64::from(self.settings.words_per_minute) + i64::from(delta);
        match u32::try_from(target) {
            Ok(wpm) => self.set_rate(wpm),
            Err(_) => {
                warn!(requested = target, "rate out of range, ignored");
                false
            }
        }
    }

    /// Takes effect on the next tick. Clamped into 1..=4.
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> usize {
        let applied = PlaybackSettings::clamp_chunk_size(chunk_size);
        if applied != chunk_size {
            debug!(requested = chunk_size, applied, "chunk size clamped");
        }
        self.settings.chunk_size = applied;
        applied
    }

    /// Takes effect on the next tick; a dwell already pending still runs out.
    pub fn set_pause_on_punctuation(&mut self, enabled: bool) {
        self.settings.pause_on_punctuation = enabled;
    }

    pub fn set_show_context(&mut self, enabled: bool) {
        self.settings.show_context = enabled;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let total = self.tokens.len();
        let index = self.state.current_index();
        let chunk = self.settings.chunk_size;
        let current_display = self.tokens.window(index, chunk);

        let (progress_fraction, remaining_seconds) = if total == 0 {
            (0.0, 0.0)
        } else {
            let remaining = total.saturating_sub(index) as f64;
            (
                index as f64 / total as f64,
                remaining * 60.0 / f64::from(self.settings.words_per_minute),
            )
        };

        let context = (self.settings.show_context && !current_display.is_empty()).then(|| {
            ContextWindow {
                previous: index
                    .checked_sub(1)
                    .and_then(|i| self.tokens.get(i))
                    .unwrap_or_default()
                    .to_owned(),
                next: self.tokens.get(index + chunk).unwrap_or_default().to_owned(),
            }
        });

        PlaybackSnapshot {
            phase: self.state.phase(),
            is_playing: self.state.is_playing(),
            has_text: total > 0,
            current_index: index,
            total_tokens: total,
            current_display,
            progress_fraction,
            remaining_seconds,
            words_per_minute: self.settings.words_per_minute,
            chunk_size: chunk,
            pause_on_punctuation: self.settings.pause_on_punctuation,
            show_context: self.settings.show_context,
            accumulated_reading_seconds: self.state.accumulated_reading_secs(),
            tokens_read: index,
            seek_enabled: !self.state.is_playing(),
            context,
        }
    }

    // Read-only accessors

    pub fn tokens(&self) -> &TokenSequence {
        &self.tokens
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn next_deadline(&self) -> Option<(TimerId, Instant)> {
        self.scheduler.next_deadline()
    }

    pub fn armed_kind(&self) -> Option<TimerKind> {
        self.scheduler.armed_kind()
    }

    pub fn live_timers(&self) -> usize {
        self.scheduler.live_timers()
    }

    fn apply(&mut self, delta: StateDelta) {
        self.state.reduce(delta);
    }

    fn request(&mut self, request: PhaseRequest) -> bool {
        let from = self.state.phase();
        let Some(to) = PhaseGraph::transition(from, request) else {
            return false;
        };
        if to != from {
            self.apply(StateDelta::PhaseChanged(to));
            self.telemetry
                .record(TelemetryEvent::PhaseTransition { from, to });
        }
        true
    }

    fn stop(&mut self, request: PhaseRequest) {
        self.scheduler.disarm();
        self.request(request);
    }

    fn arm_tick(&mut self, now: Instant) {
        if let Err(err) = self.scheduler.arm(self.settings.base_interval_millis(), now) {
            warn!(%err, "could not arm tick, stopping playback");
            self.stop(PhaseRequest::Pause);
        }
    }

    fn begin_dwell(&mut self, now: Instant) {
        let delay_ms = dwell_millis(self.settings.base_interval_millis());
        match self.scheduler.schedule_dwell(delay_ms, now) {
            Ok(_) => {
                self.request(PhaseRequest::PunctuationDwell);
                self.telemetry
                    .record(TelemetryEvent::DwellScheduled { delay_ms });
            }
            Err(err) => {
                warn!(%err, "could not schedule dwell, continuing at base rate");
                self.arm_tick(now);
            }
        }
    }

    fn sample_reading_time(&mut self, now: Instant) {
        if let Some(started) = self.state.session_started_at() {
            let secs = now.saturating_duration_since(started).as_secs_f64();
            self.apply(StateDelta::ReadingTimeSampled(secs));
        }
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.state.is_playing(),
            self.scheduler.is_armed(),
            "phase {:?} disagrees with timer slot {:?}",
            self.state.phase(),
            self.scheduler.armed_kind()
        );
        debug_assert_eq!(
            self.state.phase() == PlaybackPhase::Dwelling,
            matches!(self.scheduler.armed_kind(), Some(TimerKind::Dwell { .. })),
            "dwell phase without a dwell timer"
        );
    }
}
