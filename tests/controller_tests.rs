use std::sync::Arc;
use std::time::Duration;

use rsvp::kernel::controller::PlaybackController;
use rsvp::kernel::phase::PlaybackPhase;
use rsvp::kernel::scheduler::TimerKind;
use rsvp::kernel::settings::PlaybackSettings;
use rsvp::kernel::time::{Clock, ManualClock};

fn reader(text: &str, settings: PlaybackSettings) -> (PlaybackController, ManualClock) {
    let clock = ManualClock::new();
    let mut controller = PlaybackController::with_clock(settings, Arc::new(clock.clone()));
    controller.load_text(text);
    (controller, clock)
}

fn settings(wpm: u32, chunk_size: usize) -> PlaybackSettings {
    PlaybackSettings {
        words_per_minute: wpm,
        chunk_size,
        ..PlaybackSettings::default()
    }
}

/// Moves the clock forward and fires whatever came due.
fn run_for(controller: &mut PlaybackController, clock: &ManualClock, millis: u64) -> usize {
    clock.advance_millis(millis);
    controller.poll()
}

fn assert_timer_bijection(controller: &PlaybackController) {
    assert!(controller.live_timers() <= 1);
    assert_eq!(controller.is_playing(), controller.live_timers() == 1);
}

#[test]
fn test_base_interval_at_300_wpm_is_200ms() {
    let (mut c, clock) = reader("a b c d", settings(300, 1));
    assert!(c.play());

    let (_, due) = c.next_deadline().expect("tick armed");
    assert_eq!(due - clock.now(), Duration::from_millis(200));

    assert_eq!(run_for(&mut c, &clock, 199), 0);
    assert_eq!(c.current_index(), 0);
    assert_eq!(run_for(&mut c, &clock, 1), 1);
    assert_eq!(c.current_index(), 1);
}

#[test]
fn test_chunk_size_does_not_change_tick_rate() {
    let (mut c, clock) = reader("a b c d e f g h", settings(300, 3));
    c.play();
    let (_, due) = c.next_deadline().unwrap();
    assert_eq!(due - clock.now(), Duration::from_millis(200));

    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 3);
    assert_eq!(c.snapshot().current_display, "d e f");
}

#[test]
fn test_punctuation_dwell_example() {
    let (mut c, clock) = reader("Hello world. Next sentence", settings(300, 1));
    c.play();

    run_for(&mut c, &clock, 200);
    assert_eq!(c.snapshot().current_display, "world.");
    assert_eq!(c.phase(), PlaybackPhase::Playing);

    // Leaving "world." earns a 1.5x dwell.
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 2);
    assert_eq!(c.phase(), PlaybackPhase::Dwelling);
    assert_eq!(
        c.armed_kind(),
        Some(TimerKind::Dwell { delay: Duration::from_millis(300) })
    );
    assert_timer_bijection(&c);

    assert_eq!(run_for(&mut c, &clock, 299), 0);
    assert_eq!(c.phase(), PlaybackPhase::Dwelling);

    // Dwell over: the tick resumes at the base interval.
    assert_eq!(run_for(&mut c, &clock, 1), 1);
    assert_eq!(c.phase(), PlaybackPhase::Playing);
    assert_eq!(c.current_index(), 2, "dwell expiry itself does not advance");
    let (_, due) = c.next_deadline().unwrap();
    assert_eq!(due - clock.now(), Duration::from_millis(200));

    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 3);
    assert_eq!(c.phase(), PlaybackPhase::Playing);
}

#[test]
fn test_no_dwell_when_disabled() {
    let mut s = settings(300, 1);
    s.pause_on_punctuation = false;
    let (mut c, clock) = reader("Hello world. Next sentence", s);
    c.play();
    run_for(&mut c, &clock, 200);
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 2);
    assert_eq!(c.phase(), PlaybackPhase::Playing);

    // Toggled off mid-session: the next tick already ignores punctuation.
    let (mut c, clock) = reader("Hello world. Next sentence", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    c.set_pause_on_punctuation(false);
    run_for(&mut c, &clock, 200);
    assert_eq!(c.phase(), PlaybackPhase::Playing);
    assert!(matches!(c.armed_kind(), Some(TimerKind::Repeating { .. })));
}

#[test]
fn test_no_dwell_before_final_chunk() {
    let (mut c, clock) = reader("one two. three", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 2);
    assert_eq!(c.phase(), PlaybackPhase::Playing, "next chunk is the last one");
}

#[test]
fn test_only_last_token_of_chunk_triggers_dwell() {
    let (mut c, clock) = reader("a. b c d e f", settings(300, 2));
    c.play();
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 2);
    assert_eq!(c.phase(), PlaybackPhase::Playing, "punctuation mid-chunk is ignored");

    let (mut c, clock) = reader("a b. c d e f", settings(300, 2));
    c.play();
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 2);
    assert_eq!(c.phase(), PlaybackPhase::Dwelling);
}

#[test]
fn test_terminal_advance_clamps_and_stops() {
    let (mut c, _clock) = reader("a b c d e", settings(300, 2));
    c.play();
    c.seek(4);
    c.advance();

    assert_eq!(c.current_index(), 3);
    assert_eq!(c.phase(), PlaybackPhase::Idle);
    assert!(!c.is_playing());
    assert_eq!(c.live_timers(), 0);
    assert_eq!(c.snapshot().current_display, "d e");
}

#[test]
fn test_natural_end_of_pass() {
    let (mut c, clock) = reader("one two three", settings(300, 1));
    c.play();
    for _ in 0..3 {
        run_for(&mut c, &clock, 200);
    }
    assert_eq!(c.current_index(), 2);
    assert!(!c.is_playing());
    assert_eq!(run_for(&mut c, &clock, 1000), 0, "nothing left armed");
}

#[test]
fn test_advance_is_ignored_unless_playing() {
    let (mut c, _clock) = reader("a b c", settings(300, 1));
    c.advance();
    assert_eq!(c.current_index(), 0);
}

#[test]
fn test_mid_play_rate_change() {
    let (mut c, clock) = reader("a b c d e f g h", settings(300, 1));
    c.play();
    let (old_id, _) = c.next_deadline().unwrap();

    run_for(&mut c, &clock, 100);
    assert!(c.set_rate(500));
    assert_eq!(c.live_timers(), 1);
    let (new_id, due) = c.next_deadline().unwrap();
    assert_ne!(old_id, new_id);
    assert_eq!(due - clock.now(), Duration::from_millis(120));

    // The old 200ms timer's moment passes without a tick.
    assert_eq!(run_for(&mut c, &clock, 100), 0);
    assert_eq!(c.current_index(), 0);
    assert!(!c.on_timer(old_id), "stale expiry is discarded");

    assert_eq!(run_for(&mut c, &clock, 20), 1);
    assert_eq!(c.current_index(), 1);
    assert_eq!(c.telemetry.snapshot().stale_timers, 1);
}

#[test]
fn test_rate_change_during_dwell_cancels_dwell() {
    let (mut c, clock) = reader("Hello world. Next sentence here", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    run_for(&mut c, &clock, 200);
    assert_eq!(c.phase(), PlaybackPhase::Dwelling);
    let (dwell_id, _) = c.next_deadline().unwrap();

    assert!(c.set_rate(600));
    assert_eq!(c.phase(), PlaybackPhase::Playing);
    assert_eq!(c.live_timers(), 1);
    assert!(matches!(
        c.armed_kind(),
        Some(TimerKind::Repeating { interval }) if interval == Duration::from_millis(100)
    ));
    assert!(!c.on_timer(dwell_id));

    assert_eq!(run_for(&mut c, &clock, 100), 1);
    assert_eq!(c.current_index(), 3);
}

#[test]
fn test_rate_out_of_range_is_ignored() {
    let (mut c, _clock) = reader("a b c", settings(300, 1));
    for wpm in [0, 50, 99, 1001, 5000, u32::MAX] {
        assert!(!c.set_rate(wpm), "{} should be rejected", wpm);
        assert_eq!(c.settings().words_per_minute, 300);
    }
    assert!(c.set_rate(100));
    assert!(c.set_rate(1000));
    assert_eq!(c.settings().words_per_minute, 1000);
}

#[test]
fn test_adjust_rate_stops_at_bounds() {
    let (mut c, _clock) = reader("a b c", settings(125, 1));
    assert!(c.adjust_rate(-25));
    assert_eq!(c.settings().words_per_minute, 100);
    assert!(!c.adjust_rate(-25), "holding slower at the floor is a no-op");
    assert_eq!(c.settings().words_per_minute, 100);

    c.set_rate(1000);
    assert!(!c.adjust_rate(25));
    assert!(!c.adjust_rate(i32::MIN));
    assert_eq!(c.settings().words_per_minute, 1000);
}

#[test]
fn test_rate_change_while_paused_arms_nothing() {
    let (mut c, clock) = reader("a b c", settings(300, 1));
    assert!(c.set_rate(450));
    assert_eq!(c.live_timers(), 0);
    c.play();
    let (_, due) = c.next_deadline().unwrap();
    assert_eq!(due - clock.now(), Duration::from_micros(133_333));
}

#[test]
fn test_seek_clamps() {
    let (mut c, _clock) = reader("0 1 2 3 4 5 6 7 8 9", settings(300, 1));
    assert_eq!(c.seek(999), 9);
    assert_eq!(c.current_index(), 9);
    assert_eq!(c.seek(-5), 0);
    assert_eq!(c.current_index(), 0);
    assert_eq!(c.seek(4), 4);
    assert_eq!(c.step(-1), 3);
    assert_eq!(c.step(100), 9);
}

#[test]
fn test_seek_while_playing_keeps_timer() {
    let (mut c, clock) = reader("0 1 2 3 4 5 6 7 8 9", settings(300, 1));
    c.play();
    let before = c.next_deadline();
    assert!(!c.snapshot().seek_enabled);

    c.seek(6);
    assert_eq!(c.next_deadline(), before);
    assert!(c.is_playing());

    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 7);
}

#[test]
fn test_reset_is_idempotent() {
    let (mut c, clock) = reader("a b c d e f", settings(300, 1));
    c.play();
    for _ in 0..3 {
        run_for(&mut c, &clock, 200);
    }

    c.reset();
    let once = c.state().clone();
    let snap_once = c.snapshot();
    c.reset();

    assert_eq!(c.state(), &once);
    assert_eq!(c.snapshot(), snap_once);
    assert_eq!(c.current_index(), 0);
    assert_eq!(c.phase(), PlaybackPhase::Idle);
    assert_eq!(c.state().session_started_at(), None);
    assert_eq!(c.state().accumulated_reading_secs(), 0.0);
    assert_eq!(c.live_timers(), 0);
}

#[test]
fn test_reset_during_dwell_prevents_resume() {
    let (mut c, clock) = reader("Hello world. Next sentence here", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    run_for(&mut c, &clock, 200);
    assert_eq!(c.phase(), PlaybackPhase::Dwelling);
    let (dwell_id, _) = c.next_deadline().unwrap();

    c.reset();
    assert_eq!(run_for(&mut c, &clock, 2000), 0);
    assert!(!c.on_timer(dwell_id));
    assert_eq!(c.phase(), PlaybackPhase::Idle);
    assert_eq!(c.current_index(), 0);
    assert_eq!(c.live_timers(), 0);
}

#[test]
fn test_pause_during_dwell_then_resume_ticks() {
    let (mut c, clock) = reader("Hello world. Next sentence here", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    run_for(&mut c, &clock, 200);
    assert_eq!(c.phase(), PlaybackPhase::Dwelling);

    assert!(c.pause());
    assert_eq!(c.live_timers(), 0);
    assert_eq!(run_for(&mut c, &clock, 1000), 0);

    assert!(c.play());
    assert!(matches!(c.armed_kind(), Some(TimerKind::Repeating { .. })));
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 3);
}

#[test]
fn test_play_and_pause_are_idempotent() {
    let (mut c, _clock) = reader("a b c", settings(300, 1));
    assert!(!c.pause());
    assert!(c.play());
    let armed = c.next_deadline();
    assert!(!c.play(), "second play is a no-op");
    assert_eq!(c.next_deadline(), armed);
    assert!(c.pause());
    assert!(!c.pause());
    assert_timer_bijection(&c);
}

#[test]
fn test_toggle() {
    let (mut c, _clock) = reader("a b c", settings(300, 1));
    assert!(c.toggle());
    assert!(c.is_playing());
    assert!(c.toggle());
    assert!(!c.is_playing());
}

#[test]
fn test_empty_input() {
    let (mut c, _clock) = reader("   \n\t ", settings(300, 1));
    assert_eq!(c.phase(), PlaybackPhase::Empty);
    assert!(!c.play());
    assert!(!c.toggle());
    assert_eq!(c.live_timers(), 0);
    assert_eq!(c.seek(3), 0);

    let snap = c.snapshot();
    assert!(!snap.has_text);
    assert_eq!(snap.total_tokens, 0);
    assert_eq!(snap.current_display, "");
    assert_eq!(snap.progress_fraction, 0.0);
    assert_eq!(snap.remaining_seconds, 0.0);
    assert_eq!(snap.context, None);

    c.reset();
    assert_eq!(c.phase(), PlaybackPhase::Empty);
}

#[test]
fn test_loading_new_text_cancels_playback() {
    let (mut c, clock) = reader("Hello world. Next sentence here", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    run_for(&mut c, &clock, 200);
    let old_session = c.session_id();
    let (pending, _) = c.next_deadline().unwrap();

    c.load_text("fresh text");
    assert_eq!(c.phase(), PlaybackPhase::Idle);
    assert_eq!(c.current_index(), 0);
    assert_eq!(c.live_timers(), 0);
    assert_ne!(c.session_id(), old_session);
    assert!(!c.on_timer(pending));
    assert_eq!(c.snapshot().current_display, "fresh");
}

#[test]
fn test_chunk_size_change_applies_on_next_tick() {
    let (mut c, clock) = reader("a b c d e f g h i", settings(300, 1));
    c.play();
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 1);

    assert_eq!(c.set_chunk_size(3), 3);
    assert_eq!(c.snapshot().current_display, "b c d");
    run_for(&mut c, &clock, 200);
    assert_eq!(c.current_index(), 4);

    assert_eq!(c.set_chunk_size(0), 1);
    assert_eq!(c.set_chunk_size(9), 4);
}

#[test]
fn test_remaining_seconds_rounded_for_display() {
    let (c, _clock) = reader("a b c d e", settings(400, 1));
    let snap = c.snapshot();
    assert_eq!(snap.remaining_seconds, 0.75);
    assert_eq!(snap.remaining_seconds_rounded(), 1);

    let (mut c, _clock) = reader("a b c d e", settings(120, 1));
    assert_eq!(c.snapshot().remaining_seconds, 2.5);
    assert_eq!(c.snapshot().remaining_seconds_rounded(), 3, "half rounds up");

    c.seek(4);
    assert_eq!(c.snapshot().remaining_seconds, 0.5);
    assert_eq!(c.snapshot().remaining_seconds_rounded(), 1);

    let (empty, _clock) = reader("", settings(300, 1));
    assert_eq!(empty.snapshot().remaining_seconds_rounded(), 0);
}

#[test]
fn test_reading_time_and_metrics() {
    let (mut c, clock) = reader("0 1 2 3 4 5 6 7 8 9", settings(300, 1));
    let snap = c.snapshot();
    assert_eq!(snap.remaining_seconds, 2.0);
    assert_eq!(snap.progress_fraction, 0.0);

    c.play();
    run_for(&mut c, &clock, 200);
    assert!((c.snapshot().accumulated_reading_seconds - 0.2).abs() < 1e-9);

    c.pause();
    clock.advance_millis(1000);
    assert!(
        (c.snapshot().accumulated_reading_seconds - 0.2).abs() < 1e-9,
        "frozen while paused"
    );

    // Wall-clock since the session start, paused time included.
    c.play();
    run_for(&mut c, &clock, 200);
    let snap = c.snapshot();
    assert!((snap.accumulated_reading_seconds - 1.4).abs() < 1e-9);
    assert_eq!(snap.current_index, 2);
    assert_eq!(snap.tokens_read, 2);
    assert!((snap.progress_fraction - 0.2).abs() < 1e-12);
    assert!((snap.remaining_seconds - 1.6).abs() < 1e-9);
}

#[test]
fn test_context_window() {
    let (mut c, _clock) = reader("one two three four five", settings(300, 2));
    let ctx = c.snapshot().context.expect("context on by default");
    assert_eq!(ctx.previous, "");
    assert_eq!(ctx.next, "three");

    c.seek(2);
    let ctx = c.snapshot().context.unwrap();
    assert_eq!(ctx.previous, "two");
    assert_eq!(ctx.next, "five");

    c.set_show_context(false);
    assert_eq!(c.snapshot().context, None);
}

#[test]
fn test_at_most_one_timer_across_operation_storm() {
    let (mut c, clock) = reader(
        "Alpha beta. Gamma delta! Epsilon zeta? Eta theta; iota kappa: lambda mu nu xi",
        settings(300, 1),
    );

    let ops: [fn(&mut PlaybackController); 10] = [
        |c| {
            c.play();
        },
        |c| {
            c.set_rate(450);
        },
        |c| {
            c.toggle();
        },
        |c| {
            c.seek(3);
        },
        |c| {
            c.set_chunk_size(2);
        },
        |c| {
            c.play();
        },
        |c| {
            c.set_rate(200);
        },
        |c| c.reset(),
        |c| {
            c.set_chunk_size(1);
        },
        |c| {
            c.pause();
        },
    ];

    for round in 0..40 {
        let op = ops[(round * 7) % ops.len()];
        op(&mut c);
        assert_timer_bijection(&c);

        run_for(&mut c, &clock, 50 + (round as u64 * 37) % 300);
        assert_timer_bijection(&c);
        assert_eq!(
            c.phase() == PlaybackPhase::Dwelling,
            matches!(c.armed_kind(), Some(TimerKind::Dwell { .. }))
        );
    }
}
