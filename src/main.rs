use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rsvp::config::ReaderConfig;
use rsvp::kernel::event::Command;
use rsvp::kernel::snapshot::{format_duration, PlaybackSnapshot};
use rsvp::{PlaybackController, Reactor};

struct Args {
    text_path: PathBuf,
    config_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args_os().skip(1);
    let mut text_path = None;
    let mut config_path = None;

    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            config_path = Some(PathBuf::from(path));
        } else if text_path.is_none() {
            text_path = Some(PathBuf::from(arg));
        } else {
            bail!("unexpected argument {:?}", arg);
        }
    }

    let text_path = text_path.context("usage: rsvp <text-file> [--config <path>]")?;
    Ok(Args {
        text_path,
        config_path,
    })
}

fn render(snapshot: &PlaybackSnapshot) {
    let word = if snapshot.current_display.is_empty() {
        "(no text)"
    } else {
        snapshot.current_display.as_str()
    };
    let line = match &snapshot.context {
        Some(ctx) => format!("{}  [ {} ]  {}", ctx.previous, word, ctx.next),
        None => format!("[ {} ]", word),
    };
    println!(
        "{:<60} {:>3.0}%  {} wpm  {} left",
        line,
        snapshot.progress_percent(),
        snapshot.words_per_minute,
        format_duration(snapshot.remaining_seconds_rounded() as f64)
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    let config = ReaderConfig::load(args.config_path.as_deref()).context("loading config")?;

    // 1. Setup Logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber")?;

    // 2. Load text
    let text = tokio::fs::read_to_string(&args.text_path)
        .await
        .with_context(|| format!("reading {}", args.text_path.display()))?;

    let mut controller = PlaybackController::new(config.playback);
    controller.load_text(&text);
    tracing::info!(tokens = controller.tokens().len(), "Text loaded");

    // 3. Setup Reactor
    let shutdown = CancellationToken::new();
    let (reactor, handle) = Reactor::with_shutdown(controller, shutdown.clone());
    let reactor_task = tokio::spawn(reactor.run());

    // 4. Display: print every new frame
    let mut frames = handle.subscribe();
    let display_shutdown = shutdown.clone();
    tokio::spawn(async move {
        render(&frames.borrow_and_update().clone());
        loop {
            tokio::select! {
                _ = display_shutdown.cancelled() => break,
                changed = frames.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = frames.borrow_and_update().clone();
                    render(&snapshot);
                }
            }
        }
    });

    // 5. Console input
    let input = handle.clone();
    let rate_step = config.rate_step;
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Enter toggles, r resets, up/down change speed, left/right step, quit exits.");

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().eq_ignore_ascii_case("quit") {
                input.shutdown();
                break;
            }
            let Some(command) = Command::parse_with_step(&line, rate_step) else {
                tracing::warn!("Unrecognized command: '{}'", line.trim());
                continue;
            };
            if let Err(e) = input.send(command).await {
                tracing::error!("Failed to send command: {}", e);
                break;
            }
        }
    });

    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.shutdown();
        }
    });

    // 6. Run until quit
    let controller = reactor_task.await.context("reactor task panicked")?;
    let summary = controller.telemetry.snapshot();
    let reading = controller.state().accumulated_reading_secs();
    tracing::info!(
        ticks = summary.ticks,
        dwells = summary.dwells,
        completions = summary.completions,
        reading = %format_duration(reading),
        "Session ended"
    );
    Ok(())
}
