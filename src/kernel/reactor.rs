use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::controller::PlaybackController;
use super::event::Command;
use super::scheduler::TimerId;
use super::snapshot::PlaybackSnapshot;
use crate::error::ReactorError;

const COMMAND_BUFFER: usize = 100;

/// Async driver for a [`PlaybackController`].
///
/// The controller lives on the reactor's task and nowhere else. Commands arrive over
/// an `mpsc` channel, timer deadlines are awaited in the same `select!`, and every
/// step publishes a fresh snapshot over a `watch` channel. One task, one timer slot:
/// a command and a tick can never interleave mid-transition.
pub struct Reactor {
    controller: PlaybackController,
    receiver: mpsc::Receiver<Command>,
    snapshots: watch::Sender<PlaybackSnapshot>,
    shutdown: CancellationToken,
}

/// Caller side of a running reactor. Cheap to clone.
#[derive(Clone)]
pub struct ReactorHandle {
    sender: mpsc::Sender<Command>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    shutdown: CancellationToken,
}

impl Reactor {
    pub fn new(controller: PlaybackController) -> (Self, ReactorHandle) {
        Self::with_shutdown(controller, CancellationToken::new())
    }

    pub fn with_shutdown(
        controller: PlaybackController,
        shutdown: CancellationToken,
    ) -> (Self, ReactorHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (snap_tx, snap_rx) = watch::channel(controller.snapshot());

        let reactor = Self {
            controller,
            receiver: rx,
            snapshots: snap_tx,
            shutdown: shutdown.clone(),
        };
        let handle = ReactorHandle {
            sender: tx,
            snapshots: snap_rx,
            shutdown,
        };
        (reactor, handle)
    }

    /// Pure step: applies one command to the controller. MUST NOT await.
    pub fn apply(&mut self, command: Command) {
        debug!(?command, "command");
        let c = &mut self.controller;
        match command {
            Command::Play => {
                c.play();
            }
            Command::Pause => {
                c.pause();
            }
            Command::Toggle => {
                c.toggle();
            }
            Command::Reset => c.reset(),
            Command::Seek(index) => {
                c.seek(index);
            }
            Command::Step(delta) => {
                c.step(delta);
            }
            Command::SetRate(wpm) => {
                c.set_rate(wpm);
            }
            Command::AdjustRate(delta) => {
                c.adjust_rate(delta);
            }
            Command::SetChunkSize(n) => {
                c.set_chunk_size(n);
            }
            Command::SetPauseOnPunctuation(enabled) => c.set_pause_on_punctuation(enabled),
            Command::SetShowContext(enabled) => c.set_show_context(enabled),
            Command::LoadText(text) => c.load_text(&text),
        }
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    fn publish(&self) {
        let snapshot = self.controller.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    /// Async driver loop. Runs until shutdown is requested or every handle is dropped,
    /// then hands the controller back with all timers cancelled.
    pub async fn run(mut self) -> PlaybackController {
        info!(session = %self.controller.session_id(), "reactor started");

        loop {
            self.publish();
            let deadline = self.controller.next_deadline();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => break,

                command = self.receiver.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },

                id = wait_for(deadline) => {
                    self.controller.on_timer(id);
                }
            }
        }

        self.controller.pause();
        self.publish();
        info!(session = %self.controller.session_id(), "reactor stopped");
        self.controller
    }
}

async fn wait_for(deadline: Option<(TimerId, Instant)>) -> TimerId {
    match deadline {
        Some((id, at)) => {
            sleep_until(at).await;
            id
        }
        None => std::future::pending().await,
    }
}

impl ReactorHandle {
    pub async fn send(&self, command: Command) -> Result<(), ReactorError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ReactorError::Closed)
    }

    pub fn try_send(&self, command: Command) -> Result<(), ReactorError> {
        self.sender.try_send(command).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => ReactorError::Full,
            mpsc::error::TrySendError::Closed(_) => ReactorError::Closed,
        })
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}
