//! Polling orchestrator: one task, one timeline.
//!
//! A single tokio task owns every piece of mutable state (previous snapshot,
//! game tracker, latest published state), so no two inference passes can ever
//! run concurrently and control commands never race an in-flight tick.

use std::time::Duration;

use shakmaty::Square;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use board_core::snapshot::parse_translate;
use board_core::{infer, pixel_to_square, GameTracker, Orientation, Position, PublishedState, Snapshot};

use crate::publish::StatePublisher;
use crate::surface::BoardSurface;

enum Command {
    Start,
    Stop,
    Query(oneshot::Sender<Option<PublishedState>>),
    Shutdown,
}

/// Cloneable control handle for a spawned tracker task.
#[derive(Clone)]
pub struct TrackerHandle {
    commands: mpsc::Sender<Command>,
}

impl TrackerHandle {
    /// Begin tracking. Idempotent; always resets to a fresh game first.
    pub async fn start(&self) {
        let _ = self.commands.send(Command::Start).await;
    }

    /// Stop tracking. Idempotent; the task stays alive for a later restart.
    pub async fn stop(&self) {
        let _ = self.commands.send(Command::Stop).await;
    }

    /// The most recent published state, or `None` if nothing has been
    /// published yet.
    pub async fn current_state(&self) -> Option<PublishedState> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(Command::Query(reply_tx)).await.is_err() {
            return None;
        }
        reply_rx.await.unwrap_or(None)
    }

    /// Halt the polling task. Cannot race an in-flight tick: the command is
    /// handled on the same task that runs ticks.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

/// The polling orchestrator. Owns the surface, the publisher, and the
/// running game state; driven by [`Tracker::spawn`].
pub struct Tracker<S, P> {
    surface: S,
    publisher: P,
    game: GameTracker,
    previous: Option<Snapshot>,
    latest: Option<PublishedState>,
    tracking: bool,
}

impl<S, P> Tracker<S, P>
where
    S: BoardSurface + Send + 'static,
    P: StatePublisher + Send + 'static,
{
    pub fn new(surface: S, publisher: P) -> Self {
        Self {
            surface,
            publisher,
            game: GameTracker::new(),
            previous: None,
            latest: None,
            tracking: false,
        }
    }

    /// Spawn the polling task and return its control handle.
    pub fn spawn(mut self, poll_interval: Duration) -> (TrackerHandle, JoinHandle<()>) {
        let (command_tx, mut command_rx) = mpsc::channel(16);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.tracking {
                            self.tick();
                        }
                    }
                    command = command_rx.recv() => match command {
                        Some(Command::Start) => self.start(),
                        Some(Command::Stop) => self.stop(),
                        Some(Command::Query(reply)) => {
                            let _ = reply.send(self.latest.clone());
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                }
            }
            info!("Tracker loop stopped");
        });
        (TrackerHandle { commands: command_tx }, join)
    }

    fn start(&mut self) {
        self.game.reset();
        self.previous = None;
        self.latest = None;
        self.tracking = true;
        info!("Tracking started");
    }

    fn stop(&mut self) {
        if self.tracking {
            info!("Tracking stopped");
        }
        self.tracking = false;
    }

    /// One polling step: capture, gate on structural change, infer, update,
    /// publish. Every failure mode degrades to skipping this tick's
    /// publication; nothing here can take the loop down.
    fn tick(&mut self) {
        let snapshot = match self.surface.capture() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!("Surface unavailable, retrying next tick");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Surface capture failed");
                return;
            }
        };

        let changed = match &self.previous {
            Some(previous) => previous.differs(&snapshot),
            None => true,
        };
        if !changed {
            return;
        }

        let previous_position = self
            .previous
            .as_ref()
            .map(Position::from_snapshot)
            .unwrap_or_default();
        let current_position = Position::from_snapshot(&snapshot);
        let highlights = highlight_squares(&snapshot);
        let mv = infer(&previous_position, &current_position, &highlights);
        debug!(mv = %mv.describe(), highlights = highlights.len(), "Inference result");

        let low_confidence = snapshot.orientation == Orientation::Unknown;
        if let Some(state) =
            self.game
                .observe(&current_position, &mv, low_confidence, snapshot.captured_at)
        {
            info!(fen = %state.fen, last_move = %state.last_move, "Position changed");
            if let Err(e) = self.publisher.publish(&state) {
                warn!(error = %e, "Publish failed, state dropped");
            }
            self.latest = Some(state);
        }

        // The new snapshot becomes the comparison baseline even when
        // inference failed, so the same raw change is never reprocessed.
        self.previous = Some(snapshot);
    }
}

/// Map highlighted-square elements through the same coordinate mapper the
/// pieces go through; move inference depends on both living in one frame.
fn highlight_squares(snapshot: &Snapshot) -> Vec<Square> {
    snapshot
        .highlights
        .iter()
        .filter_map(|h| parse_translate(&h.transform))
        .filter_map(|(x, y)| pixel_to_square(x, y, snapshot.block_size, snapshot.orientation))
        .collect()
}
