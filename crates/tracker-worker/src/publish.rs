//! Transport boundary for published state.
//!
//! Publication is fire-and-forget: a failing transport is logged and dropped,
//! never retried synchronously, and never allowed to stop the polling loop.

use std::io::Write;

use board_core::PublishedState;

use crate::error::WorkerError;

pub trait StatePublisher {
    fn publish(&mut self, state: &PublishedState) -> Result<(), WorkerError>;
}

/// Writes each published state as one JSON line, the same shape the display
/// and analysis collaborators consume.
pub struct NdjsonPublisher<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> StatePublisher for NdjsonPublisher<W> {
    fn publish(&mut self, state: &PublishedState) -> Result<(), WorkerError> {
        let line = serde_json::to_string(state)?;
        writeln!(self.writer, "{line}")
            .map_err(|e| WorkerError::Transport(format!("Failed to write state: {e}")))?;
        self.writer
            .flush()
            .map_err(|e| WorkerError::Transport(format!("Failed to flush state: {e}")))?;
        Ok(())
    }
}
