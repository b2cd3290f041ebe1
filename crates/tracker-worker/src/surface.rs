//! Board surface provider boundary.
//!
//! The visual board belongs to the host page; all this worker ever sees is
//! the element dump a companion script emits: piece elements, highlight
//! elements, the orientation indicator and the pixel block size, plus the
//! page URL so non-game pages can be ignored.

use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use board_core::snapshot::{HighlightElement, PieceElement, Snapshot};
use board_core::Orientation;

use crate::config::WorkerConfig;
use crate::error::WorkerError;

/// Samples the board surface. `Ok(None)` means the surface is not currently
/// renderable (board not attached, wrong page); the orchestrator retries on
/// the next tick.
pub trait BoardSurface {
    fn capture(&mut self) -> Result<Option<Snapshot>, WorkerError>;
}

/// The raw JSON payload the companion script writes.
#[derive(Debug, Deserialize)]
struct SurfaceDump {
    #[serde(default)]
    url: Option<String>,
    block_size: f64,
    #[serde(default)]
    orientation: Orientation,
    #[serde(default)]
    pieces: Vec<PieceElement>,
    #[serde(default)]
    highlights: Vec<HighlightElement>,
}

/// Production provider: reads the element dump from a file path on every
/// capture. A missing file is simply an absent surface.
pub struct JsonSurface {
    path: PathBuf,
    game_page: Regex,
}

impl JsonSurface {
    pub fn new(config: &WorkerConfig) -> Result<Self, WorkerError> {
        let game_page = Regex::new(&config.game_page_pattern)
            .map_err(|e| WorkerError::Surface(format!("Bad game page pattern: {e}")))?;
        Ok(Self {
            path: PathBuf::from(&config.surface_dump_path),
            game_page,
        })
    }

    fn is_game_page(&self, url: &str) -> bool {
        self.game_page.is_match(url)
    }
}

impl BoardSurface for JsonSurface {
    fn capture(&mut self) -> Result<Option<Snapshot>, WorkerError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let dump: SurfaceDump = serde_json::from_str(&raw)?;

        if let Some(url) = &dump.url {
            if !self.is_game_page(url) {
                debug!(url = %url, "Not a game page, ignoring surface");
                return Ok(None);
            }
        }
        if !dump.block_size.is_finite() || dump.block_size <= 0.0 {
            return Ok(None);
        }

        Ok(Some(Snapshot {
            block_size: dump.block_size,
            orientation: dump.orientation,
            pieces: dump.pieces,
            highlights: dump.highlights,
            captured_at: chrono::Utc::now(),
        }))
    }
}

/// Test/replay provider: plays back a fixed sequence of captures, then
/// reports the surface gone.
#[derive(Default)]
pub struct ScriptedSurface {
    frames: VecDeque<Option<Snapshot>>,
}

impl ScriptedSurface {
    pub fn new(frames: impl IntoIterator<Item = Option<Snapshot>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl BoardSurface for ScriptedSurface {
    fn capture(&mut self) -> Result<Option<Snapshot>, WorkerError> {
        Ok(self.frames.pop_front().flatten())
    }
}
