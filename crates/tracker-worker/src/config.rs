//! Worker configuration from environment variables

use std::env;

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Path the host-page companion writes its surface element dump to.
    pub surface_dump_path: String,

    /// Polling cadence in milliseconds.
    pub poll_interval_ms: u64,

    /// Regex the tracked page URL must match (a game page, not a lobby or
    /// analysis page).
    pub game_page_pattern: String,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Parameterized over the variable lookup so tests never have to mutate
    // process-wide environment state.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let surface_dump_path = get("SURFACE_DUMP_PATH")
            .ok_or(WorkerError::Config("SURFACE_DUMP_PATH not set"))?;

        let poll_interval_ms = get("POLL_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        let game_page_pattern = get("GAME_PAGE_PATTERN").unwrap_or_else(|| {
            r"^https://lichess\.org/[a-zA-Z0-9]{8,12}(?:/.*)?$".to_string()
        });

        Ok(Self {
            surface_dump_path,
            poll_interval_ms,
            game_page_pattern,
        })
    }
}
