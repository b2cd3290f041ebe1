//! Polling orchestrator for the board-state tracker.
//!
//! Drives the sampler on a fixed cadence, short-circuits unchanged snapshots,
//! and republishes reconstructed state only on actual change. The heavy
//! lifting (mapping, inference, state machine) lives in `board-core`.

pub mod config;
pub mod error;
pub mod publish;
pub mod surface;
pub mod tracker;
