//! Extraction-and-inference core for reconstructing an authoritative chess
//! game state from a pixel-positioned visual board surface.
//!
//! The surface only exposes piece and square-highlight elements with raw
//! pixel transforms; everything here recovers discrete game semantics from
//! that: snapshot comparison, pixel-to-square mapping, move inference, and a
//! running state machine that renders canonical FEN strings. All of it is
//! pure and synchronous; the polling loop lives in `tracker-worker`.

pub mod geometry;
pub mod inference;
pub mod position;
pub mod snapshot;
pub mod state;

pub use geometry::{pixel_to_square, Orientation};
pub use inference::{infer, CastleSide, InferredMove};
pub use position::Position;
pub use snapshot::{HighlightElement, PieceElement, Snapshot};
pub use state::{GameState, GameTracker, PublishedState};
