//! Running chess-state machine driven by inferred moves.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shakmaty::{Color, Rank, Role, Square};

use crate::inference::{CastleSide, InferredMove};
use crate::position::Position;

/// Castling/turn/counter state for one tracked game.
///
/// Castling availability is derived from the moved flags, never stored
/// directly. Transitions are pure (`apply` consumes and returns a value) so
/// the whole machine is unit-testable without touching the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub turn: Color,
    pub white_king_moved: bool,
    pub white_king_rook_moved: bool,
    pub white_queen_rook_moved: bool,
    pub black_king_moved: bool,
    pub black_king_rook_moved: bool,
    pub black_queen_rook_moved: bool,
    pub en_passant: Option<Square>,
    pub fullmove: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            turn: Color::White,
            white_king_moved: false,
            white_king_rook_moved: false,
            white_queen_rook_moved: false,
            black_king_moved: false,
            black_king_rook_moved: false,
            black_queen_rook_moved: false,
            en_passant: None,
            fullmove: 1,
        }
    }
}

/// The skipped square of a pawn double step, or None for any other move.
fn double_step_target(color: Color, from: Square, to: Square) -> Option<Square> {
    if from.file() != to.file() {
        return None;
    }
    match color {
        Color::White if from.rank() == Rank::Second && to.rank() == Rank::Fourth => {
            Some(Square::from_coords(from.file(), Rank::Third))
        }
        Color::Black if from.rank() == Rank::Seventh && to.rank() == Rank::Fifth => {
            Some(Square::from_coords(from.file(), Rank::Sixth))
        }
        _ => None,
    }
}

impl GameState {
    /// Apply one confirmed move. `Unresolved` is a strict no-op; everything
    /// else toggles the turn, maintains counters and the en-passant target,
    /// and records king/rook movement for castling-rights derivation.
    pub fn apply(mut self, mv: &InferredMove) -> GameState {
        if let InferredMove::Unresolved = mv {
            return self;
        }
        let mover = self.turn;
        // An en-passant target is valid for exactly one reply.
        self.en_passant = None;
        match mv {
            InferredMove::Normal { piece, from, to } => match piece.role {
                Role::Pawn => {
                    self.en_passant = double_step_target(piece.color, *from, *to);
                }
                Role::King => match piece.color {
                    Color::White => self.white_king_moved = true,
                    Color::Black => self.black_king_moved = true,
                },
                Role::Rook => match (piece.color, *from) {
                    (Color::White, Square::A1) => self.white_queen_rook_moved = true,
                    (Color::White, Square::H1) => self.white_king_rook_moved = true,
                    (Color::Black, Square::A8) => self.black_queen_rook_moved = true,
                    (Color::Black, Square::H8) => self.black_king_rook_moved = true,
                    _ => {}
                },
                _ => {}
            },
            InferredMove::Castle { color, side } => match color {
                Color::White => {
                    self.white_king_moved = true;
                    match side {
                        CastleSide::King => self.white_king_rook_moved = true,
                        CastleSide::Queen => self.white_queen_rook_moved = true,
                    }
                }
                Color::Black => {
                    self.black_king_moved = true;
                    match side {
                        CastleSide::King => self.black_king_rook_moved = true,
                        CastleSide::Queen => self.black_queen_rook_moved = true,
                    }
                }
            },
            // A move definitely happened; its identity is unknown, so only
            // the turn/counter bookkeeping runs.
            InferredMove::SquareTouched(_) => {}
            InferredMove::Unresolved => unreachable!(),
        }
        self.turn = !mover;
        if mover == Color::Black {
            self.fullmove += 1;
        }
        self
    }

    /// FEN castling-availability field derived from the moved flags.
    ///
    /// Kingside letters require both the king and the kingside rook to be
    /// unmoved; queenside letters key off the queenside rook alone, so a
    /// kingside castle leaves the queenside letter standing (KQkq becomes
    /// Qkq after White castles short).
    pub fn castling_rights(&self) -> String {
        let mut out = String::new();
        if !self.white_king_moved && !self.white_king_rook_moved {
            out.push('K');
        }
        if !self.white_queen_rook_moved {
            out.push('Q');
        }
        if !self.black_king_moved && !self.black_king_rook_moved {
            out.push('k');
        }
        if !self.black_queen_rook_moved {
            out.push('q');
        }
        if out.is_empty() {
            out.push('-');
        }
        out
    }

    /// Canonical full position string. The half-move clock is reported as a
    /// literal 0: it is not tracked.
    pub fn full_fen(&self, placement: &str) -> String {
        let turn = match self.turn {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let en_passant = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{placement} {turn} {} {en_passant} 0 {}",
            self.castling_rights(),
            self.fullmove
        )
    }
}

/// Immutable state handed to external collaborators on each accepted change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedState {
    /// FEN piece-placement field.
    pub placement: String,
    /// Canonical full position string.
    pub fen: String,
    /// Human-readable last inferred move.
    pub last_move: String,
    pub turn: char,
    pub castling: String,
    pub en_passant: Option<String>,
    pub fullmove: u32,
    /// Set when the board orientation was unknown at capture time and the
    /// coordinate mapping was therefore best-effort.
    pub low_confidence: bool,
    pub captured_at: DateTime<Utc>,
}

/// Duplicate-suppressing wrapper around [`GameState`].
///
/// A re-sampled but semantically unchanged position must neither advance the
/// state machine nor publish a second time, so the tracker compares each
/// newly derived placement string against the last accepted one.
#[derive(Debug, Default)]
pub struct GameTracker {
    state: GameState,
    last_placement: Option<String>,
}

impl GameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Restart for a new tracked game: all flags cleared, move number 1,
    /// White to move, no accepted placement.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one observed position and its inferred move. Returns the state
    /// to publish, or `None` when the placement did not actually change or
    /// the move could not be resolved.
    pub fn observe(
        &mut self,
        position: &Position,
        mv: &InferredMove,
        low_confidence: bool,
        captured_at: DateTime<Utc>,
    ) -> Option<PublishedState> {
        let placement = position.placement();
        if self.last_placement.as_deref() == Some(placement.as_str()) {
            return None;
        }
        if !mv.is_resolved() {
            return None;
        }
        self.state = self.state.apply(mv);
        self.last_placement = Some(placement.clone());
        let fen = self.state.full_fen(&placement);
        Some(PublishedState {
            placement,
            fen,
            last_move: mv.describe(),
            turn: match self.state.turn {
                Color::White => 'w',
                Color::Black => 'b',
            },
            castling: self.state.castling_rights(),
            en_passant: self.state.en_passant.map(|sq| sq.to_string()),
            fullmove: self.state.fullmove,
            low_confidence,
            captured_at,
        })
    }
}
