//! Piece placement extracted from one snapshot.

use std::collections::BTreeMap;

use shakmaty::{File, Piece, Rank, Square};
use thiserror::Error;

use crate::geometry::pixel_to_square;
use crate::snapshot::{parse_translate, piece_from_tag, Snapshot};

pub const MAX_PIECES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("expected 8 ranks, got {0}")]
    BadRankCount(usize),
    #[error("invalid piece character '{0}'")]
    BadPiece(char),
    #[error("rank \"{0}\" does not span 8 files")]
    BadRankWidth(String),
    #[error("more than {MAX_PIECES} pieces")]
    TooManyPieces,
}

/// A set of placed pieces: at most one piece per square, at most 32 pieces.
///
/// Keyed by square so iteration order is stable, which keeps the diff-based
/// inference fallback deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    squares: BTreeMap<Square, Piece>,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a piece. Refused (returns false) when the square is already
    /// occupied or the position is full.
    pub fn insert(&mut self, square: Square, piece: Piece) -> bool {
        if self.squares.contains_key(&square) || self.squares.len() >= MAX_PIECES {
            return false;
        }
        self.squares.insert(square, piece);
        true
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares.get(&square).copied()
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.squares.contains_key(&square)
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares.iter().map(|(&sq, &p)| (sq, p))
    }

    /// Map every piece element of a snapshot through the coordinate mapper.
    /// Elements with unparsable tags or transforms, or pixel offsets outside
    /// the grid, are skipped: sampling noise must not fail the whole capture.
    pub fn from_snapshot(snapshot: &Snapshot) -> Position {
        let mut position = Position::new();
        for element in &snapshot.pieces {
            let Some(piece) = piece_from_tag(&element.tag) else {
                continue;
            };
            let Some((x, y)) = parse_translate(&element.transform) else {
                continue;
            };
            let Some(square) =
                pixel_to_square(x, y, snapshot.block_size, snapshot.orientation)
            else {
                continue;
            };
            position.insert(square, piece);
        }
        position
    }

    /// Render the FEN piece-placement field: ranks 8 down to 1, separated by
    /// `/`, empty runs encoded as digits.
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in (0..8u32).rev() {
            if rank < 7 {
                out.push('/');
            }
            let mut empty = 0u8;
            for file in 0..8u32 {
                let square = Square::from_coords(File::new(file), Rank::new(rank));
                match self.squares.get(&square) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        out.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
        }
        out
    }

    /// Parse a FEN piece-placement field back into a position.
    pub fn from_placement(placement: &str) -> Result<Position, PlacementError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(PlacementError::BadRankCount(ranks.len()));
        }
        let mut position = Position::new();
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u32;
            let mut file = 0u32;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip;
                } else {
                    let piece =
                        Piece::from_char(c).ok_or(PlacementError::BadPiece(c))?;
                    if file > 7 {
                        return Err(PlacementError::BadRankWidth(rank_str.to_string()));
                    }
                    let square = Square::from_coords(File::new(file), Rank::new(rank));
                    if !position.insert(square, piece) {
                        return Err(PlacementError::TooManyPieces);
                    }
                    file += 1;
                }
            }
            if file != 8 {
                return Err(PlacementError::BadRankWidth(rank_str.to_string()));
            }
        }
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Orientation;
    use crate::snapshot::PieceElement;
    use chrono::Utc;

    pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    #[test]
    fn test_start_placement_round_trip() {
        let position = Position::from_placement(START).unwrap();
        assert_eq!(position.len(), 32);
        assert_eq!(position.placement(), START);
    }

    #[test]
    fn test_placement_with_gaps() {
        let fen = "4k3/8/8/3r4/8/8/4P3/4K3";
        let position = Position::from_placement(fen).unwrap();
        assert_eq!(position.len(), 4);
        assert_eq!(position.placement(), fen);
    }

    #[test]
    fn test_from_placement_rejects_garbage() {
        assert_eq!(
            Position::from_placement("8/8/8"),
            Err(PlacementError::BadRankCount(3))
        );
        assert!(matches!(
            Position::from_placement("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(PlacementError::BadPiece('x'))
        ));
        assert!(matches!(
            Position::from_placement("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR"),
            Err(PlacementError::BadRankWidth(_))
        ));
    }

    #[test]
    fn test_from_placement_enforces_piece_cap() {
        // 64 rooks: syntactically valid FEN ranks, but twice the cap.
        let overfull = "RRRRRRRR/RRRRRRRR/RRRRRRRR/RRRRRRRR/RRRRRRRR/RRRRRRRR/RRRRRRRR/RRRRRRRR";
        assert_eq!(
            Position::from_placement(overfull),
            Err(PlacementError::TooManyPieces)
        );
        // Exactly 32 is still fine.
        assert_eq!(Position::from_placement(START).unwrap().len(), 32);
    }

    #[test]
    fn test_insert_refuses_double_occupancy() {
        let mut position = Position::new();
        let king = piece_from_tag("white king").unwrap();
        let queen = piece_from_tag("white queen").unwrap();
        assert!(position.insert(Square::E1, king));
        assert!(!position.insert(Square::E1, queen));
        assert_eq!(position.piece_at(Square::E1), Some(king));
    }

    #[test]
    fn test_from_snapshot_skips_noise() {
        let block = 64.0;
        let snapshot = Snapshot {
            block_size: block,
            orientation: Orientation::White,
            pieces: vec![
                // e1 in white orientation: col 4, row 7
                PieceElement {
                    tag: "white king".into(),
                    transform: format!("translate({}px, {}px)", 4.0 * block, 7.0 * block),
                },
                PieceElement {
                    tag: "mystery blob".into(),
                    transform: "translate(0px, 0px)".into(),
                },
                PieceElement {
                    tag: "black king".into(),
                    transform: "rotate(12deg)".into(),
                },
                // off the grid entirely
                PieceElement {
                    tag: "black queen".into(),
                    transform: format!("translate({}px, 0px)", 20.0 * block),
                },
            ],
            highlights: vec![],
            captured_at: Utc::now(),
        };
        let position = Position::from_snapshot(&snapshot);
        assert_eq!(position.len(), 1);
        assert_eq!(
            position.piece_at(Square::E1),
            Some(piece_from_tag("white king").unwrap())
        );
    }
}
