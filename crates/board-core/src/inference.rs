//! Move inference from successive positions and highlighted squares.
//!
//! Highlighted squares are the authoritative signal when the surface provides
//! them; direct position diffing is the fallback for renderings that omit
//! highlighting. The cascade runs as an ordered strategy list so each
//! fallback stays independently testable.

use shakmaty::{Color, Piece, Square};

use crate::position::Position;

/// Which wing a castling move is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    King,
    Queen,
}

/// The single move recovered from one detected surface change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredMove {
    Normal {
        piece: Piece,
        from: Square,
        to: Square,
    },
    Castle {
        color: Color,
        side: CastleSide,
    },
    /// Only one square was highlighted: not enough to name a full move.
    SquareTouched(Square),
    Unresolved,
}

impl InferredMove {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, InferredMove::Unresolved)
    }

    /// Human-readable rendering for the published last-move field.
    pub fn describe(&self) -> String {
        match self {
            InferredMove::Normal { piece, from, to } => {
                format!("{} {} -> {}", piece.char(), from, to)
            }
            InferredMove::Castle { color, side } => {
                let notation = match side {
                    CastleSide::King => "O-O",
                    CastleSide::Queen => "O-O-O",
                };
                match color {
                    Color::White => format!("White {notation}"),
                    Color::Black => format!("Black {notation}"),
                }
            }
            InferredMove::SquareTouched(square) => square.to_string(),
            InferredMove::Unresolved => "?".to_string(),
        }
    }
}

/// Inputs shared by every inference strategy.
pub struct InferenceContext<'a> {
    pub previous: &'a Position,
    pub current: &'a Position,
    /// Highlighted squares already mapped through the same coordinate mapper
    /// as the pieces, in the surface's listing order.
    pub highlights: &'a [Square],
}

/// One stage of the inference cascade. `None` passes to the next stage.
pub trait InferenceStrategy {
    fn name(&self) -> &'static str;
    fn infer(&self, ctx: &InferenceContext) -> Option<InferredMove>;
}

/// Exactly two highlighted squares: the surface marked source and destination
/// itself. Occupancy breaks the tie; an empty pair is castling evidence.
pub struct HighlightPair;

impl HighlightPair {
    fn castling_pair(a: Square, b: Square) -> Option<(Color, CastleSide)> {
        match (a.min(b), a.max(b)) {
            (Square::E1, Square::G1) | (Square::E1, Square::H1) => {
                Some((Color::White, CastleSide::King))
            }
            (Square::C1, Square::E1) => Some((Color::White, CastleSide::Queen)),
            (Square::E8, Square::G8) | (Square::E8, Square::H8) => {
                Some((Color::Black, CastleSide::King))
            }
            (Square::C8, Square::E8) => Some((Color::Black, CastleSide::Queen)),
            _ => None,
        }
    }
}

impl InferenceStrategy for HighlightPair {
    fn name(&self) -> &'static str {
        "highlight-pair"
    }

    fn infer(&self, ctx: &InferenceContext) -> Option<InferredMove> {
        let &[a, b] = ctx.highlights else {
            return None;
        };
        match (ctx.current.piece_at(a), ctx.current.piece_at(b)) {
            (Some(piece), None) => Some(InferredMove::Normal { piece, from: b, to: a }),
            (None, Some(piece)) => Some(InferredMove::Normal { piece, from: a, to: b }),
            (Some(pa), Some(pb)) => {
                // Both squares occupied is ambiguous. The square whose
                // occupant still matches the previous position looks like the
                // source; failing that, assume the second-listed square is
                // the destination. That last assumption is a heuristic
                // inherited from the surface's highlight order and has no
                // correctness guarantee.
                let a_unchanged = ctx.previous.piece_at(a) == Some(pa);
                let b_unchanged = ctx.previous.piece_at(b) == Some(pb);
                if b_unchanged && !a_unchanged {
                    Some(InferredMove::Normal { piece: pa, from: b, to: a })
                } else {
                    Some(InferredMove::Normal { piece: pb, from: a, to: b })
                }
            }
            (None, None) => {
                // Castling renders both highlighted squares empty at the
                // sampled instant (king and rook are mid-animation).
                Self::castling_pair(a, b)
                    .map(|(color, side)| InferredMove::Castle { color, side })
            }
        }
    }
}

/// Exactly one highlighted square: report it, nothing more can be named.
pub struct SingleHighlight;

impl InferenceStrategy for SingleHighlight {
    fn name(&self) -> &'static str {
        "single-highlight"
    }

    fn infer(&self, ctx: &InferenceContext) -> Option<InferredMove> {
        let &[square] = ctx.highlights else {
            return None;
        };
        Some(InferredMove::SquareTouched(square))
    }
}

/// No usable highlights: diff the positions directly. A piece now standing
/// where it did not stand before, paired with the first same-kind piece that
/// vanished, is reported as the move.
pub struct PositionDiff;

impl InferenceStrategy for PositionDiff {
    fn name(&self) -> &'static str {
        "position-diff"
    }

    fn infer(&self, ctx: &InferenceContext) -> Option<InferredMove> {
        for (to, piece) in ctx.current.iter() {
            if ctx.previous.piece_at(to) == Some(piece) {
                continue;
            }
            for (from, prev_piece) in ctx.previous.iter() {
                if prev_piece != piece || from == to {
                    continue;
                }
                if ctx.current.piece_at(from) == Some(prev_piece) {
                    continue;
                }
                return Some(InferredMove::Normal { piece, from, to });
            }
        }
        None
    }
}

/// Run the inference cascade and return the single move that occurred, or
/// `Unresolved` when no stage could determine one.
pub fn infer(previous: &Position, current: &Position, highlights: &[Square]) -> InferredMove {
    let ctx = InferenceContext {
        previous,
        current,
        highlights,
    };
    let strategies: [&dyn InferenceStrategy; 3] = [&HighlightPair, &SingleHighlight, &PositionDiff];
    for strategy in strategies {
        if let Some(mv) = strategy.infer(&ctx) {
            return mv;
        }
    }
    InferredMove::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Role;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";
    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR";

    fn pos(placement: &str) -> Position {
        Position::from_placement(placement).unwrap()
    }

    fn white(role: Role) -> Piece {
        Piece {
            color: Color::White,
            role,
        }
    }

    #[test]
    fn test_highlight_pair_one_occupied() {
        let prev = pos(START);
        let cur = pos(AFTER_E4);
        let mv = infer(&prev, &cur, &[Square::E2, Square::E4]);
        assert_eq!(
            mv,
            InferredMove::Normal {
                piece: white(Role::Pawn),
                from: Square::E2,
                to: Square::E4,
            }
        );
        // Highlight listing order must not matter when occupancy decides.
        assert_eq!(mv, infer(&prev, &cur, &[Square::E4, Square::E2]));
    }

    #[test]
    fn test_highlight_pair_both_occupied_prefers_changed_square() {
        // A white pawn appeared on d5 while d2 still holds its old pawn; the
        // surface highlighted both squares.
        let prev = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR");
        let cur = pos("rnbqkbnr/ppp1pppp/8/3P4/8/8/PPPP1PPP/RNBQKBNR");
        let mv = HighlightPair.infer(&InferenceContext {
            previous: &prev,
            current: &cur,
            highlights: &[Square::D5, Square::D2],
        });
        // d2 is unchanged from the previous position, so d5 is the destination.
        assert_eq!(
            mv,
            Some(InferredMove::Normal {
                piece: white(Role::Pawn),
                from: Square::D2,
                to: Square::D5,
            })
        );
    }

    #[test]
    fn test_highlight_pair_both_occupied_falls_back_to_second_listed() {
        let prev = pos(START);
        let cur = pos(START);
        // Neither square looks like a source; heuristic picks the second.
        let mv = HighlightPair.infer(&InferenceContext {
            previous: &prev,
            current: &cur,
            highlights: &[Square::B1, Square::D1],
        });
        assert_eq!(
            mv,
            Some(InferredMove::Normal {
                piece: white(Role::Queen),
                from: Square::B1,
                to: Square::D1,
            })
        );
    }

    #[test]
    fn test_castling_pairs() {
        let empty = Position::new();
        let ctx = |highlights: &'static [Square]| InferenceContext {
            previous: &empty,
            current: &empty,
            highlights,
        };
        assert_eq!(
            HighlightPair.infer(&ctx(&[Square::E1, Square::G1])),
            Some(InferredMove::Castle {
                color: Color::White,
                side: CastleSide::King,
            })
        );
        assert_eq!(
            HighlightPair.infer(&ctx(&[Square::H1, Square::E1])),
            Some(InferredMove::Castle {
                color: Color::White,
                side: CastleSide::King,
            })
        );
        assert_eq!(
            HighlightPair.infer(&ctx(&[Square::E1, Square::C1])),
            Some(InferredMove::Castle {
                color: Color::White,
                side: CastleSide::Queen,
            })
        );
        assert_eq!(
            HighlightPair.infer(&ctx(&[Square::E8, Square::G8])),
            Some(InferredMove::Castle {
                color: Color::Black,
                side: CastleSide::King,
            })
        );
        assert_eq!(
            HighlightPair.infer(&ctx(&[Square::E8, Square::C8])),
            Some(InferredMove::Castle {
                color: Color::Black,
                side: CastleSide::Queen,
            })
        );
        // An empty non-castling pair is not a move; the cascade falls through.
        assert_eq!(HighlightPair.infer(&ctx(&[Square::D4, Square::D5])), None);
    }

    #[test]
    fn test_single_highlight() {
        let prev = pos(START);
        let cur = pos(AFTER_E4);
        assert_eq!(
            infer(&prev, &cur, &[Square::E4]),
            InferredMove::SquareTouched(Square::E4)
        );
    }

    #[test]
    fn test_position_diff_fallback() {
        let prev = pos(START);
        let cur = pos(AFTER_E4);
        assert_eq!(
            infer(&prev, &cur, &[]),
            InferredMove::Normal {
                piece: white(Role::Pawn),
                from: Square::E2,
                to: Square::E4,
            }
        );
    }

    #[test]
    fn test_position_diff_capture() {
        // Knight takes the d5 pawn: the pawn simply vanishes, the knight
        // appears on d5.
        let prev = pos("rnbqkbnr/ppp1pppp/8/3p4/8/5N2/PPPPPPPP/RNBQKB1R");
        let cur = pos("rnbqkbnr/ppp1pppp/8/3N4/8/8/PPPPPPPP/RNBQKB1R");
        assert_eq!(
            infer(&prev, &cur, &[]),
            InferredMove::Normal {
                piece: white(Role::Knight),
                from: Square::F3,
                to: Square::D5,
            }
        );
    }

    #[test]
    fn test_unresolved_when_nothing_matches() {
        let prev = Position::new();
        let cur = pos(START);
        // Every piece "appeared" but nothing vanished: no single move fits.
        let mv = infer(&prev, &cur, &[]);
        assert_eq!(mv, InferredMove::Unresolved);
        assert!(!mv.is_resolved());
    }

    #[test]
    fn test_empty_pair_falls_through_to_diff() {
        // Two highlights on empty non-castling squares, but the positions
        // still show a knight move: step 1 fails, step 3 recovers it.
        let prev = pos("8/8/8/8/8/5N2/4K3/8");
        let cur = pos("8/8/8/3N4/8/8/4K3/8");
        assert_eq!(
            infer(&prev, &cur, &[Square::A4, Square::A5]),
            InferredMove::Normal {
                piece: white(Role::Knight),
                from: Square::F3,
                to: Square::D5,
            }
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            InferredMove::Normal {
                piece: white(Role::Knight),
                from: Square::G1,
                to: Square::F3,
            }
            .describe(),
            "N g1 -> f3"
        );
        assert_eq!(
            InferredMove::Castle {
                color: Color::White,
                side: CastleSide::King,
            }
            .describe(),
            "White O-O"
        );
        assert_eq!(InferredMove::SquareTouched(Square::E4).describe(), "e4");
        assert_eq!(InferredMove::Unresolved.describe(), "?");
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(HighlightPair.name(), "highlight-pair");
        assert_eq!(SingleHighlight.name(), "single-highlight");
        assert_eq!(PositionDiff.name(), "position-diff");
    }
}
