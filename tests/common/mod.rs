use chrono::Utc;
use shakmaty::{Color, Role, Square};

use board_core::snapshot::{HighlightElement, PieceElement};
use board_core::{Orientation, Position, Snapshot};

pub const BLOCK: f64 = 64.0;

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

/// White-orientation pixel offset for a square: col = file, row = 7 - rank.
pub fn transform_for(square: Square) -> String {
    let col = u32::from(square.file()) as f64;
    let row = 7.0 - u32::from(square.rank()) as f64;
    format!("translate({}px, {}px)", col * BLOCK, row * BLOCK)
}

fn tag_for(color: Color, role: Role) -> String {
    format!(
        "{} {}",
        match color {
            Color::White => "white",
            Color::Black => "black",
        },
        match role {
            Role::Pawn => "pawn",
            Role::Knight => "knight",
            Role::Bishop => "bishop",
            Role::Rook => "rook",
            Role::Queen => "queen",
            Role::King => "king",
        }
    )
}

/// Build the snapshot a white-oriented surface would render for a placement,
/// with the given squares highlighted.
pub fn snapshot_of(placement: &str, highlighted: &[Square]) -> Snapshot {
    let position = Position::from_placement(placement).expect("valid placement");
    Snapshot {
        block_size: BLOCK,
        orientation: Orientation::White,
        pieces: position
            .iter()
            .map(|(square, piece)| PieceElement {
                tag: tag_for(piece.color, piece.role),
                transform: transform_for(square),
            })
            .collect(),
        highlights: highlighted
            .iter()
            .map(|&square| HighlightElement {
                tag: "last-move".into(),
                transform: transform_for(square),
            })
            .collect(),
        captured_at: Utc::now(),
    }
}
