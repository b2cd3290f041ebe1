//! Pixel-space to board-square mapping.

use serde::Deserialize;
use shakmaty::{File, Rank, Square};

/// Which color sits at the bottom of the rendered surface.
///
/// `Unknown` means the orientation indicator was missing or unrecognized.
/// Mapping still proceeds (using the white-oriented correction) but callers
/// must treat the results as best-effort and mark downstream state
/// low-confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Orientation {
    White,
    Black,
    #[default]
    Unknown,
}

impl Orientation {
    /// Lenient parse of the surface's orientation indicator.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Orientation::White,
            "black" => Orientation::Black,
            _ => Orientation::Unknown,
        }
    }
}

impl From<String> for Orientation {
    fn from(s: String) -> Self {
        Orientation::parse(&s)
    }
}

/// Convert a raw pixel offset to a board square.
///
/// The offset is divided by the block size and rounded to the nearest grid
/// cell in the surface's native top-left-origin frame, then corrected for
/// orientation so the result is always in absolute rank/file terms: the
/// white-oriented surface has a8 at the top-left (row axis flips), the
/// black-oriented surface has h1 at the top-left (column axis flips).
///
/// Returns `None` for offsets that land outside the 8x8 grid.
pub fn pixel_to_square(x: f64, y: f64, block_size: f64, orientation: Orientation) -> Option<Square> {
    if !block_size.is_finite() || block_size <= 0.0 {
        return None;
    }
    let col = (x / block_size).round();
    let row = (y / block_size).round();
    if !(0.0..=7.0).contains(&col) || !(0.0..=7.0).contains(&row) {
        return None;
    }
    let (col, row) = (col as u32, row as u32);
    let (file, rank) = match orientation {
        Orientation::White | Orientation::Unknown => (col, 7 - row),
        Orientation::Black => (7 - col, row),
    };
    Some(Square::from_coords(File::new(file), Rank::new(rank)))
}
