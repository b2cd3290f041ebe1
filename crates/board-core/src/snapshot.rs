//! Sampled surface elements and structural change detection.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use shakmaty::{Color, Piece, Role};

use crate::geometry::Orientation;

/// One piece element as sampled from the board surface: an identity tag
/// (e.g. `"white king"`) plus the raw pixel transform it was rendered with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PieceElement {
    pub tag: String,
    pub transform: String,
}

/// One highlighted-square element (last-move or selection marker).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HighlightElement {
    pub tag: String,
    pub transform: String,
}

/// Atomic capture of the visual board surface at one instant.
///
/// Immutable once created; a newer snapshot supersedes it, nothing mutates
/// it. Deserializable because the surface provider delivers element dumps as
/// JSON messages.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    /// Pixel size of one board square in the current rendering.
    pub block_size: f64,
    /// Board-orientation indicator read off the surface.
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub pieces: Vec<PieceElement>,
    #[serde(default)]
    pub highlights: Vec<HighlightElement>,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Structural change detection: two snapshots are equal iff they carry
    /// the same element counts and each corresponding element (in iteration
    /// order) has an identical tag and identical raw transform.
    ///
    /// Order-sensitive on purpose: a reordering with no semantic change costs
    /// one wasted inference pass, not incorrect state.
    pub fn differs(&self, other: &Snapshot) -> bool {
        if self.pieces.len() != other.pieces.len()
            || self.highlights.len() != other.highlights.len()
        {
            return true;
        }
        let pieces_match = self
            .pieces
            .iter()
            .zip(&other.pieces)
            .all(|(a, b)| a.tag == b.tag && a.transform == b.transform);
        let highlights_match = self
            .highlights
            .iter()
            .zip(&other.highlights)
            .all(|(a, b)| a.tag == b.tag && a.transform == b.transform);
        !(pieces_match && highlights_match)
    }
}

/// Extract the pixel offset from a CSS-style transform string, e.g.
/// `translate(264px, 88px)` or `translate3d(264.5px, 88px, 0px)`.
pub fn parse_translate(transform: &str) -> Option<(f64, f64)> {
    let re = Regex::new(
        r"translate(?:3d)?\(\s*(-?\d+(?:\.\d+)?)px\s*,\s*(-?\d+(?:\.\d+)?)px",
    )
    .unwrap();
    let caps = re.captures(transform)?;
    let x = caps.get(1)?.as_str().parse().ok()?;
    let y = caps.get(2)?.as_str().parse().ok()?;
    Some((x, y))
}

/// Parse a surface piece-identity tag into a piece. The tag is a list of
/// class words; color and role can appear in any order and extra animation
/// classes are ignored.
pub fn piece_from_tag(tag: &str) -> Option<Piece> {
    let mut color = None;
    let mut role = None;
    for word in tag.split_whitespace() {
        match word {
            "white" => color = Some(Color::White),
            "black" => color = Some(Color::Black),
            "pawn" => role = Some(Role::Pawn),
            "knight" => role = Some(Role::Knight),
            "bishop" => role = Some(Role::Bishop),
            "rook" => role = Some(Role::Rook),
            "queen" => role = Some(Role::Queen),
            "king" => role = Some(Role::King),
            _ => {}
        }
    }
    Some(Piece {
        color: color?,
        role: role?,
    })
}
