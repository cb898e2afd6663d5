//! ASCII rendering of the board
//!
//! Each cell is two characters wide. Odd columns sit half a row lower, so a
//! text row alternates between even-column and odd-column cells.

use rustc_hash::FxHashSet;

use hexfront_core::{Board, Hex, HighlightStyle};

/// Legend printed under every board
pub const LEGEND: &str = "P own piece  E other piece  * valid target  + in range  ? hovered  [] active";

/// Render `board` with its current highlight, selection, and hover
pub fn render_board(board: &Board) -> String {
    let cells: Vec<Hex> = board.cells().keys().copied().collect();
    let (valid, considered): (FxHashSet<Hex>, FxHashSet<Hex>) = match board.highlight() {
        Some(highlight) => (
            highlight.valid.iter().copied().collect(),
            highlight.considered.iter().copied().collect(),
        ),
        None => Default::default(),
    };
    let controlling = &board.config().controlling_faction;

    render_grid(&cells, |hex| {
        let glyph = match board.piece_at(hex) {
            Some(piece) if piece.faction == *controlling => 'P',
            Some(_) => 'E',
            None if valid.contains(&hex) => '*',
            None if considered.contains(&hex) => '+',
            None if board.hovered_cell() == Some(hex) => '?',
            None => '.',
        };
        if board.active_cell() == Some(hex) {
            format!("[{}", glyph)
        } else {
            format!(" {}", glyph)
        }
    })
}

/// Render the band `cells` around `origin` on a blank grid
pub fn render_band(origin: Hex, cells: &[Hex]) -> String {
    let band: FxHashSet<Hex> = cells.iter().copied().collect();
    let mut extent: Vec<Hex> = cells.to_vec();
    extent.push(origin);

    render_grid(&extent, |hex| {
        if hex == origin {
            " O".to_string()
        } else if band.contains(&hex) {
            " *".to_string()
        } else {
            " .".to_string()
        }
    })
}

fn render_grid<F>(cells: &[Hex], glyph: F) -> String
where
    F: Fn(Hex) -> String,
{
    let present: FxHashSet<Hex> = cells.iter().copied().collect();
    let (Some(min_x), Some(max_x)) = (cells.iter().map(|h| h.x).min(), cells.iter().map(|h| h.x).max()) else {
        return String::new();
    };
    let (Some(min_y), Some(max_y)) = (cells.iter().map(|h| h.y).min(), cells.iter().map(|h| h.y).max()) else {
        return String::new();
    };

    let mut out = String::new();
    for y in min_y..=max_y {
        for offset in [false, true] {
            let mut line = String::new();
            for x in min_x..=max_x {
                let hex = Hex::new(x, y);
                if hex.is_offset() == offset && present.contains(&hex) {
                    line.push_str(&glyph(hex));
                } else {
                    line.push_str("  ");
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}

/// Short label for a highlight style
pub fn style_label(style: HighlightStyle) -> &'static str {
    match style {
        HighlightStyle::MovementRange => "movement",
        HighlightStyle::AttackRange => "attack",
    }
}
