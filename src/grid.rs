use eframe::egui;
use egui::{Color32, Pos2, Rect};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed board dimension — the drawing surface is GRID_SIZE × GRID_SIZE cells.
pub const GRID_SIZE: u32 = 32;

// ============================================================================
// GRID CELL
// ============================================================================

/// One paintable unit on the board. Always in-bounds: construction goes
/// through `Cell::new`, which rejects coordinates outside `[0, GRID_SIZE)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub fn new(x: u32, y: u32) -> Option<Self> {
        if x < GRID_SIZE && y < GRID_SIZE {
            Some(Self { x, y })
        } else {
            None
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Map a pointer position inside the on-screen board rectangle to a grid cell.
///
/// The pointer's offset within `board_rect` is scaled to `[0, GRID_SIZE)` and
/// floored. Returns `None` when the position falls outside the rectangle,
/// when the rectangle is degenerate, or when the math produces a non-finite
/// value — callers simply drop such input.
pub fn cell_at(pos: Pos2, board_rect: Rect) -> Option<Cell> {
    let w = board_rect.width();
    let h = board_rect.height();
    if w <= 0.0 || h <= 0.0 {
        return None;
    }

    let fx = ((pos.x - board_rect.min.x) / w * GRID_SIZE as f32).floor();
    let fy = ((pos.y - board_rect.min.y) / h * GRID_SIZE as f32).floor();
    if !fx.is_finite() || !fy.is_finite() || fx < 0.0 || fy < 0.0 {
        return None;
    }

    Cell::new(fx as u32, fy as u32)
}

// ============================================================================
// PIXEL COLOR — validated, normalized hex
// ============================================================================

/// A validated brush color, stored as a normalized lowercase `#rrggbb` string.
///
/// `#rgb` shorthand is expanded on parse; anything that is not 3 or 6 hex
/// digits behind a `#` is rejected. An erased cell is *absence* in the pixel
/// store — there is deliberately no "transparent" `PixelColor`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelColor(String);

impl PixelColor {
    /// Parse and normalize a hex color string. Returns `None` for anything
    /// that does not match `#rgb` or `#rrggbb`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#')?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => Some(Self(format!("#{}", digits.to_ascii_lowercase()))),
            3 => {
                let mut out = String::with_capacity(7);
                out.push('#');
                for b in digits.bytes() {
                    let c = b.to_ascii_lowercase() as char;
                    out.push(c);
                    out.push(c);
                }
                Some(Self(out))
            }
            _ => None,
        }
    }

    /// Build a color from raw channels. Infallible — always normalized.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{:02x}{:02x}{:02x}", r, g, b))
    }

    /// The normalized `#rrggbb` form.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    fn channels(&self) -> [u8; 3] {
        // Infallible: the constructor guarantees exactly 6 hex digits.
        let d = &self.0[1..];
        let parse = |i: usize| u8::from_str_radix(&d[i..i + 2], 16).unwrap_or(0);
        [parse(0), parse(2), parse(4)]
    }

    pub fn to_rgba(&self) -> Rgba<u8> {
        let [r, g, b] = self.channels();
        Rgba([r, g, b, 255])
    }

    pub fn to_color32(&self) -> Color32 {
        let [r, g, b] = self.channels();
        Color32::from_rgb(r, g, b)
    }
}

impl fmt::Debug for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelColor({})", self.0)
    }
}

impl fmt::Display for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
