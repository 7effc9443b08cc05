//! Cell layout of a sprite sheet.

use std::fmt;
use std::str::FromStr;

/// How cells are arranged on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteLayout {
    /// Square grid, `ceil(sqrt(n))` cells per side.
    #[default]
    Grid,
    /// A single row of `n` cells.
    Row,
}

impl SpriteLayout {
    /// Number of columns for a sheet holding `count` cells.
    pub fn columns(&self, count: usize) -> u32 {
        match self {
            SpriteLayout::Grid => ceil_sqrt(count as u32),
            SpriteLayout::Row => count as u32,
        }
    }

    /// Number of rows for a sheet holding `count` cells.
    pub fn rows(&self, count: usize) -> u32 {
        match self {
            SpriteLayout::Grid => ceil_sqrt(count as u32),
            SpriteLayout::Row => u32::from(count > 0),
        }
    }

    /// Cell of slot `index` as `(col, row)`, row-major.
    pub fn cell(&self, index: usize, count: usize) -> (u32, u32) {
        let columns = self.columns(count).max(1);
        let index = index as u32;
        (index % columns, index / columns)
    }

    /// Canvas size in pixels as `(width, height)`.
    pub fn canvas_size(&self, count: usize, cell_size: u32) -> (u32, u32) {
        (
            self.columns(count) * cell_size,
            self.rows(count) * cell_size,
        )
    }
}

impl fmt::Display for SpriteLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteLayout::Grid => f.write_str("grid"),
            SpriteLayout::Row => f.write_str("row"),
        }
    }
}

impl FromStr for SpriteLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grid" => Ok(SpriteLayout::Grid),
            "row" => Ok(SpriteLayout::Row),
            other => Err(format!("unknown layout '{}' (expected grid or row)", other)),
        }
    }
}

/// Smallest `w` with `w * w >= n`.
fn ceil_sqrt(n: u32) -> u32 {
    let mut w = f64::from(n).sqrt() as u32;
    while w * w < n {
        w += 1;
    }
    while w > 0 && (w - 1) * (w - 1) >= n {
        w -= 1;
    }
    w
}
