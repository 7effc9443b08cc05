//! Sprite sheet composition.
//!
//! A group of `n` cached images becomes one PNG sheet. With the default
//! [`SpriteLayout::Grid`] the sheet is `w × w` cells where `w = ceil(sqrt(n))`
//! and slot `i` sits at column `i % w`, row `i / w`:
//!
//! ```text
//! n = 5, w = 3
//! ┌───┬───┬───┐
//! │ 0 │ 1 │ 2 │
//! ├───┼───┼───┤
//! │ 3 │ 4 │   │
//! ├───┼───┼───┤
//! │   │   │   │
//! └───┴───┴───┘
//! ```
//!
//! Unused cells are fully transparent.

mod composer;
mod error;
mod layout;

pub use composer::{
    prune_stale_sheets, sheet_path, write_sheet, SpriteComposer, DEFAULT_CELL_SIZE,
    SHEET_EXTENSION,
};
pub use error::SpriteError;
pub use layout::SpriteLayout;
