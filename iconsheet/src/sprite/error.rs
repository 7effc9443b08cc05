//! Error types for sprite sheet composition.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while composing or writing a sprite sheet.
#[derive(Debug, Error)]
pub enum SpriteError {
    /// A sheet needs at least one image.
    #[error("cannot compose a sprite sheet from zero images")]
    EmptyGroup,

    /// Cells must be at least one pixel wide.
    #[error("cell size must be at least 1 pixel")]
    InvalidCellSize,

    /// A cached image could not be read or decoded.
    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// The finished sheet could not be encoded.
    #[error("failed to encode sprite sheet: {0}")]
    Encode(String),

    /// The sheet file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
