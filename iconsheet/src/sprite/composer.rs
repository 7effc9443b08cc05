//! Grid compositing of cached images.

use std::fs::{self, File};
use std::io::{self, BufReader, Cursor};
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use super::error::SpriteError;
use super::layout::SpriteLayout;
use crate::fetch::EXPECTED_FORMAT;
use crate::storage::write_atomic;

/// Default edge length of one sprite cell in pixels.
pub const DEFAULT_CELL_SIZE: u32 = 50;

/// File extension of written sheets.
pub const SHEET_EXTENSION: &str = "png";

/// Resampling filter used to fit images into cells.
const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Composes cached images into a single sheet.
///
/// Cell `i` is filled from `paths[i]`, scaled to `cell_size × cell_size`.
/// Pixels are overwritten, not blended; unused cells stay transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteComposer {
    cell_size: u32,
    layout: SpriteLayout,
}

impl Default for SpriteComposer {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            layout: SpriteLayout::Grid,
        }
    }
}

impl SpriteComposer {
    /// Create a composer with the given cell size and layout.
    pub fn new(cell_size: u32, layout: SpriteLayout) -> Self {
        Self { cell_size, layout }
    }

    /// Cell edge length in pixels.
    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Active layout.
    pub fn layout(&self) -> SpriteLayout {
        self.layout
    }

    /// Compose the images at `paths` into one sheet.
    ///
    /// # Errors
    ///
    /// Fails on the first image that cannot be read or decoded; no partial
    /// sheet is returned.
    pub fn compose<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RgbaImage, SpriteError> {
        if paths.is_empty() {
            return Err(SpriteError::EmptyGroup);
        }
        if self.cell_size == 0 {
            return Err(SpriteError::InvalidCellSize);
        }

        let count = paths.len();
        let (width, height) = self.layout.canvas_size(count, self.cell_size);
        let mut canvas = RgbaImage::new(width, height);

        for (index, path) in paths.iter().enumerate() {
            let source = decode_cached(path.as_ref())?;
            let cell = imageops::resize(&source, self.cell_size, self.cell_size, RESAMPLE_FILTER);

            let (col, row) = self.layout.cell(index, count);
            let x = i64::from(col * self.cell_size);
            let y = i64::from(row * self.cell_size);
            imageops::replace(&mut canvas, &cell, x, y);
        }

        debug!(
            images = count,
            width,
            height,
            layout = %self.layout,
            "Composed sprite sheet"
        );
        Ok(canvas)
    }
}

/// Decode one cached image in the cache encoding.
fn decode_cached(path: &Path) -> Result<RgbaImage, SpriteError> {
    let decode_error = |reason: String| SpriteError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| decode_error(e.to_string()))?;
    let image = image::load(BufReader::new(file), EXPECTED_FORMAT)
        .map_err(|e| decode_error(e.to_string()))?;

    Ok(image.to_rgba8())
}

/// Path of sheet `sheet_id` inside `output_dir`.
pub fn sheet_path(output_dir: &Path, sheet_id: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", sheet_id, SHEET_EXTENSION))
}

/// Encode `sheet` losslessly and write it atomically to `path`.
pub fn write_sheet(sheet: &RgbaImage, path: &Path) -> Result<(), SpriteError> {
    let mut buf = Cursor::new(Vec::new());
    sheet
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| SpriteError::Encode(e.to_string()))?;

    write_atomic(path, buf.get_ref()).map_err(|e| SpriteError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Remove sheets numbered `sheet_count` or higher from `output_dir`.
///
/// Only files named `{n}.png` are touched. Returns how many were removed.
pub fn prune_stale_sheets(output_dir: &Path, sheet_count: usize) -> io::Result<usize> {
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SHEET_EXTENSION) {
            continue;
        }
        let stale = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<usize>().ok())
            .is_some_and(|n| n >= sheet_count);
        if stale && entry.file_type()?.is_file() {
            fs::remove_file(&path)?;
            debug!(path = %path.display(), "Removed stale sheet");
            removed += 1;
        }
    }
    Ok(removed)
}
