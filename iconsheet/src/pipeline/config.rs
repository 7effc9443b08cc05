//! Immutable pipeline configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::{FetchPolicy, DEFAULT_TIMEOUT_SECS};
use crate::group::GroupLimits;
use crate::sprite::{SpriteLayout, DEFAULT_CELL_SIZE};

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "icons";

/// Default sheet output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "sprites";

/// Default index file.
pub const DEFAULT_INDEX_FILE: &str = "index.jsonl";

/// Everything a pipeline run needs, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Content-addressed image cache.
    pub cache_dir: PathBuf,
    /// Directory receiving `{sheet}.png` files.
    pub output_dir: PathBuf,
    /// JSON-lines index destination.
    pub index_path: PathBuf,
    pub fetch_policy: FetchPolicy,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Edge length of one sprite cell in pixels.
    pub cell_size: u32,
    pub group_limits: GroupLimits,
    pub layout: SpriteLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_INDEX_FILE)
    }
}

impl PipelineConfig {
    /// Create a configuration with default tuning for the given locations.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            output_dir: output_dir.into(),
            index_path: index_path.into(),
            fetch_policy: FetchPolicy::default(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cell_size: DEFAULT_CELL_SIZE,
            group_limits: GroupLimits::default(),
            layout: SpriteLayout::default(),
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_index_path(mut self, index_path: impl Into<PathBuf>) -> Self {
        self.index_path = index_path.into();
        self
    }

    pub fn with_fetch_policy(mut self, fetch_policy: FetchPolicy) -> Self {
        self.fetch_policy = fetch_policy;
        self
    }

    pub fn with_http_timeout(mut self, http_timeout: Duration) -> Self {
        self.http_timeout = http_timeout;
        self
    }

    pub fn with_cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_group_limits(mut self, group_limits: GroupLimits) -> Self {
        self.group_limits = group_limits;
        self
    }

    pub fn with_layout(mut self, layout: SpriteLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Path of the sheet written for group `sheet`.
    pub fn sheet_path(&self, sheet: usize) -> PathBuf {
        crate::sprite::sheet_path(&self.output_dir, &sheet.to_string())
    }

    /// Directory that must exist before the index is written, if any.
    pub(crate) fn index_dir(&self) -> Option<&Path> {
        self.index_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}
