//! INI configuration file.
//!
//! ```ini
//! [paths]
//! cache_dir = icons
//! output_dir = sprites
//! index_file = index.jsonl
//!
//! [fetch]
//! max_attempts = 7
//! timeout_secs = 30
//! retry_delay_ms = 0
//!
//! [sprite]
//! cell_size = 50
//! max_group_size = 1000
//! min_group_size = 100
//! layout = grid
//! ```
//!
//! Every key is optional. Unknown sections and keys are ignored.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::debug;

use crate::fetch::{FetchPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT_SECS};
use crate::group::{GroupError, GroupLimits, DEFAULT_MAX_GROUP_SIZE, DEFAULT_MIN_GROUP_SIZE};
use crate::pipeline::{PipelineConfig, DEFAULT_CACHE_DIR, DEFAULT_INDEX_FILE, DEFAULT_OUTPUT_DIR};
use crate::sprite::{SpriteLayout, DEFAULT_CELL_SIZE};

/// Directory name under the user config directory.
const APP_DIR: &str = "iconsheet";

/// Config file name.
const CONFIG_FILE: &str = "config.ini";

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("invalid value '{value}' for [{section}] {key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    #[error("invalid group sizes: {0}")]
    Group(#[from] GroupError),
}

/// Default config file location, e.g. `~/.config/iconsheet/config.ini`.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// `[paths]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsSettings {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub index_file: PathBuf,
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub retry_delay_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_delay_ms: 0,
        }
    }
}

/// `[sprite]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSettings {
    pub cell_size: u32,
    pub max_group_size: usize,
    pub min_group_size: usize,
    pub layout: SpriteLayout,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            layout: SpriteLayout::Grid,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub paths: PathsSettings,
    pub fetch: FetchSettings,
    pub sprite: SpriteSettings,
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults if there is
    /// no config file.
    pub fn load() -> Result<Self, ConfigError> {
        match config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Load {
            path: PathBuf::from("<string>"),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("paths")) {
            let paths = &mut config.paths;
            if let Some(v) = section.get("cache_dir") {
                paths.cache_dir = PathBuf::from(v);
            }
            if let Some(v) = section.get("output_dir") {
                paths.output_dir = PathBuf::from(v);
            }
            if let Some(v) = section.get("index_file") {
                paths.index_file = PathBuf::from(v);
            }
        }

        if let Some(section) = ini.section(Some("fetch")) {
            let fetch = &mut config.fetch;
            set_parsed(section, "fetch", "max_attempts", &mut fetch.max_attempts)?;
            set_parsed(section, "fetch", "timeout_secs", &mut fetch.timeout_secs)?;
            set_parsed(section, "fetch", "retry_delay_ms", &mut fetch.retry_delay_ms)?;
            if fetch.max_attempts == 0 {
                return Err(invalid("fetch", "max_attempts", "0"));
            }
        }

        if let Some(section) = ini.section(Some("sprite")) {
            let sprite = &mut config.sprite;
            set_parsed(section, "sprite", "cell_size", &mut sprite.cell_size)?;
            set_parsed(section, "sprite", "max_group_size", &mut sprite.max_group_size)?;
            set_parsed(section, "sprite", "min_group_size", &mut sprite.min_group_size)?;
            set_parsed(section, "sprite", "layout", &mut sprite.layout)?;
            if sprite.cell_size == 0 {
                return Err(invalid("sprite", "cell_size", "0"));
            }
        }

        Ok(config)
    }

    /// Build the pipeline configuration these settings describe.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let limits = GroupLimits::new(self.sprite.max_group_size, self.sprite.min_group_size)?;
        let policy = FetchPolicy::default()
            .with_max_attempts(self.fetch.max_attempts)
            .with_retry_delay(Duration::from_millis(self.fetch.retry_delay_ms));

        Ok(PipelineConfig::new(
            &self.paths.cache_dir,
            &self.paths.output_dir,
            &self.paths.index_file,
        )
        .with_fetch_policy(policy)
        .with_http_timeout(Duration::from_secs(self.fetch.timeout_secs))
        .with_cell_size(self.sprite.cell_size)
        .with_group_limits(limits)
        .with_layout(self.sprite.layout))
    }
}

fn set_parsed<T: FromStr>(
    section: &Properties,
    name: &str,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = section.get(key) {
        *target = raw.trim().parse().map_err(|_| invalid(name, key, raw))?;
    }
    Ok(())
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}
