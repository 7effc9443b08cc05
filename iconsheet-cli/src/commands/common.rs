//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, ValueEnum};
use iconsheet::config::ConfigFile;
use iconsheet::entity::{load_entities, Entity};
use iconsheet::group::GroupLimits;
use iconsheet::pipeline::PipelineConfig;
use iconsheet::sprite::SpriteLayout;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CliError;

/// Sheet layout selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum LayoutArg {
    /// Square grid, ceil(sqrt(n)) cells per side
    Grid,
    /// One row of n cells
    Row,
}

impl From<LayoutArg> for SpriteLayout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Grid => SpriteLayout::Grid,
            LayoutArg::Row => SpriteLayout::Row,
        }
    }
}

/// Entity list input.
#[derive(Debug, Args)]
pub struct EntitiesArgs {
    /// JSON array of {name, affiliation, image} records
    #[arg(long, short = 'e')]
    pub entities: PathBuf,
}

impl EntitiesArgs {
    pub fn load(&self) -> Result<Vec<Entity>, CliError> {
        Ok(load_entities(&self.entities)?)
    }
}

/// Cache location override.
#[derive(Debug, Args)]
pub struct CacheDirArgs {
    /// Image cache directory [config: paths.cache_dir]
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Download tuning overrides.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Requests per URL before giving up on "not found" [config: fetch.max_attempts]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Per-request timeout in seconds [config: fetch.timeout_secs]
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Sheet and index overrides.
#[derive(Debug, Args)]
pub struct PackArgs {
    /// Sprite sheet output directory [config: paths.output_dir]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON-lines index file [config: paths.index_file]
    #[arg(long)]
    pub index_file: Option<PathBuf>,

    /// Cell edge length in pixels [config: sprite.cell_size]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub cell_size: Option<u32>,

    /// Maximum entities per sheet [config: sprite.max_group_size]
    #[arg(long)]
    pub max_group_size: Option<usize>,

    /// Minimum entities per sheet, except the last [config: sprite.min_group_size]
    #[arg(long)]
    pub min_group_size: Option<usize>,

    /// Cell arrangement [config: sprite.layout]
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,
}

/// Load the config file: an explicit path, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    debug!(?config, "Resolved config file");
    Ok(config)
}

/// Apply the cache directory flag. CLI takes precedence over config.
pub fn apply_cache_dir(config: PipelineConfig, args: &CacheDirArgs) -> PipelineConfig {
    match &args.cache_dir {
        Some(dir) => config.with_cache_dir(dir),
        None => config,
    }
}

/// Apply download flags.
pub fn apply_fetch(mut config: PipelineConfig, args: &FetchArgs) -> PipelineConfig {
    if let Some(max_attempts) = args.max_attempts {
        let policy = config.fetch_policy.with_max_attempts(max_attempts);
        config = config.with_fetch_policy(policy);
    }
    if let Some(secs) = args.timeout {
        config = config.with_http_timeout(Duration::from_secs(secs));
    }
    config
}

/// Apply sheet and index flags, revalidating group limits.
pub fn apply_pack(mut config: PipelineConfig, args: &PackArgs) -> Result<PipelineConfig, CliError> {
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(path) = &args.index_file {
        config = config.with_index_path(path);
    }
    if let Some(cell_size) = args.cell_size {
        config = config.with_cell_size(cell_size);
    }
    if let Some(layout) = args.layout {
        config = config.with_layout(layout.into());
    }
    if args.max_group_size.is_some() || args.min_group_size.is_some() {
        let current = config.group_limits;
        // Revalidated as a pair; one flag may conflict with the other's config value.
        let limits = GroupLimits::new(
            args.max_group_size.unwrap_or(current.max_group_size()),
            args.min_group_size.unwrap_or(current.min_group_size()),
        )?;
        config = config.with_group_limits(limits);
    }
    Ok(config)
}

/// Build the runtime that drives a pipeline command.
pub fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))
}

/// A token that is cancelled when the user presses Ctrl-C.
pub fn cancel_on_ctrl_c() -> Result<CancellationToken, CliError> {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    ctrlc::set_handler(move || {
        if !handler_token.is_cancelled() {
            eprintln!();
            eprintln!("Received interrupt, stopping...");
            warn!("Interrupted by user");
            handler_token.cancel();
        }
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_args() -> PackArgs {
        PackArgs {
            output_dir: None,
            index_file: None,
            cell_size: None,
            max_group_size: None,
            min_group_size: None,
            layout: None,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let base = PipelineConfig::default();
        let args = PackArgs {
            output_dir: Some(PathBuf::from("out")),
            cell_size: Some(24),
            layout: Some(LayoutArg::Row),
            ..pack_args()
        };

        let config = apply_pack(base, &args).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.index_path, PathBuf::from("index.jsonl"));
        assert_eq!(config.cell_size, 24);
        assert_eq!(config.layout, SpriteLayout::Row);
    }

    #[test]
    fn test_single_group_flag_keeps_other_limit() {
        let args = PackArgs {
            max_group_size: Some(500),
            ..pack_args()
        };

        let config = apply_pack(PipelineConfig::default(), &args).unwrap();

        assert_eq!(config.group_limits.max_group_size(), 500);
        assert_eq!(config.group_limits.min_group_size(), 100);
    }

    #[test]
    fn test_invalid_group_flags_rejected() {
        let args = PackArgs {
            max_group_size: Some(50),
            ..pack_args()
        };

        assert!(matches!(
            apply_pack(PipelineConfig::default(), &args),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_fetch_flags() {
        let args = FetchArgs {
            max_attempts: Some(2),
            timeout: Some(5),
        };

        let config = apply_fetch(PipelineConfig::default(), &args);

        assert_eq!(config.fetch_policy.max_attempts, 2);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cache_dir_flag() {
        let args = CacheDirArgs {
            cache_dir: Some(PathBuf::from("/tmp/icons")),
        };
        let config = apply_cache_dir(PipelineConfig::default(), &args);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/icons"));
    }
}
