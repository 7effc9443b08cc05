//! Cache management CLI commands.

use std::path::Path;

use clap::Subcommand;
use iconsheet::cache::ImageCache;
use iconsheet::config::format_size;

use super::common::{load_config, CacheDirArgs};
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Remove every cached icon
    Clear {
        #[command(flatten)]
        cache: CacheDirArgs,
    },
    /// Show cached icon count and size
    Stats {
        #[command(flatten)]
        cache: CacheDirArgs,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let resolve = |args: &CacheDirArgs| {
        args.cache_dir
            .clone()
            .unwrap_or_else(|| config.paths.cache_dir.clone())
    };

    match action {
        CacheAction::Clear { cache } => {
            let cache = ImageCache::new(resolve(&cache));
            println!("Clearing icon cache at: {}", cache.directory().display());

            let result = cache
                .clear()
                .map_err(|e| CliError::CacheClear(e.to_string()))?;
            println!(
                "Deleted {} files, freed {}",
                result.files_deleted,
                format_size(result.bytes_freed)
            );
            Ok(())
        }
        CacheAction::Stats { cache } => {
            let cache = ImageCache::new(resolve(&cache));
            println!("Icon cache: {}", cache.directory().display());

            let stats = cache
                .stats()
                .map_err(|e| CliError::CacheStats(e.to_string()))?;
            println!("  Files: {}", stats.files);
            println!("  Size:  {}", format_size(stats.bytes));
            Ok(())
        }
    }
}
