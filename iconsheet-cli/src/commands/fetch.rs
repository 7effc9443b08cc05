//! Fetch command - download entity icons into the cache.

use std::path::Path;

use clap::Args;
use iconsheet::pipeline::{PipelineReport, SpritePipeline};
use tracing::info;

use super::common::{
    apply_cache_dir, apply_fetch, cancel_on_ctrl_c, load_config, runtime, CacheDirArgs,
    EntitiesArgs, FetchArgs,
};
use crate::error::CliError;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchCommand {
    #[command(flatten)]
    pub entities: EntitiesArgs,
    #[command(flatten)]
    pub cache: CacheDirArgs,
    #[command(flatten)]
    pub fetch: FetchArgs,
}

/// Run the fetch command.
pub fn run(args: FetchCommand, config_path: Option<&Path>) -> Result<(), CliError> {
    let file = load_config(config_path)?;
    let config = apply_cache_dir(file.to_pipeline_config()?, &args.cache);
    let config = apply_fetch(config, &args.fetch);

    let entities = args.entities.load()?;
    println!(
        "Fetching {} icons into {}",
        entities.len(),
        config.cache_dir.display()
    );

    let pipeline = SpritePipeline::from_config(config)?;
    let cancel = cancel_on_ctrl_c()?;
    let report = runtime()?.block_on(pipeline.fetch_all(&entities, &cancel))?;

    print_fetch_summary(&report);
    info!(
        downloads = report.downloads,
        cache_hits = report.cache_hits,
        "fetch finished"
    );
    Ok(())
}

/// Print download counters.
pub fn print_fetch_summary(report: &PipelineReport) {
    println!("  Entities:   {}", report.entities);
    println!("  Downloaded: {}", report.downloads);
    println!("  Cached:     {}", report.cache_hits);
}
