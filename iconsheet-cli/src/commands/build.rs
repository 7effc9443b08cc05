//! Build command - fetch, then pack.

use std::path::Path;

use clap::Args;
use iconsheet::pipeline::SpritePipeline;

use super::common::{
    apply_cache_dir, apply_fetch, apply_pack, cancel_on_ctrl_c, load_config, runtime,
    CacheDirArgs, EntitiesArgs, FetchArgs, PackArgs,
};
use super::fetch::print_fetch_summary;
use super::pack::print_pack_summary;
use crate::error::CliError;

/// Arguments for the build command.
#[derive(Debug, Args)]
pub struct BuildCommand {
    #[command(flatten)]
    pub entities: EntitiesArgs,
    #[command(flatten)]
    pub cache: CacheDirArgs,
    #[command(flatten)]
    pub fetch: FetchArgs,
    #[command(flatten)]
    pub pack: PackArgs,
}

/// Run the build command.
pub fn run(args: BuildCommand, config_path: Option<&Path>) -> Result<(), CliError> {
    let file = load_config(config_path)?;
    let config = apply_cache_dir(file.to_pipeline_config()?, &args.cache);
    let config = apply_fetch(config, &args.fetch);
    let config = apply_pack(config, &args.pack)?;

    let entities = args.entities.load()?;
    println!("Building sprite sheets for {} entities", entities.len());

    let pipeline = SpritePipeline::from_config(config.clone())?;
    let cancel = cancel_on_ctrl_c()?;
    let report = runtime()?.block_on(pipeline.run(&entities, &cancel))?;

    print_fetch_summary(&report);
    print_pack_summary(&report, &config);
    Ok(())
}
