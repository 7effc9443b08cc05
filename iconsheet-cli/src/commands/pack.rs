//! Pack command - compose sprite sheets and the index from cached icons.

use std::path::Path;

use clap::Args;
use iconsheet::pipeline::{PipelineConfig, PipelineReport, SpritePipeline};

use super::common::{
    apply_cache_dir, apply_pack, cancel_on_ctrl_c, load_config, runtime, CacheDirArgs,
    EntitiesArgs, PackArgs,
};
use crate::error::CliError;

/// Arguments for the pack command.
#[derive(Debug, Args)]
pub struct PackCommand {
    #[command(flatten)]
    pub entities: EntitiesArgs,
    #[command(flatten)]
    pub cache: CacheDirArgs,
    #[command(flatten)]
    pub pack: PackArgs,
}

/// Run the pack command. No network access is made.
pub fn run(args: PackCommand, config_path: Option<&Path>) -> Result<(), CliError> {
    let file = load_config(config_path)?;
    let config = apply_cache_dir(file.to_pipeline_config()?, &args.cache);
    let config = apply_pack(config, &args.pack)?;

    let entities = args.entities.load()?;
    println!(
        "Packing {} icons from {}",
        entities.len(),
        config.cache_dir.display()
    );

    let pipeline = SpritePipeline::from_config(config.clone())?;
    let cancel = cancel_on_ctrl_c()?;
    let report = runtime()?.block_on(pipeline.pack(&entities, &cancel))?;

    print_pack_summary(&report, &config);
    Ok(())
}

/// Print sheet and index locations.
pub fn print_pack_summary(report: &PipelineReport, config: &PipelineConfig) {
    println!(
        "  Sheets:     {} in {}",
        report.sheets,
        config.output_dir.display()
    );
    println!("  Index:      {}", config.index_path.display());
}
