//! iconsheet CLI - Command-line interface
//!
//! Downloads entity icons, packs them into sprite sheets and writes the
//! sheet index.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use iconsheet::logging::{init_logging, LogConfig};

use commands::build::BuildCommand;
use commands::cache::CacheAction;
use commands::fetch::FetchCommand;
use commands::pack::PackCommand;
use error::CliError;

#[derive(Parser)]
#[command(name = "iconsheet")]
#[command(version = iconsheet::VERSION)]
#[command(about = "Fetch entity icons and pack them into sprite sheets", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/iconsheet/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download icons into the cache
    Fetch(FetchCommand),

    /// Compose sprite sheets and the index from cached icons
    Pack(PackCommand),

    /// Fetch icons, then compose sheets and the index
    Build(BuildCommand),

    /// Inspect or clear the icon cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::default()
        .with_verbose(cli.verbose)
        .with_log_file(cli.log_file.clone());
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    // Return instead of calling process::exit so the guard flushes file logs.
    report(run(cli))
}

fn report(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, config),
        Commands::Pack(args) => commands::pack::run(args, config),
        Commands::Build(args) => commands::build::run(args, config),
        Commands::Cache { action } => commands::cache::run(action, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_with_overrides() {
        let cli = Cli::parse_from([
            "iconsheet",
            "--verbose",
            "build",
            "--entities",
            "list.json",
            "--max-attempts",
            "3",
            "--layout",
            "row",
            "--cell-size",
            "32",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.entities.entities, PathBuf::from("list.json"));
                assert_eq!(args.fetch.max_attempts, Some(3));
                assert_eq!(args.pack.cell_size, Some(32));
                assert!(args.pack.layout.is_some());
            }
            _ => panic!("Expected build command"),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "iconsheet",
            "cache",
            "stats",
            "--cache-dir",
            "/tmp/icons",
            "--config",
            "/etc/iconsheet.ini",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/etc/iconsheet.ini")));
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheAction::Stats { .. }
            }
        ));
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let result = Cli::try_parse_from([
            "iconsheet",
            "fetch",
            "--entities",
            "list.json",
            "--max-attempts",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_is_flushed_to_log_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let log_file = temp.path().join("iconsheet.log");
        let guard = init_logging(LogConfig::default().with_log_file(Some(log_file.clone())))
            .unwrap();

        let _ = report(Err(CliError::CacheStats("disk unreadable".to_string())));
        drop(guard);

        let logged = std::fs::read_to_string(&log_file).unwrap();
        assert!(logged.contains("disk unreadable"));
    }

    #[test]
    fn test_cache_stats_on_missing_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache_dir = temp.path().join("none");
        let action = CacheAction::Stats {
            cache: commands::common::CacheDirArgs {
                cache_dir: Some(cache_dir),
            },
        };
        let config = temp.path().join("absent.ini");

        assert!(commands::cache::run(action, Some(&config)).is_ok());
    }
}
