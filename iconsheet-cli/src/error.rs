//! CLI error type.

use std::fmt;

use iconsheet::config::ConfigError;
use iconsheet::entity::EntityError;
use iconsheet::group::GroupError;
use iconsheet::pipeline::PipelineError;

/// Errors surfaced to the user. Each maps to exit status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or flag problem.
    Config(String),
    /// The entity list could not be loaded.
    Entities(EntityError),
    /// The pipeline aborted.
    Pipeline(PipelineError),
    /// Ctrl-C was pressed.
    Cancelled,
    CacheStats(String),
    CacheClear(String),
    /// Async runtime could not be created.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Entities(e) => write!(f, "{}", e),
            CliError::Pipeline(e) => write!(f, "{}", e),
            CliError::Cancelled => write!(f, "Cancelled"),
            CliError::CacheStats(msg) => write!(f, "Failed to read cache statistics: {}", msg),
            CliError::CacheClear(msg) => write!(f, "Failed to clear cache: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to start async runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<GroupError> for CliError {
    fn from(e: GroupError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<EntityError> for CliError {
    fn from(e: EntityError) -> Self {
        CliError::Entities(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        if e.is_cancelled() {
            CliError::Cancelled
        } else {
            CliError::Pipeline(e)
        }
    }
}
