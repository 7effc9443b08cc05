//! Pipeline errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::entity::EntityError;
use crate::fetch::FetchError;
use crate::sprite::SpriteError;

/// A fatal pipeline failure, carrying the entity or sheet it happened on.
///
/// There is no partial-success mode: the first error aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] FetchError),

    #[error("entity '{entity}': {source}")]
    Fetch {
        entity: String,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("sheet {sheet}: {source}")]
    Sprite {
        sheet: usize,
        #[source]
        source: SpriteError,
    },

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("run cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Returns true if the run stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        match self {
            PipelineError::Cancelled => true,
            PipelineError::Fetch { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
