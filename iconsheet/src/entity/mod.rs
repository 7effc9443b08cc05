//! Entity list input and sprite index output.
//!
//! Entities arrive as a JSON array:
//!
//! ```json
//! [
//!   {"name": "Ame", "affiliation": "EN", "image": "https://cdn.example/ame.jpg", "language": "en"}
//! ]
//! ```
//!
//! Fields other than `name`, `affiliation` and `image` are carried through
//! untouched into the index, where `image` is rewritten to `"{sheet}:{slot}"`.

mod index;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::group::Affiliated;

pub use index::{write_index, IndexRecord};

/// Errors reading entities or writing the index.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize index record for '{name}': {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub affiliation: String,
    /// Remote image URL.
    pub image: String,
    /// Every other field, preserved verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Entity {
    /// Create an entity without extra metadata.
    pub fn new(
        name: impl Into<String>,
        affiliation: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            affiliation: affiliation.into(),
            image: image.into(),
            metadata: Map::new(),
        }
    }

    /// Attach a passthrough metadata field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Affiliated for Entity {
    fn affiliation(&self) -> &str {
        &self.affiliation
    }
}

/// Parse a JSON array of entities.
pub fn parse_entities<R: Read>(reader: R) -> Result<Vec<Entity>, serde_json::Error> {
    serde_json::from_reader(reader)
}

/// Load the entity list at `path`.
pub fn load_entities(path: &Path) -> Result<Vec<Entity>, EntityError> {
    let file = File::open(path).map_err(|e| EntityError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let entities = parse_entities(BufReader::new(file)).map_err(|e| EntityError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(path = %path.display(), count = entities.len(), "Loaded entities");
    Ok(entities)
}
