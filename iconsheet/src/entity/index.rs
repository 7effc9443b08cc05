//! JSON-lines sprite index.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::{Entity, EntityError};
use crate::storage::write_atomic;

/// An entity placed on a sheet.
///
/// Serializes as the original entity with `image` set to `"{sheet}:{slot}"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRecord {
    #[serde(flatten)]
    entity: Entity,
    #[serde(skip)]
    sheet: usize,
    #[serde(skip)]
    slot: usize,
}

impl IndexRecord {
    pub fn new(entity: &Entity, sheet: usize, slot: usize) -> Self {
        let mut entity = entity.clone();
        entity.image = format!("{}:{}", sheet, slot);
        Self {
            entity,
            sheet,
            slot,
        }
    }

    pub fn sheet(&self) -> usize {
        self.sheet
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }
}

/// Write `records` to `path`, one JSON object per line.
///
/// The file is replaced atomically; readers never see a partial index.
pub fn write_index(path: &Path, records: &[IndexRecord]) -> Result<(), EntityError> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record).map_err(|e| EntityError::Serialize {
            name: record.entity.name.clone(),
            source: e,
        })?;
        buf.push(b'\n');
    }

    write_atomic(path, &buf).map_err(|e| EntityError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!(path = %path.display(), records = records.len(), "Wrote sprite index");
    Ok(())
}
