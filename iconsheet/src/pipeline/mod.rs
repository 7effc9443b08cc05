//! End-to-end sprite generation.
//!
//! ```text
//! entities ─▶ fetch_and_cache (one at a time) ─▶ balance ─▶ compose ─▶ {sheet}.png
//!                                                                  └─▶ index.jsonl
//! ```
//!
//! [`SpritePipeline::fetch_all`] runs only the first stage,
//! [`SpritePipeline::pack`] everything after it from the cache, and
//! [`SpritePipeline::run`] both. The index is written after every sheet has
//! been persisted, so an aborted run never leaves an index pointing at
//! missing sheets.

mod config;
mod error;
mod runner;

pub use config::{PipelineConfig, DEFAULT_CACHE_DIR, DEFAULT_INDEX_FILE, DEFAULT_OUTPUT_DIR};
pub use error::PipelineError;
pub use runner::{PipelineReport, SpritePipeline};
