//! iconsheet - Icon fetching and sprite sheet packing
//!
//! This library downloads entity icons into a content-addressed cache,
//! groups entities by affiliation into bounded-size groups, composes one
//! sprite sheet per group, and writes a JSON-lines index mapping every
//! entity to its `sheet:slot` coordinate.
//!
//! # Modules
//!
//! - [`cache`]: cache keys and the on-disk image cache
//! - [`fetch`]: HTTP download with not-found retry and content validation
//! - [`group`]: affiliation grouping and size balancing
//! - [`sprite`]: grid compositing and sheet output
//! - [`entity`]: entity list input and index output
//! - [`pipeline`]: the end-to-end run
//! - [`config`]: INI configuration file
//! - [`logging`]: tracing subscriber setup

pub mod cache;
pub mod config;
pub mod entity;
pub mod fetch;
pub mod group;
pub mod logging;
pub mod pipeline;
pub mod sprite;
pub mod storage;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
