//! CLI command implementations.

pub mod build;
pub mod cache;
pub mod common;
pub mod fetch;
pub mod pack;
