//! # Runtime Container

pub mod config;

pub use config::{IngestConfig, SnapshotConfig};
