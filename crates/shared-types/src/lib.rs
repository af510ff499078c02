//! # Shared Types Crate
//!
//! All cross-crate types for the ingestion pipeline live here: the
//! canonical block model produced by normalization, the raw payload
//! shapes returned by node providers, the immutable network capability
//! configuration, and two small utilities (size estimation and the
//! exponential backoff timer) that several subsystems share.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary
//!   is defined here.
//! - **Raw vs. canonical**: provider payloads (`raw`) are permissive,
//!   every field the wire may omit is an `Option`; canonical entities
//!   (`entities`) are what the queue, chain, and executor operate on.

pub mod backoff;
pub mod entities;
pub mod fixtures;
pub mod network;
pub mod raw;
pub mod size;

pub use backoff::Backoff;
pub use entities::*;
pub use network::NetworkCapabilities;
pub use raw::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
