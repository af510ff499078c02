//! # Ingestion Pipeline Test Suite
//!
//! Unified test crate for cross-crate scenarios.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate flows
//!     ├── queue_flow.rs    # Ordered ingest, oversize progress, confirmation
//!     ├── reorg_flow.rs    # Fork location and rewind of chain + queue
//!     ├── loader_flow.rs   # Strategy selection, catch-up, streaming
//!     ├── failover_flow.rs # Provider failover and reconnection
//!     └── pipeline.rs      # Full pipeline over a simulated node
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ingest-tests
//!
//! # By flow
//! cargo test -p ingest-tests integration::queue_flow
//! ```

#![allow(dead_code)]

pub mod integration;
