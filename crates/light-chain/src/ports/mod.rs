//! # Chain Ports

pub mod outbound;

pub use outbound::{ChainReader, MockChainReader};
