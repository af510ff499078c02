//! # Chain Domain

pub mod chain;
pub mod errors;

pub use chain::LightChain;
pub use errors::ChainError;
