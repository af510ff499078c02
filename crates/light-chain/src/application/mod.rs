//! # Chain Application Layer

pub mod aggregate;

pub use aggregate::{NetworkAggregate, ReorgOutcome};
