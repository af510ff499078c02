//! # Pool Ports

pub mod provider;

pub use provider::{MockProvider, NewHeadsFeed, NewHeadsSubscription, NodeProvider};
