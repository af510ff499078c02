//! # Network Capabilities
//!
//! Immutable description of the chain being ingested. The capability
//! flags gate which optional block and receipt fields survive
//! normalization.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable network configuration.
///
/// Constructed once at startup; the normalizer and the loader read it,
/// nothing mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkCapabilities {
    /// Chain identifier.
    pub chain_id: u64,
    /// Ticker symbol of the native currency.
    pub native_currency_symbol: String,
    /// Decimals of the native currency.
    pub native_currency_decimals: u8,
    /// Expected block interval.
    pub block_time: Duration,
    /// Network supports EIP-1559 dynamic fees.
    pub has_eip1559: bool,
    /// Network supports validator withdrawals.
    pub has_withdrawals: bool,
    /// Network supports blob transactions.
    pub has_blob_transactions: bool,
}

impl Default for NetworkCapabilities {
    fn default() -> Self {
        Self {
            chain_id: 1,
            native_currency_symbol: "ETH".to_string(),
            native_currency_decimals: 18,
            block_time: Duration::from_secs(12),
            has_eip1559: true,
            has_withdrawals: true,
            has_blob_transactions: true,
        }
    }
}

impl NetworkCapabilities {
    /// A pre-1559 network with none of the optional features.
    pub fn legacy(chain_id: u64, symbol: &str) -> Self {
        Self {
            chain_id,
            native_currency_symbol: symbol.to_string(),
            native_currency_decimals: 18,
            block_time: Duration::from_secs(12),
            has_eip1559: false,
            has_withdrawals: false,
            has_blob_transactions: false,
        }
    }

    /// Config for tests: short block time, all features on.
    pub fn for_testing() -> Self {
        Self {
            chain_id: 1337,
            block_time: Duration::from_millis(100),
            ..Self::default()
        }
    }
}
