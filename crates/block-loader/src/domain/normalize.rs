//! # Normalization
//!
//! Translates raw provider payloads into the canonical block model,
//! exactly once per block. Two rules govern optional fields:
//!
//! - Fields tied to a network feature (dynamic fees, withdrawals, blob
//!   transactions) are included **only** when the capability flag says
//!   the network supports them; they are dropped even if the raw input
//!   carried them.
//! - Gas-pricing fields on transactions are copied whenever present,
//!   regardless of capability flags: a forked chain may carry
//!   heterogeneous transaction types.
//!
//! Size accounting: `size_without_receipts` is the provider-reported
//! size when positive, else the RLP-approximating estimate; `size` adds
//! the estimated receipt sizes when receipts are attached.

use crate::errors::NormalizeError;
use shared_types::entities::{
    AccessListItem, Block, Log, Receipt, Transaction, Withdrawal,
};
use shared_types::network::NetworkCapabilities;
use shared_types::raw::{RawBlock, RawBlockWithReceipts, RawLog, RawReceipt, RawTransaction};
use shared_types::size::{estimate_block_size, estimate_receipt_size};

/// Normalize a raw transaction.
pub fn normalize_transaction(raw: RawTransaction) -> Transaction {
    Transaction {
        hash: raw.hash.unwrap_or_default(),
        nonce: raw.nonce.unwrap_or_default(),
        from: raw.from.unwrap_or_default(),
        to: raw.to,
        value: raw.value.unwrap_or_default(),
        gas: raw.gas.unwrap_or_default(),
        input: raw.input.unwrap_or_else(|| "0x".to_string()),
        transaction_index: raw.transaction_index,
        block_hash: raw.block_hash,
        block_number: raw.block_number,
        transaction_type: raw.transaction_type,
        // Pricing fields: always preserved when present.
        gas_price: raw.gas_price,
        max_fee_per_gas: raw.max_fee_per_gas,
        max_priority_fee_per_gas: raw.max_priority_fee_per_gas,
        max_fee_per_blob_gas: raw.max_fee_per_blob_gas,
        blob_versioned_hashes: raw.blob_versioned_hashes,
        access_list: raw.access_list.map(|list| {
            list.into_iter()
                .map(|item| AccessListItem {
                    address: item.address.unwrap_or_default(),
                    storage_keys: item.storage_keys,
                })
                .collect()
        }),
        v: raw.v,
        r: raw.r,
        s: raw.s,
        hex: raw.hex,
    }
}

/// Normalize a raw log.
pub fn normalize_log(raw: RawLog) -> Log {
    Log {
        address: raw.address.unwrap_or_default(),
        topics: raw.topics,
        data: raw.data.unwrap_or_else(|| "0x".to_string()),
        block_number: raw.block_number,
        block_hash: raw.block_hash,
        transaction_hash: raw.transaction_hash,
        transaction_index: raw.transaction_index,
        log_index: raw.log_index,
        removed: raw.removed.unwrap_or(false),
    }
}

/// Normalize a raw receipt.
///
/// # Errors
/// - `MissingBlockNumber` when the receipt carries no block number
pub fn normalize_receipt(
    raw: RawReceipt,
    caps: &NetworkCapabilities,
) -> Result<Receipt, NormalizeError> {
    let block_number = raw
        .block_number
        .ok_or(NormalizeError::MissingBlockNumber { what: "receipt" })?;

    Ok(Receipt {
        transaction_hash: raw.transaction_hash.unwrap_or_default(),
        transaction_index: raw.transaction_index.unwrap_or_default(),
        block_hash: raw.block_hash.unwrap_or_default(),
        block_number,
        from: raw.from.unwrap_or_default(),
        to: raw.to,
        cumulative_gas_used: raw.cumulative_gas_used.unwrap_or_default(),
        gas_used: raw.gas_used,
        effective_gas_price: raw.effective_gas_price,
        contract_address: raw.contract_address,
        logs: raw.logs.into_iter().map(normalize_log).collect(),
        status: raw.status,
        logs_bloom: raw.logs_bloom,
        blob_gas_used: raw.blob_gas_used.filter(|_| caps.has_blob_transactions),
        blob_gas_price: raw.blob_gas_price.filter(|_| caps.has_blob_transactions),
    })
}

fn normalize_withdrawal(raw: shared_types::raw::RawWithdrawal) -> Withdrawal {
    Withdrawal {
        index: raw.index.unwrap_or_default(),
        validator_index: raw.validator_index.unwrap_or_default(),
        address: raw.address.unwrap_or_default(),
        amount: raw.amount.unwrap_or_default(),
    }
}

/// Normalize a raw block without receipts.
///
/// # Errors
/// - `MissingBlockNumber` when the block carries no number
pub fn normalize_block(
    raw: RawBlock,
    caps: &NetworkCapabilities,
) -> Result<Block, NormalizeError> {
    let number = raw
        .number
        .ok_or(NormalizeError::MissingBlockNumber { what: "block" })?;

    let reported_size = raw.size.filter(|s| *s > 0);
    let mut block = Block {
        hash: raw.hash.unwrap_or_default(),
        parent_hash: raw.parent_hash.unwrap_or_default(),
        number,
        timestamp: raw.timestamp.unwrap_or_default(),
        gas_limit: raw.gas_limit.unwrap_or_default(),
        gas_used: raw.gas_used.unwrap_or_default(),
        size: 0,
        size_without_receipts: 0,
        transactions: raw
            .transactions
            .into_iter()
            .map(normalize_transaction)
            .collect(),
        receipts: None,
        base_fee_per_gas: raw.base_fee_per_gas.filter(|_| caps.has_eip1559),
        withdrawals: raw
            .withdrawals
            .filter(|_| caps.has_withdrawals)
            .map(|ws| ws.into_iter().map(normalize_withdrawal).collect()),
        withdrawals_root: raw.withdrawals_root.filter(|_| caps.has_withdrawals),
        blob_gas_used: raw.blob_gas_used.filter(|_| caps.has_blob_transactions),
        excess_blob_gas: raw.excess_blob_gas.filter(|_| caps.has_blob_transactions),
        parent_beacon_block_root: raw
            .parent_beacon_block_root
            .filter(|_| caps.has_blob_transactions),
        transactions_root: raw.transactions_root,
        receipts_root: raw.receipts_root,
        state_root: raw.state_root,
        hex: raw.hex,
    };

    block.size_without_receipts = reported_size.unwrap_or_else(|| estimate_block_size(&block));
    block.size = block.size_without_receipts;
    Ok(block)
}

/// Normalize a raw block and attach its receipts.
///
/// # Errors
/// - `MissingBlockNumber` from the block or any receipt
pub fn normalize_block_with_receipts(
    raw: RawBlockWithReceipts,
    caps: &NetworkCapabilities,
) -> Result<Block, NormalizeError> {
    let mut block = normalize_block(raw.block, caps)?;
    let receipts = raw
        .receipts
        .into_iter()
        .map(|r| normalize_receipt(r, caps))
        .collect::<Result<Vec<_>, _>>()?;

    let receipts_size: u64 = receipts.iter().map(estimate_receipt_size).sum();
    block.size = block.size_without_receipts + receipts_size;
    block.receipts = Some(receipts);
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::fixtures;

    #[test]
    fn test_block_number_is_required() {
        let caps = NetworkCapabilities::default();
        let mut raw = fixtures::raw_block(100, 0);
        raw.number = None;
        assert_eq!(
            normalize_block(raw, &caps).unwrap_err(),
            NormalizeError::MissingBlockNumber { what: "block" }
        );
    }

    #[test]
    fn test_receipt_number_is_required() {
        let caps = NetworkCapabilities::default();
        let mut raw = fixtures::raw_receipt(100, 0);
        raw.block_number = None;
        assert_eq!(
            normalize_receipt(raw, &caps).unwrap_err(),
            NormalizeError::MissingBlockNumber { what: "receipt" }
        );
    }

    #[test]
    fn test_reported_size_round_trip() {
        // A raw block with a positive reported size and no receipts
        // keeps that size on both counters.
        let caps = NetworkCapabilities::default();
        let mut raw = fixtures::raw_block(100, 2);
        raw.size = Some(7777);
        let block = normalize_block(raw, &caps).unwrap();
        assert_eq!(block.size, 7777);
        assert_eq!(block.size_without_receipts, 7777);
    }

    #[test]
    fn test_missing_size_is_estimated() {
        let caps = NetworkCapabilities::default();
        let mut raw = fixtures::raw_block(100, 2);
        raw.size = None;
        let block = normalize_block(raw, &caps).unwrap();
        assert!(block.size > 0);
        assert_eq!(block.size, block.size_without_receipts);
    }

    #[test]
    fn test_receipts_grow_size() {
        let caps = NetworkCapabilities::default();
        let raw = fixtures::raw_block_with_receipts(100, 3);
        let reported = raw.block.size.unwrap();
        let block = normalize_block_with_receipts(raw, &caps).unwrap();
        assert_eq!(block.size_without_receipts, reported);
        assert!(block.size > reported);
        assert_eq!(block.receipts.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_capability_gating_drops_unsupported_fields() {
        let caps = NetworkCapabilities::legacy(61, "ETC");
        let mut raw = fixtures::raw_block(100, 1);
        raw.base_fee_per_gas = Some(7u64.into());
        raw.withdrawals_root = Some(shared_types::entities::Hash::repeat_byte(1));
        raw.blob_gas_used = Some(1u64.into());
        raw.excess_blob_gas = Some(2u64.into());
        raw.parent_beacon_block_root = Some(shared_types::entities::Hash::repeat_byte(2));

        let block = normalize_block(raw, &caps).unwrap();
        assert!(block.base_fee_per_gas.is_none());
        assert!(block.withdrawals_root.is_none());
        assert!(block.blob_gas_used.is_none());
        assert!(block.excess_blob_gas.is_none());
        assert!(block.parent_beacon_block_root.is_none());
    }

    #[test]
    fn test_pricing_fields_survive_legacy_network() {
        // Even on a network without dynamic fees, a transaction carrying
        // EIP-1559 fields keeps them.
        let caps = NetworkCapabilities::legacy(61, "ETC");
        let raw = fixtures::raw_block(100, 1);
        let block = normalize_block(raw, &caps).unwrap();
        let tx = &block.transactions[0];
        assert!(tx.max_fee_per_gas.is_some());
        assert!(tx.max_priority_fee_per_gas.is_some());
    }

    #[test]
    fn test_log_normalization_defaults() {
        let log = normalize_log(shared_types::raw::RawLog::default());
        assert_eq!(log.data, "0x");
        assert!(!log.removed);
    }
}
