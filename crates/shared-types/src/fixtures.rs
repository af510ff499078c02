//! # Test Fixtures
//!
//! Builders for deterministic blocks and chains, shared by unit and
//! integration tests across the workspace. Hashes are synthesized from
//! the height and a fork tag so parent links line up without real
//! hashing.

use crate::entities::{Address, Block, Hash, LightBlock, Receipt, Transaction, U256};
use crate::raw::{RawBlock, RawBlockWithReceipts, RawLog, RawReceipt, RawTransaction};

/// Deterministic hash for a block at `number` on fork `fork`.
pub fn block_hash(number: u64, fork: u8) -> Hash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&number.to_be_bytes());
    bytes[8] = fork;
    bytes[31] = 0xB1;
    Hash::from(bytes)
}

/// A minimal transaction attributed to `block_number`.
pub fn transaction(block_number: u64, index: u64) -> Transaction {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&block_number.to_be_bytes());
    bytes[8..16].copy_from_slice(&index.to_be_bytes());
    bytes[31] = 0x7A;
    Transaction {
        hash: Hash::from(bytes),
        nonce: index,
        from: Address::repeat_byte(0xAA),
        to: Some(Address::repeat_byte(0xBB)),
        value: U256::from(1_000_000u64),
        gas: U256::from(21_000u64),
        input: "0x".to_string(),
        transaction_index: Some(index),
        block_hash: Some(block_hash(block_number, 0)),
        block_number: Some(block_number),
        transaction_type: Some(2),
        gas_price: None,
        max_fee_per_gas: Some(U256::from(2_000_000_000u64)),
        max_priority_fee_per_gas: Some(U256::from(1_000_000_000u64)),
        max_fee_per_blob_gas: None,
        blob_versioned_hashes: None,
        access_list: None,
        v: None,
        r: None,
        s: None,
        hex: None,
    }
}

/// A receipt for `transaction(block_number, index)`.
pub fn receipt(block_number: u64, index: u64) -> Receipt {
    Receipt {
        transaction_hash: transaction(block_number, index).hash,
        transaction_index: index,
        block_hash: block_hash(block_number, 0),
        block_number,
        from: Address::repeat_byte(0xAA),
        to: Some(Address::repeat_byte(0xBB)),
        cumulative_gas_used: U256::from(21_000u64 * (index + 1)),
        gas_used: Some(U256::from(21_000u64)),
        effective_gas_price: Some(U256::from(1_500_000_000u64)),
        contract_address: None,
        logs: vec![],
        status: Some(1),
        logs_bloom: None,
        blob_gas_used: None,
        blob_gas_price: None,
    }
}

/// A block at `number` with a fixed reported `size`, linked to
/// `block(number - 1, ..)` on fork 0.
pub fn block(number: u64, size: u64) -> Block {
    block_on_fork(number, size, 0, 0)
}

/// A block on fork `fork`; blocks at or below `fork_height` share fork 0
/// hashes so forks diverge only above the fork point.
pub fn block_on_fork(number: u64, size: u64, fork: u8, fork_height: u64) -> Block {
    let tag = |n: u64| if n <= fork_height { 0 } else { fork };
    Block {
        hash: block_hash(number, tag(number)),
        parent_hash: block_hash(number.wrapping_sub(1), tag(number.wrapping_sub(1))),
        number,
        timestamp: 1_700_000_000 + number * 12,
        gas_limit: U256::from(30_000_000u64),
        gas_used: U256::from(15_000_000u64),
        size,
        size_without_receipts: size,
        transactions: vec![],
        receipts: None,
        base_fee_per_gas: Some(U256::from(1_000_000_000u64)),
        withdrawals: None,
        withdrawals_root: None,
        blob_gas_used: None,
        excess_blob_gas: None,
        parent_beacon_block_root: None,
        transactions_root: None,
        receipts_root: None,
        state_root: None,
        hex: None,
    }
}

/// Header projection of `block_on_fork(number, .., fork, fork_height)`.
pub fn light_block(number: u64, fork: u8, fork_height: u64) -> LightBlock {
    LightBlock::from(&block_on_fork(number, 0, fork, fork_height))
}

/// A run of linked blocks `[from ..= to]`, each with `size` bytes.
pub fn chain(from: u64, to: u64, size: u64) -> Vec<Block> {
    (from..=to).map(|n| block(n, size)).collect()
}

// =============================================================================
// Raw payload builders (provider-shaped)
// =============================================================================

/// A raw transaction as a provider would return it.
pub fn raw_transaction(block_number: u64, index: u64) -> RawTransaction {
    let canonical = transaction(block_number, index);
    RawTransaction {
        hash: Some(canonical.hash),
        nonce: Some(canonical.nonce),
        from: Some(canonical.from),
        to: canonical.to,
        value: Some(canonical.value),
        gas: Some(canonical.gas),
        input: Some(canonical.input),
        transaction_index: Some(index),
        block_hash: canonical.block_hash,
        block_number: Some(block_number),
        transaction_type: canonical.transaction_type,
        gas_price: canonical.gas_price,
        max_fee_per_gas: canonical.max_fee_per_gas,
        max_priority_fee_per_gas: canonical.max_priority_fee_per_gas,
        max_fee_per_blob_gas: None,
        blob_versioned_hashes: None,
        access_list: None,
        v: Some(U256::from(1u64)),
        r: Some(U256::from(2u64)),
        s: Some(U256::from(3u64)),
        hex: None,
    }
}

/// A raw receipt with one log, matching `raw_transaction`.
pub fn raw_receipt(block_number: u64, index: u64) -> RawReceipt {
    let canonical = receipt(block_number, index);
    RawReceipt {
        transaction_hash: Some(canonical.transaction_hash),
        transaction_index: Some(index),
        block_hash: Some(canonical.block_hash),
        block_number: Some(block_number),
        from: Some(canonical.from),
        to: canonical.to,
        cumulative_gas_used: Some(canonical.cumulative_gas_used),
        gas_used: canonical.gas_used,
        effective_gas_price: canonical.effective_gas_price,
        contract_address: None,
        logs: vec![RawLog {
            address: Some(Address::repeat_byte(0xCC)),
            topics: vec![Hash::repeat_byte(0x11)],
            data: Some("0x00".to_string()),
            block_number: Some(block_number),
            block_hash: Some(canonical.block_hash),
            transaction_hash: Some(canonical.transaction_hash),
            transaction_index: Some(index),
            log_index: Some(index),
            removed: Some(false),
        }],
        status: Some(1),
        logs_bloom: None,
        blob_gas_used: None,
        blob_gas_price: None,
    }
}

/// A raw block on fork `fork` carrying `tx_count` transactions.
pub fn raw_block_on_fork(number: u64, tx_count: u64, fork: u8, fork_height: u64) -> RawBlock {
    let canonical = block_on_fork(number, 0, fork, fork_height);
    RawBlock {
        hash: Some(canonical.hash),
        parent_hash: Some(canonical.parent_hash),
        number: Some(number),
        timestamp: Some(canonical.timestamp),
        gas_limit: Some(canonical.gas_limit),
        gas_used: Some(canonical.gas_used),
        size: Some(1000 + tx_count * 200),
        base_fee_per_gas: canonical.base_fee_per_gas,
        withdrawals: None,
        withdrawals_root: None,
        blob_gas_used: None,
        excess_blob_gas: None,
        parent_beacon_block_root: None,
        transactions_root: None,
        receipts_root: None,
        state_root: None,
        transactions: (0..tx_count).map(|i| raw_transaction(number, i)).collect(),
        hex: None,
    }
}

/// A raw block on the canonical fork.
pub fn raw_block(number: u64, tx_count: u64) -> RawBlock {
    raw_block_on_fork(number, tx_count, 0, 0)
}

/// A raw block paired with receipts for each of its transactions.
pub fn raw_block_with_receipts(number: u64, tx_count: u64) -> RawBlockWithReceipts {
    raw_block_with_receipts_on_fork(number, tx_count, 0, 0)
}

/// Fork-aware variant of [`raw_block_with_receipts`].
pub fn raw_block_with_receipts_on_fork(
    number: u64,
    tx_count: u64,
    fork: u8,
    fork_height: u64,
) -> RawBlockWithReceipts {
    RawBlockWithReceipts {
        block: raw_block_on_fork(number, tx_count, fork, fork_height),
        receipts: (0..tx_count).map(|i| raw_receipt(number, i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_linked() {
        let blocks = chain(10, 14, 1000);
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].parent_hash, pair[0].hash);
            assert_eq!(pair[1].number, pair[0].number + 1);
        }
    }

    #[test]
    fn test_forks_share_history_below_fork_point() {
        let canonical = block_on_fork(100, 0, 0, 0);
        let forked = block_on_fork(100, 0, 1, 100);
        // At the fork point the hashes agree...
        assert_eq!(canonical.hash, forked.hash);
        // ...and diverge above it.
        assert_ne!(
            block_on_fork(101, 0, 0, 100).hash,
            block_on_fork(101, 0, 1, 100).hash
        );
    }
}
