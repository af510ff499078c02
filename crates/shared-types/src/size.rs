//! # Size Estimation
//!
//! RLP-approximating size estimators used when a provider does not report
//! a block's encoded size, and for budgeting receipt requests before the
//! receipts exist. Estimates sum per-field costs and apply a flat
//! encoding-overhead factor; they are deliberately a little generous so
//! byte budgets err toward smaller batches.

use crate::entities::{Block, Log, Receipt, Transaction};

/// Approximate encoded size of a block header.
const HEADER_BASE: u64 = 540;

/// Approximate encoded size of a transaction without call data.
const TX_BASE: u64 = 110;

/// Approximate encoded size of a receipt without logs (bloom included).
const RECEIPT_BASE: u64 = 300;

/// Approximate encoded size of a log without topics or data.
const LOG_BASE: u64 = 64;

/// Flat factor covering RLP length prefixes and list headers.
const ENCODING_OVERHEAD: f64 = 1.08;

/// Byte length of a 0x-prefixed hex payload.
fn hex_payload_len(hex: &str) -> u64 {
    (hex.len().saturating_sub(2) / 2) as u64
}

/// Estimated encoded size of a single transaction.
pub fn estimate_transaction_size(tx: &Transaction) -> u64 {
    let mut size = TX_BASE + hex_payload_len(&tx.input);
    if let Some(list) = &tx.access_list {
        for item in list {
            size += 20 + item.storage_keys.len() as u64 * 32;
        }
    }
    if let Some(hashes) = &tx.blob_versioned_hashes {
        size += hashes.len() as u64 * 32;
    }
    (size as f64 * ENCODING_OVERHEAD) as u64
}

/// Estimated encoded size of a block, receipts excluded.
pub fn estimate_block_size(block: &Block) -> u64 {
    let txs: u64 = block
        .transactions
        .iter()
        .map(estimate_transaction_size)
        .sum();
    let withdrawals = block
        .withdrawals
        .as_ref()
        .map_or(0, |w| w.len() as u64 * 44);
    ((HEADER_BASE + withdrawals) as f64 * ENCODING_OVERHEAD) as u64 + txs
}

fn estimate_log_size(log: &Log) -> u64 {
    LOG_BASE + log.topics.len() as u64 * 32 + hex_payload_len(&log.data)
}

/// Estimated encoded size of a receipt.
pub fn estimate_receipt_size(receipt: &Receipt) -> u64 {
    let logs: u64 = receipt.logs.iter().map(estimate_log_size).sum();
    ((RECEIPT_BASE + logs) as f64 * ENCODING_OVERHEAD) as u64
}

/// Per-block receipt budget used to partition receipt requests before the
/// receipts are fetched. Blocks with more payload tend to carry heavier
/// receipts, so the per-transaction figure scales with block size.
pub fn receipt_budget_estimate(tx_count: usize, size_without_receipts: u64) -> u64 {
    let per_tx = if size_without_receipts > 2_000_000 {
        2048
    } else if size_without_receipts > 500_000 {
        1024
    } else {
        512
    };
    tx_count as u64 * per_tx
}
