//! # Canonical Entities
//!
//! The normalized block model flowing through the pipeline: blocks enter
//! through the loader, sit in the queue, and leave toward the executor in
//! batches. `LightBlock` is the header-only projection kept by the
//! network aggregate for reorg detection.
//!
//! ## Clusters
//!
//! - **Blocks**: `Block`, `Transaction`, `AccessListItem`, `Withdrawal`
//! - **Execution results**: `Receipt`, `Log`
//! - **Chain view**: `LightBlock`

use serde::{Deserialize, Serialize};

/// A 32-byte hash.
pub type Hash = primitive_types::H256;

/// A 20-byte account address.
pub type Address = primitive_types::H160;

/// A 256-bit unsigned integer (gas, fees, values).
pub type U256 = primitive_types::U256;

// =============================================================================
// CLUSTER A: BLOCKS
// =============================================================================

/// A normalized block.
///
/// Produced exactly once by the normalizer from raw provider data, then
/// owned by the queue until the iterator hands it to the executor.
///
/// Invariant: `size == size_without_receipts + Σ receipt size` whenever
/// receipts are attached; `number` is authoritative for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Hash of this block.
    pub hash: Hash,
    /// Hash of the parent block.
    pub parent_hash: Hash,
    /// Block height.
    pub number: u64,
    /// Unix timestamp of the block.
    pub timestamp: u64,
    /// Gas limit of the block.
    pub gas_limit: U256,
    /// Total gas used by all transactions.
    pub gas_used: U256,
    /// Full encoded size in bytes, receipts included when attached.
    pub size: u64,
    /// Encoded size in bytes without receipts.
    pub size_without_receipts: u64,
    /// Transactions contained in the block.
    pub transactions: Vec<Transaction>,
    /// Receipts, present only after receipt hydration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipts: Option<Vec<Receipt>>,
    /// Base fee per gas (networks with dynamic fees only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// Validator withdrawals (networks with withdrawals only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Root of the withdrawals trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawals_root: Option<Hash>,
    /// Blob gas used (networks with blob transactions only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    /// Excess blob gas carried over from the parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_blob_gas: Option<U256>,
    /// Parent beacon block root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<Hash>,
    /// Root of the transactions trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions_root: Option<Hash>,
    /// Root of the receipts trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipts_root: Option<Hash>,
    /// Root of the state trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_root: Option<Hash>,
    /// Cached raw block encoding, stripped on enqueue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

impl Block {
    /// Drop cached raw encodings from the block and its transactions.
    ///
    /// The queue calls this on enqueue so the byte budget counts payload,
    /// not transport leftovers.
    pub fn strip_hex(&mut self) {
        self.hex = None;
        for tx in &mut self.transactions {
            tx.hex = None;
        }
    }
}

/// A normalized transaction.
///
/// Gas-pricing fields are carried whenever the raw input had them,
/// independent of network capability flags: a forked chain may hold
/// heterogeneous transaction types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash.
    pub hash: Hash,
    /// Sender nonce.
    pub nonce: u64,
    /// Sender address.
    pub from: Address,
    /// Recipient address (`None` for contract creation).
    pub to: Option<Address>,
    /// Transferred value in wei.
    pub value: U256,
    /// Gas limit for this transaction.
    pub gas: U256,
    /// Call data, 0x-prefixed hex.
    pub input: String,
    /// Index of this transaction within its block.
    pub transaction_index: Option<u64>,
    /// Containing block hash.
    pub block_hash: Option<Hash>,
    /// Containing block height.
    pub block_number: Option<u64>,
    /// Transaction type tag (0 legacy, 1 access-list, 2 dynamic-fee, 3 blob).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<u64>,
    /// Legacy gas price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// EIP-1559 max fee per gas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-1559 max priority fee per gas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Blob fee cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_blob_gas: Option<U256>,
    /// Versioned hashes of attached blobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<Hash>>,
    /// EIP-2930 access list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    /// Signature recovery id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<U256>,
    /// Signature r.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<U256>,
    /// Signature s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<U256>,
    /// Cached raw transaction encoding, stripped on enqueue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

/// One entry of an EIP-2930 access list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessListItem {
    /// Accessed account.
    pub address: Address,
    /// Accessed storage slots.
    pub storage_keys: Vec<Hash>,
}

/// A validator withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Monotonic withdrawal index.
    pub index: u64,
    /// Index of the withdrawing validator.
    pub validator_index: u64,
    /// Recipient address.
    pub address: Address,
    /// Amount in gwei.
    pub amount: U256,
}

// =============================================================================
// CLUSTER B: EXECUTION RESULTS
// =============================================================================

/// A normalized transaction receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: Hash,
    /// Index of the transaction within its block.
    pub transaction_index: u64,
    /// Containing block hash.
    pub block_hash: Hash,
    /// Containing block height.
    pub block_number: u64,
    /// Sender address.
    pub from: Address,
    /// Recipient address.
    pub to: Option<Address>,
    /// Cumulative gas used in the block up to and including this tx.
    pub cumulative_gas_used: U256,
    /// Gas used by this transaction alone.
    pub gas_used: Option<U256>,
    /// Effective gas price actually paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    /// Created contract address, if any.
    pub contract_address: Option<Address>,
    /// Logs emitted by this transaction.
    pub logs: Vec<Log>,
    /// Execution status (1 success, 0 revert).
    pub status: Option<u64>,
    /// Bloom filter of the logs, 0x-prefixed hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_bloom: Option<String>,
    /// Blob gas used (blob transactions only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_gas_used: Option<U256>,
    /// Blob gas price (blob transactions only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_gas_price: Option<U256>,
}

/// A normalized event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting contract address.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Unindexed data, 0x-prefixed hex.
    pub data: String,
    /// Containing block height.
    pub block_number: Option<u64>,
    /// Containing block hash.
    pub block_hash: Option<Hash>,
    /// Containing transaction hash.
    pub transaction_hash: Option<Hash>,
    /// Index of the transaction within its block.
    pub transaction_index: Option<u64>,
    /// Index of the log within its block.
    pub log_index: Option<u64>,
    /// True when the log was removed by a reorganization.
    pub removed: bool,
}

// =============================================================================
// CLUSTER C: CHAIN VIEW
// =============================================================================

/// Header-only projection of a block, kept by the light chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightBlock {
    /// Block height.
    pub number: u64,
    /// Block hash.
    pub hash: Hash,
    /// Parent block hash.
    pub parent_hash: Hash,
    /// Root of the transactions trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions_root: Option<Hash>,
    /// Root of the receipts trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipts_root: Option<Hash>,
    /// Root of the state trie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_root: Option<Hash>,
}

impl From<&Block> for LightBlock {
    fn from(block: &Block) -> Self {
        Self {
            number: block.number,
            hash: block.hash,
            parent_hash: block.parent_hash,
            transactions_root: block.transactions_root,
            receipts_root: block.receipts_root,
            state_root: block.state_root,
        }
    }
}
