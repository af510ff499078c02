//! # Raw Provider Payloads
//!
//! Block data as node providers hand it over, before normalization.
//! Every field the wire may omit is an `Option`; the normalizer decides
//! what is required and what capability flags gate the rest.
//!
//! Field names follow the JSON-RPC wire shape (`camelCase`), so a
//! transport can deserialize `eth_getBlockByNumber` /
//! `eth_getTransactionReceipt` responses into these types directly.

use crate::entities::{Address, Hash, U256};
use serde::{Deserialize, Serialize};

/// A block as returned by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBlock {
    /// Block hash.
    pub hash: Option<Hash>,
    /// Parent block hash.
    pub parent_hash: Option<Hash>,
    /// Block height.
    pub number: Option<u64>,
    /// Unix timestamp.
    pub timestamp: Option<u64>,
    /// Gas limit.
    pub gas_limit: Option<U256>,
    /// Gas used.
    pub gas_used: Option<U256>,
    /// Encoded size in bytes as reported by the node.
    pub size: Option<u64>,
    /// Base fee per gas.
    pub base_fee_per_gas: Option<U256>,
    /// Validator withdrawals.
    pub withdrawals: Option<Vec<RawWithdrawal>>,
    /// Withdrawals trie root.
    pub withdrawals_root: Option<Hash>,
    /// Blob gas used.
    pub blob_gas_used: Option<U256>,
    /// Excess blob gas.
    pub excess_blob_gas: Option<U256>,
    /// Parent beacon block root.
    pub parent_beacon_block_root: Option<Hash>,
    /// Transactions trie root.
    pub transactions_root: Option<Hash>,
    /// Receipts trie root.
    pub receipts_root: Option<Hash>,
    /// State trie root.
    pub state_root: Option<Hash>,
    /// Transactions (full objects when requested with `full_txs`).
    pub transactions: Vec<RawTransaction>,
    /// Cached raw block encoding.
    pub hex: Option<String>,
}

/// A transaction as returned by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    /// Transaction hash.
    pub hash: Option<Hash>,
    /// Sender nonce.
    pub nonce: Option<u64>,
    /// Sender address.
    pub from: Option<Address>,
    /// Recipient address.
    pub to: Option<Address>,
    /// Transferred value.
    pub value: Option<U256>,
    /// Gas limit.
    pub gas: Option<U256>,
    /// Call data, 0x-prefixed hex.
    pub input: Option<String>,
    /// Index within the block.
    pub transaction_index: Option<u64>,
    /// Containing block hash.
    pub block_hash: Option<Hash>,
    /// Containing block height.
    pub block_number: Option<u64>,
    /// Transaction type tag.
    #[serde(rename = "type")]
    pub transaction_type: Option<u64>,
    /// Legacy gas price.
    pub gas_price: Option<U256>,
    /// EIP-1559 max fee per gas.
    pub max_fee_per_gas: Option<U256>,
    /// EIP-1559 max priority fee per gas.
    pub max_priority_fee_per_gas: Option<U256>,
    /// Blob fee cap.
    pub max_fee_per_blob_gas: Option<U256>,
    /// Versioned hashes of attached blobs.
    pub blob_versioned_hashes: Option<Vec<Hash>>,
    /// EIP-2930 access list.
    pub access_list: Option<Vec<RawAccessListItem>>,
    /// Signature recovery id.
    pub v: Option<U256>,
    /// Signature r.
    pub r: Option<U256>,
    /// Signature s.
    pub s: Option<U256>,
    /// Cached raw transaction encoding.
    pub hex: Option<String>,
}

/// One entry of a raw access list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAccessListItem {
    /// Accessed account.
    pub address: Option<Address>,
    /// Accessed storage slots.
    pub storage_keys: Vec<Hash>,
}

/// A receipt as returned by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawReceipt {
    /// Transaction hash.
    pub transaction_hash: Option<Hash>,
    /// Index within the block.
    pub transaction_index: Option<u64>,
    /// Containing block hash.
    pub block_hash: Option<Hash>,
    /// Containing block height.
    pub block_number: Option<u64>,
    /// Sender address.
    pub from: Option<Address>,
    /// Recipient address.
    pub to: Option<Address>,
    /// Cumulative gas used.
    pub cumulative_gas_used: Option<U256>,
    /// Gas used by this transaction.
    pub gas_used: Option<U256>,
    /// Effective gas price.
    pub effective_gas_price: Option<U256>,
    /// Created contract address.
    pub contract_address: Option<Address>,
    /// Emitted logs.
    pub logs: Vec<RawLog>,
    /// Execution status.
    pub status: Option<u64>,
    /// Bloom filter of the logs.
    pub logs_bloom: Option<String>,
    /// Blob gas used.
    pub blob_gas_used: Option<U256>,
    /// Blob gas price.
    pub blob_gas_price: Option<U256>,
}

/// An event log as returned by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLog {
    /// Emitting contract address.
    pub address: Option<Address>,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Unindexed data, 0x-prefixed hex.
    pub data: Option<String>,
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
    /// True when removed by a reorganization.
    pub removed: Option<bool>,
}

/// A validator withdrawal as returned by a provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawWithdrawal {
    /// Monotonic withdrawal index.
    pub index: Option<u64>,
    /// Index of the withdrawing validator.
    pub validator_index: Option<u64>,
    /// Recipient address.
    pub address: Option<Address>,
    /// Amount in gwei.
    pub amount: Option<U256>,
}

/// A block paired with the receipts of its transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBlockWithReceipts {
    /// The block, transactions included.
    pub block: RawBlock,
    /// Receipts for the block's transactions, in transaction order.
    pub receipts: Vec<RawReceipt>,
}
