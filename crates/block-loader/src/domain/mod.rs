//! # Loader Domain
//!
//! Pure functions: raw-to-canonical normalization and receipt-budget
//! partitioning. No I/O here; the strategies drive these against the
//! provider.

pub mod normalize;
pub mod partition;

pub use normalize::{
    normalize_block, normalize_block_with_receipts, normalize_log, normalize_receipt,
    normalize_transaction,
};
pub use partition::partition_by_receipt_budget;
