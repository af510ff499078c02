//! # Receipt Sub-Batch Partitioning
//!
//! Before receipts exist their size is unknown, so the pull strategy
//! budgets requests with the tiered per-transaction estimate and splits
//! the preload buffer into contiguous height runs whose estimated
//! receipt load stays inside the request budget.

use shared_types::entities::Block;
use shared_types::size::receipt_budget_estimate;

/// Split `blocks` (ascending by height) into contiguous sub-batches
/// whose estimated receipt sizes sum to at most `max_bytes`.
///
/// Every sub-batch holds at least one block: a single block whose
/// estimate alone exceeds the budget still gets its own request.
pub fn partition_by_receipt_budget(blocks: &[Block], max_bytes: u64) -> Vec<Vec<u64>> {
    let mut batches: Vec<Vec<u64>> = Vec::new();
    let mut current: Vec<u64> = Vec::new();
    let mut current_bytes = 0u64;

    for block in blocks {
        let estimate =
            receipt_budget_estimate(block.transactions.len(), block.size_without_receipts);
        if !current.is_empty() && current_bytes + estimate > max_bytes {
            batches.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current.push(block.number);
        current_bytes += estimate;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::fixtures;

    fn block_with_txs(number: u64, tx_count: u64, size: u64) -> Block {
        let mut block = fixtures::block(number, size);
        block.transactions = (0..tx_count)
            .map(|i| fixtures::transaction(number, i))
            .collect();
        block
    }

    #[test]
    fn test_empty_input() {
        assert!(partition_by_receipt_budget(&[], 1000).is_empty());
    }

    #[test]
    fn test_small_blocks_share_a_batch() {
        // 4 txs x 512 B = 2 KiB per block; budget fits two blocks.
        let blocks: Vec<Block> = (101..=104).map(|n| block_with_txs(n, 4, 1000)).collect();
        let batches = partition_by_receipt_budget(&blocks, 4096);
        assert_eq!(batches, vec![vec![101, 102], vec![103, 104]]);
    }

    #[test]
    fn test_heavy_block_gets_own_batch() {
        // The middle block estimates at 100 x 512 B, far over budget,
        // but still lands in a batch of its own.
        let blocks = vec![
            block_with_txs(101, 2, 1000),
            block_with_txs(102, 100, 1000),
            block_with_txs(103, 2, 1000),
        ];
        let batches = partition_by_receipt_budget(&blocks, 4096);
        assert_eq!(batches, vec![vec![101], vec![102], vec![103]]);
    }

    #[test]
    fn test_large_blocks_use_heavier_estimate() {
        // Same tx count, but the bigger block crosses the 500 KiB tier
        // and doubles its per-tx estimate.
        let small = block_with_txs(101, 4, 100_000);
        let large = block_with_txs(102, 4, 600_000);
        let batches = partition_by_receipt_budget(&[small, large], 4096);
        // 4x512 + 4x1024 = 6144 > 4096, so they split.
        assert_eq!(batches.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_every_block_lands_exactly_once(
            tx_counts in proptest::collection::vec(0u64..30, 1..30),
            budget in 512u64..100_000,
        ) {
            let blocks: Vec<Block> = tx_counts
                .iter()
                .enumerate()
                .map(|(i, txs)| block_with_txs(100 + i as u64, *txs, 1000))
                .collect();
            let batches = partition_by_receipt_budget(&blocks, budget);
            let flattened: Vec<u64> = batches.iter().flatten().copied().collect();
            let expected: Vec<u64> = blocks.iter().map(|b| b.number).collect();
            prop_assert_eq!(flattened, expected);
            for batch in &batches {
                prop_assert!(!batch.is_empty());
            }
        }
    }
}
