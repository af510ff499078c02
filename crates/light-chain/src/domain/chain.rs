//! # Light Chain - Ordered Header List
//!
//! An ordered map of header-only blocks keyed by height. The ordering
//! invariant holds everywhere: each block's height is its predecessor's
//! plus one, and each block's parent hash is its predecessor's hash.
//! When the chain outgrows `max_size`, the oldest header is evicted.
//!
//! The chain converts to and from a plain ordered list for snapshots.

use super::errors::ChainError;
use shared_types::entities::LightBlock;
use std::collections::BTreeMap;

/// Bounded, validated chain of block headers.
#[derive(Debug, Clone)]
pub struct LightChain {
    /// Headers keyed by height; keys are contiguous.
    by_height: BTreeMap<u64, LightBlock>,
    /// Maximum headers kept before head eviction.
    max_size: usize,
}

impl LightChain {
    /// Create an empty chain holding at most `max_size` headers.
    pub fn new(max_size: usize) -> Self {
        Self {
            by_height: BTreeMap::new(),
            max_size,
        }
    }

    /// Number of headers held.
    pub fn len(&self) -> usize {
        self.by_height.len()
    }

    /// True when no headers are held.
    pub fn is_empty(&self) -> bool {
        self.by_height.is_empty()
    }

    /// The oldest header.
    pub fn head(&self) -> Option<&LightBlock> {
        self.by_height.first_key_value().map(|(_, b)| b)
    }

    /// The newest header.
    pub fn tail(&self) -> Option<&LightBlock> {
        self.by_height.last_key_value().map(|(_, b)| b)
    }

    /// Append a single header.
    ///
    /// An empty chain accepts any header as its new head. Otherwise the
    /// header must extend the tail by one height and link to its hash;
    /// either check failing rejects the header and leaves the chain
    /// unchanged. Overflow evicts the oldest header.
    pub fn add_block(&mut self, block: LightBlock) -> Result<(), ChainError> {
        if let Some(tail) = self.tail() {
            if block.number != tail.number + 1 {
                return Err(ChainError::NonContiguous {
                    expected: tail.number + 1,
                    got: block.number,
                });
            }
            if block.parent_hash != tail.hash {
                return Err(ChainError::ParentHashMismatch {
                    height: block.number,
                    expected: tail.hash,
                    got: block.parent_hash,
                });
            }
        }

        self.by_height.insert(block.number, block);
        if self.by_height.len() > self.max_size {
            self.by_height.pop_first();
        }
        Ok(())
    }

    /// Validate `blocks` as a contiguous extension of the current tail
    /// without mutating anything.
    pub fn validate_next_blocks(&self, blocks: &[LightBlock]) -> Result<(), ChainError> {
        let mut prev: Option<&LightBlock> = self.tail();
        for block in blocks {
            if let Some(prev) = prev {
                if block.number != prev.number + 1 {
                    return Err(ChainError::NonContiguous {
                        expected: prev.number + 1,
                        got: block.number,
                    });
                }
                if block.parent_hash != prev.hash {
                    return Err(ChainError::ParentHashMismatch {
                        height: block.number,
                        expected: prev.hash,
                        got: block.parent_hash,
                    });
                }
            }
            prev = Some(block);
        }
        Ok(())
    }

    /// Append several headers, all or nothing.
    ///
    /// The whole run is revalidated against the tail first; on any
    /// failure no mutation happens.
    pub fn add_blocks(&mut self, blocks: &[LightBlock]) -> Result<(), ChainError> {
        self.validate_next_blocks(blocks)?;
        for block in blocks {
            self.by_height.insert(block.number, block.clone());
        }
        while self.by_height.len() > self.max_size {
            self.by_height.pop_first();
        }
        Ok(())
    }

    /// Remove every header above `height`. `None` empties the chain.
    ///
    /// # Errors
    /// - `TruncateBeyondTip` when `height` lies above the tip
    pub fn truncate_to_block(&mut self, height: Option<u64>) -> Result<(), ChainError> {
        let Some(height) = height else {
            self.by_height.clear();
            return Ok(());
        };

        if let Some(tail) = self.tail() {
            if height > tail.number {
                return Err(ChainError::TruncateBeyondTip {
                    height,
                    tip: tail.number,
                });
            }
        }
        self.by_height.split_off(&(height + 1));
        Ok(())
    }

    /// Verify the ordering invariant across every held header.
    pub fn validate_chain(&self) -> Result<(), ChainError> {
        let mut prev: Option<&LightBlock> = None;
        for block in self.by_height.values() {
            if let Some(prev) = prev {
                if block.number != prev.number + 1 {
                    return Err(ChainError::NonContiguous {
                        expected: prev.number + 1,
                        got: block.number,
                    });
                }
                if block.parent_hash != prev.hash {
                    return Err(ChainError::ParentHashMismatch {
                        height: block.number,
                        expected: prev.hash,
                        got: block.parent_hash,
                    });
                }
            }
            prev = Some(block);
        }
        Ok(())
    }

    /// Header at `height`, if held.
    pub fn find_block_by_height(&self, height: u64) -> Option<&LightBlock> {
        self.by_height.get(&height)
    }

    /// The newest `n` headers, ascending.
    pub fn last_n_blocks(&self, n: usize) -> Vec<LightBlock> {
        self.by_height
            .values()
            .rev()
            .take(n)
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    /// Every held header, ascending.
    pub fn to_vec(&self) -> Vec<LightBlock> {
        self.by_height.values().cloned().collect()
    }

    /// Rebuild a chain from an ordered snapshot.
    ///
    /// # Errors
    /// - `InvalidSnapshot` when the list is not a contiguous chain
    pub fn from_vec(blocks: Vec<LightBlock>, max_size: usize) -> Result<Self, ChainError> {
        let mut chain = Self::new(max_size);
        chain
            .validate_next_blocks(&blocks)
            .map_err(|e| ChainError::InvalidSnapshot(e.to_string()))?;
        for block in blocks {
            chain.by_height.insert(block.number, block);
        }
        while chain.by_height.len() > max_size {
            chain.by_height.pop_first();
        }
        Ok(chain)
    }
}
