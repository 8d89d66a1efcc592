use thiserror::Error;

/// Errors during map operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// A node on a populated path is missing from the cache.
    #[error("expected node at level {level}, index {index} to be populated")]
    InvariantViolation { level: usize, index: u64 },
    #[error("key already exists")]
    KeyExists,
    #[error("key not found")]
    KeyNotFound,
    #[error("map is full: capacity {capacity} leaves")]
    Full { capacity: u64 },
    /// The located low node does not bracket the key.
    #[error("invalid low node")]
    InvalidLowNode,
    #[error("height must be between 2 and 64, got {0}")]
    InvalidHeight(usize),
    /// A leaf hash was written to a slot no insert has allocated yet.
    #[error("leaf slot {index} has not been allocated")]
    UnallocatedSlot { index: u64 },
    #[error("leaf index {index} out of range for capacity {capacity}")]
    IndexOutOfRange { index: u64, capacity: u64 },
}
