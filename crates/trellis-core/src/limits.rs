//! Operation limits and input guards

use crate::error::{Error, Result};

/// Maximum items in any bulk operation (1000)
pub const MAX_BATCH_SIZE: usize = 1000;

/// Inclusive traversal depth bounds enforced on every graph query
pub const MIN_TRAVERSAL_DEPTH: u32 = 1;
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

/// Default depth for shortest-path search
pub const DEFAULT_PATH_DEPTH: u32 = 5;

/// Default depth for bounded reachability traversal
pub const DEFAULT_TRAVERSE_DEPTH: u32 = 3;

/// Default result cap for bounded reachability traversal
pub const DEFAULT_TRAVERSE_LIMIT: usize = 1000;

/// Default page size for list operations
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Reject empty and oversized batches before any processing
pub fn check_batch_size(len: usize) -> Result<()> {
    if len == 0 {
        return Err(Error::EmptyBatch);
    }
    if len > MAX_BATCH_SIZE {
        return Err(Error::BatchTooLarge {
            len,
            max: MAX_BATCH_SIZE,
        });
    }
    Ok(())
}

/// Assert the traversal depth precondition.
///
/// Depths outside `[1, 10]` are a programming error: callers are
/// expected to clamp user input upstream, so an out-of-range value
/// here means a broken call site, not bad user input.
///
/// # Panics
///
/// Panics if `depth` is outside `[MIN_TRAVERSAL_DEPTH, MAX_TRAVERSAL_DEPTH]`.
pub fn assert_depth(depth: u32) {
    assert!(
        (MIN_TRAVERSAL_DEPTH..=MAX_TRAVERSAL_DEPTH).contains(&depth),
        "traversal depth {} outside [{}, {}]",
        depth,
        MIN_TRAVERSAL_DEPTH,
        MAX_TRAVERSAL_DEPTH,
    );
}
