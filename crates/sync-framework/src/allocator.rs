//! # Sequential ID Allocator
//!
//! Each identifier space (order ids, shipment ids, ...) gets its own
//! [`IdAllocator`] instance, injected into whichever component creates records.
//! There is no process-wide counter.

use crate::error::SyncError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe, strictly increasing identifier source.
///
/// Identifiers are dense and 1-based by default: the first call to
/// [`next`](IdAllocator::next) returns `1`, the second `2`, and so on, no matter
/// how many threads call concurrently. Once `u32::MAX` has been handed out the
/// allocator is exhausted and every further call fails; it never wraps.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an allocator whose first identifier is `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU64::new(u64::from(first)),
        }
    }

    /// Consumes and returns the next identifier.
    pub fn next(&self) -> Result<u32, SyncError> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n <= u64::from(u32::MAX)).then_some(n + 1)
            })
            .ok()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(SyncError::IdsExhausted)
    }

    /// Consumes the next identifier and converts it into a typed id.
    pub fn next_id<I: From<u32>>(&self) -> Result<I, SyncError> {
        self.next().map(I::from)
    }

    /// Returns the identifier the next call will hand out, without consuming it.
    /// Past `u32::MAX` this means the allocator is exhausted.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
