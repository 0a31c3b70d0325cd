//! Request identifier allocation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out unique, strictly increasing request identifiers. Shared by all
/// workers in a group via an `Arc`; safe under parallel contention since it
/// is backed by a single atomic counter.
#[derive(Debug, Default)]
pub struct RequestIdSource {
    next: AtomicU64,
}

impl RequestIdSource {
    /// Creates a source whose first id will be 1.
    pub fn new() -> RequestIdSource {
        RequestIdSource {
            next: AtomicU64::new(1),
        }
    }

    /// Returns the next request id. Never returns the same id twice.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
