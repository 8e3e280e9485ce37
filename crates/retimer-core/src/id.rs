//! Retimer identifiers and the allocator that issues them

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::registry::RegistryError;

/// Unique identifier bound to a retimer handle for its registered lifetime
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RetimerId(pub u32);

impl RetimerId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RetimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates and recycles retimer identifiers.
///
/// `acquire` always returns the smallest identifier not currently held by a
/// live handle; released identifiers become eligible for reuse immediately.
/// The allocator itself is not synchronized; the registry serializes access
/// through its internal lock.
#[derive(Debug, Default)]
pub struct IdAllocator {
    /// Released identifiers below the watermark
    free: BTreeSet<u32>,
    /// Lowest identifier never handed out
    next: u32,
}

impl IdAllocator {
    /// Create a new empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the smallest currently-unused identifier
    pub fn acquire(&mut self) -> Result<RetimerId, RegistryError> {
        if let Some(id) = self.free.pop_first() {
            return Ok(RetimerId(id));
        }
        if self.next == u32::MAX {
            return Err(RegistryError::Exhausted);
        }
        let id = self.next;
        self.next += 1;
        Ok(RetimerId(id))
    }

    /// Return an identifier to the pool for reuse.
    ///
    /// Releasing an identifier that is not currently allocated is a logged
    /// no-op; callers must release each identifier at most once per acquire.
    pub fn release(&mut self, id: RetimerId) {
        if id.0 >= self.next {
            warn!(id = %id, "Releasing an identifier that was never acquired");
            return;
        }
        if !self.free.insert(id.0) {
            warn!(id = %id, "Releasing an identifier that is already free");
        }
    }

    /// Number of currently allocated identifiers
    pub fn allocated(&self) -> usize {
        self.next as usize - self.free.len()
    }

    /// Whether no identifiers are currently allocated
    pub fn is_empty(&self) -> bool {
        self.allocated() == 0
    }

    /// Highest identifier ever handed out + 1
    pub fn high_water_mark(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_counts_up_from_zero() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.acquire().unwrap(), RetimerId(0));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(1));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(2));
        assert_eq!(alloc.allocated(), 3);
        assert_eq!(alloc.high_water_mark(), 3);
    }

    #[test]
    fn test_release_makes_id_reusable() {
        let mut alloc = IdAllocator::new();
        let a = alloc.acquire().unwrap();
        let _b = alloc.acquire().unwrap();
        alloc.release(a);
        assert_eq!(alloc.acquire().unwrap(), a);
    }

    #[test]
    fn test_acquire_prefers_smallest_free() {
        let mut alloc = IdAllocator::new();
        for _ in 0..4 {
            alloc.acquire().unwrap();
        }
        alloc.release(RetimerId(2));
        alloc.release(RetimerId(0));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(0));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(2));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(4));
    }

    #[test]
    fn test_double_release_is_inert() {
        let mut alloc = IdAllocator::new();
        alloc.acquire().unwrap();
        alloc.acquire().unwrap();
        alloc.release(RetimerId(0));
        alloc.release(RetimerId(0));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(0));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(2));
    }

    #[test]
    fn test_release_of_unacquired_id_is_inert() {
        let mut alloc = IdAllocator::new();
        alloc.acquire().unwrap();
        alloc.release(RetimerId(7));
        assert_eq!(alloc.acquire().unwrap(), RetimerId(1));
        assert_eq!(alloc.allocated(), 2);
    }

    #[test]
    fn test_empty_after_full_reclaim() {
        let mut alloc = IdAllocator::new();
        let ids: Vec<_> = (0..10).map(|_| alloc.acquire().unwrap()).collect();
        assert!(!alloc.is_empty());
        for id in ids {
            alloc.release(id);
        }
        assert!(alloc.is_empty());
        assert_eq!(alloc.acquire().unwrap(), RetimerId(0));
    }
}
