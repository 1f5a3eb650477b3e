//! Debug-only structural-mutation epoch.
//!
//! A table advances its epoch on every structural mutation (insert,
//! erase, rehash, clear). Detached cursors carry the epoch they were
//! minted at; resolving a cursor from an older epoch panics in debug
//! builds. In release builds both types are zero-sized and every check
//! compiles to nothing.

/// Per-table epoch counter. Embed in the table and call `advance` from
/// every structural mutation.
#[derive(Debug, Clone, Default)]
pub(crate) struct DebugEpoch {
    #[cfg(debug_assertions)]
    current: u64,
}

/// Epoch a cursor was minted at.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub(crate) struct Stamp {
    #[cfg(debug_assertions)]
    epoch: u64,
}

impl DebugEpoch {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            current: 0,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.current = self.current.wrapping_add(1);
        }
    }

    #[inline]
    pub fn stamp(&self) -> Stamp {
        Stamp {
            #[cfg(debug_assertions)]
            epoch: self.current,
        }
    }

    /// Panics in debug builds if the table changed shape since `stamp`.
    #[inline]
    pub fn check(&self, stamp: Stamp) {
        #[cfg(debug_assertions)]
        assert!(
            stamp.epoch == self.current,
            "stale cursor: table was structurally modified after the cursor was created"
        );
        #[cfg(not(debug_assertions))]
        let _ = stamp;
    }
}
