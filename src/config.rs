//! Construction parameters for a table.

use crate::error::{TableError, TableResult};

/// Max load factor used when none is configured.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// Initial sizing and growth policy of a table.
///
/// ```
/// use chain_hashtable::{Set, TableConfig};
///
/// let cfg = TableConfig::new().buckets(64).max_load_factor(0.5);
/// let set: Set<u32> = Set::with_config(cfg).unwrap();
/// assert_eq!(set.bucket_count(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Initial bucket count, rounded up to a power of two. Zero defers
    /// bucket allocation to the first insert.
    pub buckets: usize,

    /// Growth threshold for `len / bucket_count`.
    pub max_load_factor: f32,
}

impl TableConfig {
    pub const fn new() -> Self {
        Self {
            buckets: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    pub const fn buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets;
        self
    }

    pub const fn max_load_factor(mut self, max_load_factor: f32) -> Self {
        self.max_load_factor = max_load_factor;
        self
    }

    pub(crate) fn validate(&self) -> TableResult<()> {
        check_load_factor(self.max_load_factor)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn check_load_factor(lf: f32) -> TableResult<()> {
    if lf.is_finite() && lf > 0.0 {
        Ok(())
    } else {
        Err(TableError::InvalidLoadFactor)
    }
}

/// Smallest bucket count that keeps `count` elements within `max_load_factor`.
pub(crate) fn buckets_for(count: usize, max_load_factor: f32) -> usize {
    (count as f64 / f64::from(max_load_factor)).ceil() as usize
}
