//! Error types for table operations.

use std::collections::TryReserveError;
use std::fmt;

/// Errors that can occur while growing or configuring a table.
///
/// Lookups never fail; a missing key is an empty result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The allocator refused a node chunk or bucket index allocation.
    /// The table is left exactly as it was before the attempt.
    AllocFailed,

    /// The requested size does not fit the node id space or the bucket
    /// count arithmetic.
    CapacityOverflow,

    /// A max load factor that is not finite and strictly positive.
    InvalidLoadFactor,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocFailed => write!(f, "allocation failed"),
            Self::CapacityOverflow => write!(f, "capacity overflow"),
            Self::InvalidLoadFactor => {
                write!(f, "max load factor must be finite and greater than zero")
            }
        }
    }
}

impl std::error::Error for TableError {}

impl From<TryReserveError> for TableError {
    fn from(_: TryReserveError) -> Self {
        // The error kind is not inspectable on stable; the allocator is the
        // only source we reserve through.
        Self::AllocFailed
    }
}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Unwraps the result of an allocation made on behalf of an infallible
/// trait surface (`Clone`, `Extend`, ...).
pub(crate) fn or_panic<T>(res: TableResult<T>) -> T {
    match res {
        Ok(v) => v,
        Err(e) => panic!("hashtable: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(TableError::AllocFailed.to_string(), "allocation failed");
        assert_eq!(TableError::CapacityOverflow.to_string(), "capacity overflow");
        assert_eq!(
            TableError::InvalidLoadFactor.to_string(),
            "max load factor must be finite and greater than zero"
        );
    }

    #[test]
    fn is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<TableError>();
    }

    #[test]
    fn try_reserve_failure_maps_to_alloc_failed() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(TableError::from(err), TableError::AllocFailed);
    }

    #[test]
    #[should_panic(expected = "hashtable: capacity overflow")]
    fn or_panic_reports_the_error() {
        let _: () = or_panic(Err(TableError::CapacityOverflow));
    }
}
