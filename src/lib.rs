//! chain-hashtable: a chained hash table whose elements form one globally
//! ordered list, walkable end to end without visiting empty buckets.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one hash-table engine behind every keyed container family
//!   (sets, maps, key-extracting sets; unique and multi-valued).
//! - Layers:
//!   - NodePool<E>: chunked arena of chain nodes addressed by `NodeId`,
//!     with a free list threaded through released nodes. The node count
//!     per chunk comes from a cache-line byte budget (`ChunkLayout`);
//!     chunks themselves are plain boxed slices, not cache-line aligned.
//!   - BucketIndex: `bucket_count + 1` head slots into the global list.
//!     Empty buckets are forward-filled with the next bucket's head, so
//!     `[heads[h], heads[h + 1])` is always bucket `h`.
//!   - Hashtable<P, M, S>: lookup, insert, erase, load-factor growth and
//!     rehash on top of the two, parameterized by a `Policy` (how to see
//!     the key inside an element), a `Mode` (`Unique` or `Multi`) and a
//!     `BuildHasher`.
//!   - Set / Map / KeySet: aliases over `Hashtable` with a few
//!     container-shaped conveniences.
//!
//! Constraints
//! - Single-threaded; no internal synchronization.
//! - No per-element heap allocation; nodes come from pool chunks that are
//!   only freed on `clear` or drop.
//! - Buckets are powers of two; an empty table may have zero buckets and
//!   allocates its index on first insert.
//! - `len / bucket_count <= max_load_factor` after every insert.
//! - Multi tables keep equal keys adjacent in the global order.
//!
//! Hasher and rehashing invariants
//! - Each node stores its key's `u64` hash. Rehash relinks nodes using the
//!   stored hash; `K: Hash` is never invoked after insertion.
//! - Rehash preserves the relative order of nodes that land in the same
//!   bucket, so equal keys stay adjacent across growth.
//!
//! Positions
//! - `Range` and `LocalRange` borrow the table; the borrow checker rules
//!   out structural mutation while one is alive.
//! - `Cursor` is a detached `Copy` handle returned by `emplace`. Debug
//!   builds stamp it with a structural-mutation epoch and panic when a
//!   stale cursor is resolved. Release builds resolve stale cursors to
//!   whatever the slot holds, which is memory-safe but unspecified.
//!
//! Errors
//! - Growth paths return `TableResult`. Allocation failure leaves the
//!   table as it was. Infallible trait surfaces (`Clone`, `Extend`,
//!   `FromIterator`) panic on allocation failure like std collections.
//!
//! Logging
//! - Rehash is logged at `debug`, chunk allocation and `clear` at
//!   `trace`, through the `log` facade. The crate installs no logger.

mod bucket_index;
pub mod config;
mod epoch;
pub mod error;
pub mod hashtable;
mod hashtable_proptest;
mod keyset;
mod map;
mod node_pool;
pub mod policy;
pub mod range;
mod set;

// Public surface
pub use config::{TableConfig, DEFAULT_MAX_LOAD_FACTOR};
pub use error::{TableError, TableResult};
pub use hashtable::{Cursor, Hashtable};
pub use keyset::{KeySet, MultiKeySet};
pub use map::{Map, MultiMap};
pub use node_pool::ChunkLayout;
pub use policy::{
    DataMut, FromKey, Keyed, KeyedPolicy, MapPolicy, Mode, Multi, Policy, SetPolicy, Unique,
};
pub use range::{LocalRange, Range};
pub use set::{MultiSet, Set};
