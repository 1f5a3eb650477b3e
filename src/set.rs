//! Sets: the element is its own key.

use crate::error::TableResult;
use crate::hashtable::Hashtable;
use crate::policy::{Mode, Multi, SetPolicy, Unique};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// One copy of each value.
pub type Set<T, S = DefaultHashBuilder> = Hashtable<SetPolicy<T>, Unique, S>;

/// Any number of equal values, kept adjacent.
pub type MultiSet<T, S = DefaultHashBuilder> = Hashtable<SetPolicy<T>, Multi, S>;

impl<T, M, S> Hashtable<SetPolicy<T>, M, S>
where
    T: Hash + Eq,
    M: Mode,
    S: BuildHasher,
{
    /// Adds `value`. Returns `false` if a unique set already held it.
    pub fn insert(&mut self, value: T) -> TableResult<bool> {
        Ok(self.emplace(value)?.1)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.contains_key(value)
    }

    /// Removes every copy of `value`. Returns whether anything was removed.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.erase(value) > 0
    }
}
