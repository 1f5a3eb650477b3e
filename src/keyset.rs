//! Key sets: elements that carry their own key.

use crate::error::TableResult;
use crate::hashtable::Hashtable;
use crate::policy::{Keyed, KeyedPolicy, Mode, Multi, Unique};
use core::hash::BuildHasher;
use hashbrown::hash_map::DefaultHashBuilder;

/// One element per `Keyed::key`.
pub type KeySet<T, S = DefaultHashBuilder> = Hashtable<KeyedPolicy<T>, Unique, S>;

/// Any number of elements per `Keyed::key`.
pub type MultiKeySet<T, S = DefaultHashBuilder> = Hashtable<KeyedPolicy<T>, Multi, S>;

impl<T, M, S> Hashtable<KeyedPolicy<T>, M, S>
where
    T: Keyed,
    M: Mode,
    S: BuildHasher,
{
    /// Adds `elem` under its own key. Returns `false` if a unique set
    /// already held an element with that key.
    pub fn insert(&mut self, elem: T) -> TableResult<bool> {
        Ok(self.emplace(elem)?.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Route {
        dest: &'static str,
        hop: u8,
    }

    impl Keyed for Route {
        type Key = &'static str;
        fn key(&self) -> &&'static str {
            &self.dest
        }
    }

    #[test]
    fn keyset_looks_up_by_embedded_key() {
        let mut routes: KeySet<Route> = KeySet::new();
        assert!(routes.insert(Route { dest: "a", hop: 1 }).unwrap());
        assert!(!routes.insert(Route { dest: "a", hop: 2 }).unwrap());
        assert_eq!(routes.at(&"a").map(|r| r.hop), Some(1));
        assert_eq!(routes.at(&"b"), None);
    }

    #[test]
    fn multi_keyset_groups_by_key() {
        let mut routes: MultiKeySet<Route> = MultiKeySet::new();
        for (dest, hop) in [("a", 1), ("b", 1), ("a", 2), ("c", 9), ("a", 3)] {
            routes.insert(Route { dest, hop }).unwrap();
        }
        let hops: Vec<u8> = routes.equal_range(&"a").map(|r| r.hop).collect();
        assert_eq!(hops, vec![1, 2, 3]);
        assert_eq!(routes.erase(&"a"), 3);
        assert_eq!(routes.len(), 2);
        routes.assert_invariants();
    }
}
