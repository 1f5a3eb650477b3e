//! Maps: `(key, value)` pairs keyed by the first field.

use crate::error::TableResult;
use crate::hashtable::Hashtable;
use crate::policy::{MapPolicy, Mode, Multi, Unique};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// One value per key.
pub type Map<K, V, S = DefaultHashBuilder> = Hashtable<MapPolicy<K, V>, Unique, S>;

/// Any number of values per key. Values of one key stay adjacent, in
/// insertion order.
pub type MultiMap<K, V, S = DefaultHashBuilder> = Hashtable<MapPolicy<K, V>, Multi, S>;

impl<K, V, M, S> Hashtable<MapPolicy<K, V>, M, S>
where
    K: Hash + Eq,
    M: Mode,
    S: BuildHasher,
{
    /// Adds `(key, value)`. A unique map that already holds `key` keeps its
    /// old value and returns `false`.
    pub fn insert(&mut self, key: K, value: V) -> TableResult<bool> {
        Ok(self.emplace((key, value))?.1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Every value stored under `key`.
    pub fn values_of<'a, Q>(&'a self, key: &Q) -> impl Iterator<Item = &'a V> + 'a
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.equal_range(key).map(|(_, v)| v)
    }
}

impl<K, V, S> Hashtable<MapPolicy<K, V>, Unique, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn value<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.at(key)
    }

    pub fn value_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.at_mut(key)
    }

    /// Removes `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(key).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keeps_first_value() {
        let mut m: Map<String, u32> = Map::new();
        assert!(m.insert("a".into(), 1).unwrap());
        assert!(!m.insert("a".into(), 2).unwrap());
        assert_eq!(m.value("a"), Some(&1));
        *m.value_mut("a").unwrap() = 3;
        assert_eq!(m.value("a"), Some(&3));
        assert_eq!(m.remove("a"), Some(3));
        assert_eq!(m.remove("a"), None);
        assert!(m.is_empty());
    }

    #[test]
    fn counter_via_default_insert() {
        let mut m: Map<char, usize> = Map::new();
        for c in "mississippi".chars() {
            *m.get_or_insert_default(c).unwrap() += 1;
        }
        assert_eq!(m.value(&'s'), Some(&4));
        assert_eq!(m.value(&'i'), Some(&4));
        assert_eq!(m.value(&'p'), Some(&2));
        assert_eq!(m.value(&'m'), Some(&1));
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn multimap_values_in_insertion_order() {
        let mut m: MultiMap<u32, &str> = MultiMap::new();
        m.insert(1, "one").unwrap();
        m.insert(2, "two").unwrap();
        m.insert(1, "uno").unwrap();
        m.insert(1, "eins").unwrap();
        assert_eq!(m.values_of(&1).copied().collect::<Vec<_>>(), vec!["one", "uno", "eins"]);
        assert_eq!(m.values_of(&2).count(), 1);
        assert_eq!(m.values_of(&3).count(), 0);
        assert_eq!(m.keys().count(), 4);
        assert_eq!(m.values().count(), 4);
        m.assert_invariants();
    }
}
