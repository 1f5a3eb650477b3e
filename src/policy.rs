//! Container policies: how the engine sees keys and data inside elements.
//!
//! A policy is a zero-sized type naming the element type and the views the
//! table needs. The engine only ever hashes and compares `Policy::key`;
//! `Policy::data` is what lookups by key hand back.

use core::hash::Hash;
use core::marker::PhantomData;

pub trait Policy {
    /// Stored element.
    type Elem;
    /// Part of the element that is hashed and compared.
    type Key: Hash + Eq;
    /// Part of the element returned by keyed access.
    type Data: ?Sized;

    fn key(elem: &Self::Elem) -> &Self::Key;
    fn data(elem: &Self::Elem) -> &Self::Data;
}

/// Policies whose data can change without touching the key.
pub trait DataMut: Policy {
    fn data_mut(elem: &mut Self::Elem) -> &mut Self::Data;

    /// Shared key and mutable data of one element, borrowed together.
    fn split_mut(elem: &mut Self::Elem) -> (&Self::Key, &mut Self::Data);
}

/// Policies that can build a fresh element from a key alone.
pub trait FromKey: Policy {
    fn from_key(key: Self::Key) -> Self::Elem;
}

mod sealed {
    pub trait Sealed {}
}

/// Whether a table keeps one element per key or many.
pub trait Mode: sealed::Sealed {
    const MULTI: bool;
}

/// One element per key; inserting an existing key is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unique;

/// Any number of elements per key, kept adjacent in the global order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multi;

impl sealed::Sealed for Unique {}
impl sealed::Sealed for Multi {}

impl Mode for Unique {
    const MULTI: bool = false;
}

impl Mode for Multi {
    const MULTI: bool = true;
}

/// The element is its own key.
pub struct SetPolicy<T>(PhantomData<fn() -> T>);

impl<T: Hash + Eq> Policy for SetPolicy<T> {
    type Elem = T;
    type Key = T;
    type Data = T;

    #[inline]
    fn key(elem: &T) -> &T {
        elem
    }

    #[inline]
    fn data(elem: &T) -> &T {
        elem
    }
}

/// `(key, value)` pairs.
pub struct MapPolicy<K, V>(PhantomData<fn() -> (K, V)>);

impl<K: Hash + Eq, V> Policy for MapPolicy<K, V> {
    type Elem = (K, V);
    type Key = K;
    type Data = V;

    #[inline]
    fn key(elem: &(K, V)) -> &K {
        &elem.0
    }

    #[inline]
    fn data(elem: &(K, V)) -> &V {
        &elem.1
    }
}

impl<K: Hash + Eq, V> DataMut for MapPolicy<K, V> {
    #[inline]
    fn data_mut(elem: &mut (K, V)) -> &mut V {
        &mut elem.1
    }

    #[inline]
    fn split_mut(elem: &mut (K, V)) -> (&K, &mut V) {
        (&elem.0, &mut elem.1)
    }
}

impl<K: Hash + Eq, V: Default> FromKey for MapPolicy<K, V> {
    fn from_key(key: K) -> (K, V) {
        (key, V::default())
    }
}

/// Elements that carry their own key.
///
/// ```
/// use chain_hashtable::{KeySet, Keyed};
///
/// struct User {
///     id: u32,
///     name: String,
/// }
///
/// impl Keyed for User {
///     type Key = u32;
///     fn key(&self) -> &u32 {
///         &self.id
///     }
/// }
///
/// let mut users: KeySet<User> = KeySet::new();
/// users.insert(User { id: 7, name: "ada".into() }).unwrap();
/// assert_eq!(users.at(&7).map(|u| u.name.as_str()), Some("ada"));
/// ```
pub trait Keyed {
    type Key: Hash + Eq;

    fn key(&self) -> &Self::Key;
}

/// Elements keyed by `Keyed::key`.
pub struct KeyedPolicy<T>(PhantomData<fn() -> T>);

impl<T: Keyed> Policy for KeyedPolicy<T> {
    type Elem = T;
    type Key = T::Key;
    type Data = T;

    #[inline]
    fn key(elem: &T) -> &T::Key {
        elem.key()
    }

    #[inline]
    fn data(elem: &T) -> &T {
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_policy_views() {
        let mut elem = ("k".to_string(), 1u32);
        assert_eq!(MapPolicy::<String, u32>::key(&elem), "k");
        *MapPolicy::<String, u32>::data_mut(&mut elem) += 1;
        let (key, data) = MapPolicy::<String, u32>::split_mut(&mut elem);
        *data *= 10;
        assert_eq!(key, "k");
        assert_eq!(elem.1, 20);
        assert_eq!(MapPolicy::<String, u32>::from_key("z".into()), ("z".to_string(), 0));
    }

    #[test]
    fn modes_are_distinct() {
        assert!(!Unique::MULTI);
        assert!(Multi::MULTI);
    }
}
