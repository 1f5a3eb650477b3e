#![cfg(test)]

// Property tests for Hashtable kept inside the crate so they can run the
// private invariant checker after every step.

use crate::hashtable::Hashtable;
use crate::policy::{MapPolicy, Multi, SetPolicy, Unique};
use crate::TableConfig;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Erase(usize),
    Take(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Reserve(usize),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Erase),
            1 => idx.clone().prop_map(OpI::Take),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..70).prop_map(OpI::Rehash),
            1 => (0usize..70).prop_map(OpI::Reserve),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Collision variant using a constant hasher: every key lands in bucket 0.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

fn run_unique<S: BuildHasher>(
    mut sut: Hashtable<MapPolicy<Key, i32>, Unique, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let (c, inserted) = sut.emplace((k.clone(), v)).unwrap();
                prop_assert_eq!(inserted, !already, "insert reports novelty");
                model.entry(k.clone()).or_insert(v);
                // The cursor names the stored element, old or new.
                prop_assert_eq!(c.data(&sut), model.get(&k));
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let removed = sut.erase(&k);
                prop_assert_eq!(removed, usize::from(model.remove(&k).is_some()));
            }
            OpI::Take(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.take(&k).map(|(_, v)| v), model.remove(&k));
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.at(&k), model.get(&k));
                prop_assert_eq!(sut.count(&k), usize::from(model.contains_key(&k)));
                // find yields the match first, then the rest of the table.
                let r = sut.find(&k);
                prop_assert_eq!(r.front().map(|e| &e.0), model.get_key_value(&k).map(|(k, _)| k));
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.at_mut(&k) {
                    *v = v.saturating_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            OpI::Rehash(n) => {
                sut.rehash(n).unwrap();
                prop_assert!(sut.bucket_count() >= n);
            }
            OpI::Reserve(n) => sut.reserve(n).unwrap(),
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let s: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeMap<_, _> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
    }
    Ok(())
}

fn run_multi<S: BuildHasher>(
    mut sut: Hashtable<MapPolicy<Key, i32>, Multi, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, Vec<i32>> = HashMap::new();
    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let (c, inserted) = sut.emplace((k.clone(), v)).unwrap();
                prop_assert!(inserted, "multi tables always insert");
                prop_assert_eq!(c.data(&sut), Some(&v));
                model.entry(k).or_default().push(v);
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let expected = model.remove(&k).map_or(0, |vs| vs.len());
                prop_assert_eq!(sut.erase(&k), expected);
            }
            OpI::Take(i) => {
                let k = key_from(pool, i);
                let expected = match model.get_mut(&k) {
                    Some(vs) => {
                        let v = vs.remove(0);
                        if vs.is_empty() {
                            model.remove(&k);
                        }
                        Some(v)
                    }
                    None => None,
                };
                prop_assert_eq!(sut.take(&k).map(|(_, v)| v), expected);
            }
            OpI::Find(i) | OpI::Mutate(i, _) => {
                let k = key_from(pool, i);
                // Values of one key come back in insertion order.
                let got: Vec<i32> = sut.equal_range(&k).map(|(_, v)| *v).collect();
                let want = model.get(&k).cloned().unwrap_or_default();
                prop_assert_eq!(sut.count(&k), want.len());
                prop_assert_eq!(got, want);
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Rehash(n) => sut.rehash(n).unwrap(),
            OpI::Reserve(n) => sut.reserve(n).unwrap(),
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let s: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s, m);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.values().map(Vec::len).sum::<usize>());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
    }
    Ok(())
}

// Property: State-machine equivalence of a unique map against
// std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate inserts leave the stored value alone and report `false`.
// - `at`/`count`/`contains_key`/`find` parity with the model.
// - `erase`/`take` remove exactly what the model removes.
// - Forward fill, bucket contiguity, prev/next symmetry and cached hashes
//   hold after every step, including rehash to arbitrary counts and clear.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_state_machine((pool, ops) in arb_scenario()) {
        run_unique(Hashtable::new(), &pool, ops)?;
    }

    #[test]
    fn prop_unique_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_unique(Hashtable::with_hasher(ConstBuildHasher), &pool, ops)?;
    }

    #[test]
    fn prop_unique_state_machine_low_load_factor((pool, ops) in arb_scenario()) {
        let cfg = TableConfig::new().max_load_factor(0.3);
        run_unique(Hashtable::with_config(cfg).unwrap(), &pool, ops)?;
    }
}

// Property: State-machine equivalence of a multi map against a
// HashMap<Key, Vec<i32>> model. Equal keys must stay adjacent and keep
// insertion order, under both a real and a constant hasher.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_multi_state_machine((pool, ops) in arb_scenario()) {
        run_multi(Hashtable::new(), &pool, ops)?;
    }

    #[test]
    fn prop_multi_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_multi(Hashtable::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Property: a set built from any sequence holds exactly its distinct values,
// and rehash never changes the contents.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_from_iter(values in proptest::collection::vec(0u16..512, 0..300), buckets in 0usize..600) {
        let mut sut: Hashtable<SetPolicy<u16>> = values.iter().copied().collect();
        let model: BTreeSet<u16> = values.iter().copied().collect();
        sut.assert_invariants();
        prop_assert_eq!(sut.iter().copied().collect::<BTreeSet<_>>(), model.clone());

        sut.rehash(buckets).unwrap();
        sut.assert_invariants();
        prop_assert!(sut.bucket_count() >= buckets);
        prop_assert_eq!(sut.len(), model.len());
        for v in &model {
            prop_assert!(sut.contains_key(v));
        }
    }
}
