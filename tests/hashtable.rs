// Hashtable integration tests through the public API.
//
// Each test documents what behavior is being verified. The core
// invariants exercised:
// - Growth: zero-bucket tables grow lazily and keep the load-factor bound.
// - Buckets: `bucket_iter(h)` is exactly the elements hashing to `h`.
// - Order: `iter()` visits buckets in increasing order.
// - Erase: absent keys are a no-op; erased keys leave no trace.
// - Multi tables: equal keys stay adjacent through growth and erase.
use chain_hashtable::{Hashtable, Map, MapPolicy, Multi, MultiMap, Set, SetPolicy, TableConfig, Unique};
use std::hash::{BuildHasher, Hasher};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Identity hasher over integer keys so bucket placement is predictable.
#[derive(Clone, Default)]
struct IdentityBuildHasher;
struct IdentityHasher(u64);
impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher(0)
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Test: the three-key growth scenario.
// Verifies: 0 -> 1 -> 4 buckets; bucket sizes and global order.
#[test]
fn three_key_growth_scenario() {
    init_logging();
    let mut t: Set<u64, IdentityBuildHasher> = Set::with_hasher(IdentityBuildHasher);
    assert_eq!(t.bucket_count(), 0);

    t.insert(0).unwrap();
    assert_eq!(t.bucket_count(), 1);
    t.insert(4).unwrap();
    assert_eq!(t.bucket_count(), 4);
    t.insert(2).unwrap();
    assert_eq!(t.bucket_count(), 4);

    assert_eq!(t.bucket_size(0), 2);
    assert_eq!(t.bucket_size(1), 0);
    assert_eq!(t.bucket_size(2), 1);
    assert_eq!(t.bucket_size(3), 0);
    assert_eq!(t.bucket(&4), Some(0));
    assert_eq!(t.bucket(&2), Some(2));
    assert_eq!(t.iter().copied().collect::<Vec<_>>(), vec![0, 4, 2]);
    assert_eq!(t.load_factor(), 0.75);
}

// Test: insert N distinct keys, find each, erase all.
// Verifies: every bucket is empty afterwards and iteration yields nothing.
#[test]
fn round_trip_leaves_every_bucket_empty() {
    init_logging();
    let mut m: Map<u64, u64> = Map::new();
    for k in 0..2_000u64 {
        assert!(m.insert(k, k * 3).unwrap());
    }
    assert_eq!(m.len(), 2_000);
    for k in 0..2_000u64 {
        assert_eq!(m.value(&k), Some(&(k * 3)));
    }
    let per_bucket: usize = (0..m.bucket_count()).map(|h| m.bucket_size(h)).sum();
    assert_eq!(per_bucket, m.len());

    for k in 0..2_000u64 {
        assert_eq!(m.erase(&k), 1);
    }
    assert!(m.is_empty());
    assert!((0..m.bucket_count()).all(|h| m.bucket_size(h) == 0));
    assert_eq!(m.iter().count(), 0);
}

// Test: bucket_iter partitions the table and iter walks buckets in order.
#[test]
fn buckets_partition_global_order() {
    let t: Set<u64, IdentityBuildHasher> = (0..100u64).map(|k| k * 7).collect();
    let mut from_buckets = Vec::new();
    for h in 0..t.bucket_count() {
        for v in t.bucket_iter(h) {
            assert_eq!(t.bucket(v), Some(h));
            from_buckets.push(*v);
        }
    }
    assert_eq!(from_buckets, t.iter().copied().collect::<Vec<_>>());
    assert!(t.bucket_iter(t.bucket_count()).is_empty());
}

// Test: erasing an absent key is a no-op.
#[test]
fn idempotent_erase_of_absent_keys() {
    let mut t: Set<u64, IdentityBuildHasher> = (0..40u64).collect();
    let order: Vec<u64> = t.iter().copied().collect();
    let sizes: Vec<usize> = (0..t.bucket_count()).map(|h| t.bucket_size(h)).collect();
    for k in 40..80u64 {
        assert_eq!(t.erase(&k), 0);
    }
    assert_eq!(t.iter().copied().collect::<Vec<_>>(), order);
    assert_eq!((0..t.bucket_count()).map(|h| t.bucket_size(h)).collect::<Vec<_>>(), sizes);

    let mut empty: Set<u64> = Set::new();
    assert_eq!(empty.erase(&1), 0);
    assert_eq!(empty.bucket_count(), 0);
}

// Test: load-factor bound for several max load factors.
#[test]
fn load_factor_bound_for_several_maxima() {
    for lf in [0.5f32, 1.0, 1.5, 4.0] {
        let cfg = TableConfig::new().max_load_factor(lf);
        let mut t: Set<u32> = Set::with_config(cfg).unwrap();
        for k in 0..1_000 {
            t.insert(k).unwrap();
            assert!(t.load_factor() <= lf);
            assert!(t.bucket_count().is_power_of_two());
        }
    }
}

// Test: multi-map adjacency under a constant hasher (one bucket for all).
// Verifies: each key's values are one contiguous run in insertion order.
#[test]
fn multimap_runs_stay_contiguous_with_collisions() {
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

    let mut m: MultiMap<u8, u32, ConstBuildHasher> = MultiMap::with_hasher(ConstBuildHasher);
    for i in 0..60u32 {
        m.insert((i % 5) as u8, i).unwrap();
    }
    assert_eq!(m.bucket_size(0), 60);

    let keys: Vec<u8> = m.keys().copied().collect();
    let mut runs = keys.clone();
    runs.dedup();
    assert_eq!(runs.len(), 5, "each key forms a single run: {keys:?}");

    for k in 0..5u8 {
        let vals: Vec<u32> = m.values_of(&k).copied().collect();
        let want: Vec<u32> = (0..60).filter(|i| i % 5 == u32::from(k)).collect();
        assert_eq!(vals, want);
    }

    assert_eq!(m.erase(&2), 12);
    let mut runs: Vec<u8> = m.keys().copied().collect();
    runs.dedup();
    assert_eq!(runs.len(), 4);
}

// Test: find returns a range from the match to the end of the table.
#[test]
fn find_continues_through_table() {
    let t: Set<u64, IdentityBuildHasher> = [3u64, 1, 2].into_iter().collect();
    assert_eq!(t.bucket_count(), 4);
    let rest: Vec<u64> = t.find(&2).copied().collect();
    assert_eq!(rest, vec![2, 3]);
    let mut r = t.find(&9);
    assert!(r.is_empty());
    assert_eq!(r.front(), None);
    assert!(!r.pop_front());
}

// Test: explicit rehash and reserve.
#[test]
fn rehash_and_reserve_round_to_powers_of_two() {
    let mut m: Map<u32, ()> = Map::with_buckets(5).unwrap();
    assert_eq!(m.bucket_count(), 8);
    m.reserve(100).unwrap();
    assert_eq!(m.bucket_count(), 128);
    m.rehash(3).unwrap();
    assert_eq!(m.bucket_count(), 4);
    for k in 0..10 {
        m.insert(k, ()).unwrap();
    }
    m.rehash(0).unwrap();
    assert_eq!(m.bucket_count(), 16);
    assert!((0..10).all(|k| m.contains_key(&k)));
}

// Test: cursors returned by emplace resolve until the next structural change.
#[test]
fn cursor_resolves_and_updates_in_place() {
    let mut m: Hashtable<MapPolicy<String, Vec<u8>>> = Hashtable::new();
    let (c, inserted) = m.emplace(("bytes".to_string(), vec![1])).unwrap();
    assert!(inserted);
    c.data_mut(&mut m).unwrap().push(2);
    assert_eq!(c.data(&m), Some(&vec![1, 2]));
    assert_eq!(c.range(&m).count(), 1);
    assert_eq!(m.value("bytes"), Some(&vec![1, 2]));
}

// Test: the chunk sizing budget is a whole number of cache lines.
// Verifies: the node count stays in bounds and the budget covers the nodes.
#[test]
fn chunk_layout_budget_fills_cache_lines() {
    let t: Hashtable<SetPolicy<[u8; 24]>, Unique> = Hashtable::new();
    let layout = t.chunk_layout();
    assert!((32..=128).contains(&layout.nodes));
    assert_eq!(layout.footprint() % 64, 0);
    assert!(layout.chunk_bytes() < layout.footprint());

    let m: Hashtable<MapPolicy<u64, String>, Multi> = Hashtable::new();
    assert_eq!(m.chunk_layout().footprint() % 64, 0);
}

// Test: Debug renders like a set of elements.
#[test]
fn debug_lists_elements_in_order() {
    let t: Set<u64, IdentityBuildHasher> = [3u64, 1, 2].into_iter().collect();
    assert_eq!(format!("{t:?}"), "{1, 2, 3}");
}
