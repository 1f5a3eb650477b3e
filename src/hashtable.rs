//! Hashtable: the chained hash table engine behind every container alias.
//!
//! Elements live in pool nodes linked into one global list, ordered by
//! bucket. The bucket index points into that list, so a bucket is a
//! contiguous run of it and walking the whole table never visits empty
//! buckets. Each node caches its key's hash; the hasher runs once per
//! insert and lookup, never during rehash.

use crate::bucket_index::BucketIndex;
use crate::config::{self, TableConfig, DEFAULT_MAX_LOAD_FACTOR};
use crate::epoch::{DebugEpoch, Stamp};
use crate::error::{self, TableError, TableResult};
use crate::node_pool::{ChunkLayout, NodeId, NodePool};
use crate::policy::{DataMut, FromKey, Mode, Policy, Unique};
use crate::range::{LocalRange, Range};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use hashbrown::hash_map::DefaultHashBuilder;

/// Detached position of one element.
///
/// Unlike a [`Range`], a cursor does not borrow the table, so it can be
/// kept across calls and resolved later. It is only meaningful until the
/// next structural mutation (insert, erase, rehash, clear); debug builds
/// panic when a stale cursor is resolved.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    node: NodeId,
    stamp: Stamp,
}

impl Cursor {
    pub fn get<'a, P, M, S>(&self, table: &'a Hashtable<P, M, S>) -> Option<&'a P::Elem>
    where
        P: Policy,
    {
        table.epoch.check(self.stamp);
        table.pool.get(self.node)?.value()
    }

    pub fn data<'a, P, M, S>(&self, table: &'a Hashtable<P, M, S>) -> Option<&'a P::Data>
    where
        P: Policy,
    {
        self.get(table).map(P::data)
    }

    pub fn data_mut<'a, P, M, S>(&self, table: &'a mut Hashtable<P, M, S>) -> Option<&'a mut P::Data>
    where
        P: DataMut,
    {
        table.epoch.check(self.stamp);
        table.pool.get_mut(self.node)?.value_mut().map(P::data_mut)
    }

    /// Range over the rest of the table, starting at this element.
    pub fn range<'a, P, M, S>(&self, table: &'a Hashtable<P, M, S>) -> Range<'a, P::Elem>
    where
        P: Policy,
    {
        let start = self.get(table).map(|_| self.node);
        Range::new(&table.pool, start)
    }
}

pub struct Hashtable<P: Policy, M = Unique, S = DefaultHashBuilder> {
    hasher: S,
    index: BucketIndex,
    pool: NodePool<P::Elem>,
    max_load_factor: f32,
    epoch: DebugEpoch,
    _pd: PhantomData<fn() -> (P, M)>,
}

fn round_buckets(n: usize) -> TableResult<usize> {
    if n == 0 {
        return Ok(0);
    }
    n.checked_next_power_of_two()
        .ok_or(TableError::CapacityOverflow)
}

impl<P: Policy, M: Mode> Hashtable<P, M> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_buckets(buckets: usize) -> TableResult<Self> {
        Self::with_buckets_and_hasher(buckets, Default::default())
    }

    pub fn with_config(config: TableConfig) -> TableResult<Self> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<P: Policy, M: Mode, S: BuildHasher + Default> Default for Hashtable<P, M, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<P: Policy, M: Mode, S: BuildHasher> Hashtable<P, M, S> {
    /// Empty table without buckets; the first insert allocates them.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: BucketIndex::empty(),
            pool: NodePool::new(),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            epoch: DebugEpoch::new(),
            _pd: PhantomData,
        }
    }

    pub fn with_buckets_and_hasher(buckets: usize, hasher: S) -> TableResult<Self> {
        Self::with_config_and_hasher(TableConfig::new().buckets(buckets), hasher)
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> TableResult<Self> {
        config.validate()?;
        let mut table = Self::with_hasher(hasher);
        table.max_load_factor = config.max_load_factor;
        table.index = BucketIndex::with_buckets(round_buckets(config.buckets)?)?;
        Ok(table)
    }

    #[inline]
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    fn cursor(&self, node: NodeId) -> Cursor {
        Cursor {
            node,
            stamp: self.epoch.stamp(),
        }
    }

    #[inline]
    fn matches<Q>(&self, id: NodeId, hash: u64, q: &Q) -> bool
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let node = self.pool.node(id);
        node.hash == hash && P::key(node.elem()).borrow() == q
    }

    /// Bucket and first node holding a key equal to `q`.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<(usize, NodeId)>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.index.bucket_count() == 0 {
            return None;
        }
        let h = self.index.bucket_of(hash);
        let (mut cur, end) = self.index.slice(h);
        while cur != end {
            let id = cur?;
            if self.matches(id, hash, q) {
                return Some((h, id));
            }
            cur = self.pool.node(id).next;
        }
        None
    }

    /// Last node of the run of keys equal to `q` that starts at `first`.
    fn run_last<Q>(&self, h: usize, first: NodeId, hash: u64, q: &Q) -> NodeId
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if !M::MULTI {
            return first;
        }
        let end = self.index.head(h + 1);
        let mut last = first;
        loop {
            match self.pool.node(last).next {
                Some(n) if Some(n) != end && self.matches(n, hash, q) => last = n,
                _ => return last,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.len() == 0
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Chunk sizing used by this table's node pool.
    pub fn chunk_layout(&self) -> ChunkLayout {
        self.pool.layout()
    }

    /// Inserts `elem`. Unique tables leave an existing element with an equal
    /// key in place and report `false`; multi tables always insert, next to
    /// any elements with an equal key.
    pub fn emplace(&mut self, elem: P::Elem) -> TableResult<(Cursor, bool)> {
        let hash = self.make_hash(P::key(&elem));
        if !M::MULTI {
            if let Some((_, id)) = self.locate(hash, P::key(&elem)) {
                return Ok((self.cursor(id), false));
            }
        }

        self.rehash_ahead(1)?;
        let h = self.index.bucket_of(hash);
        let after = if M::MULTI {
            self.locate(hash, P::key(&elem))
                .map(|(h, first)| self.run_last(h, first, hash, P::key(&elem)))
        } else {
            None
        };

        let id = self.pool.request(hash, elem)?;
        match after {
            Some(a) => self.index.link_after(&mut self.pool, a, id),
            None => self.index.link(&mut self.pool, h, id),
        }
        self.epoch.advance();
        Ok((self.cursor(id), true))
    }

    /// Removes every element whose key equals `q` (at most one in unique
    /// tables). Returns how many were removed.
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let Some((h, mut id)) = self.locate(hash, q) else {
            return 0;
        };
        let end = self.index.head(h + 1);
        let mut removed = 0;
        loop {
            let next = self.index.unlink(&mut self.pool, h, id);
            let _ = self.pool.release(id);
            removed += 1;
            if !M::MULTI {
                break;
            }
            match next {
                Some(n) if next != end && self.matches(n, hash, q) => id = n,
                _ => break,
            }
        }
        self.epoch.advance();
        removed
    }

    /// Removes the first element whose key equals `q` and returns it.
    pub fn take<Q>(&mut self, q: &Q) -> Option<P::Elem>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let (h, id) = self.locate(hash, q)?;
        self.index.unlink(&mut self.pool, h, id);
        self.epoch.advance();
        self.pool.release(id)
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.equal_range(q).count()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.locate(hash, q).is_some()
    }

    /// Range starting at the first element whose key equals `q`, continuing
    /// through the rest of the table. Empty if there is no such element.
    pub fn find<Q>(&self, q: &Q) -> Range<'_, P::Elem>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        Range::new(&self.pool, self.locate(hash, q).map(|(_, id)| id))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&P::Elem>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).front()
    }

    /// All elements whose key equals `q`.
    pub fn equal_range<Q>(&self, q: &Q) -> LocalRange<'_, P::Elem>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        match self.locate(hash, q) {
            Some((h, first)) => {
                let last = self.run_last(h, first, hash, q);
                LocalRange::new(&self.pool, Some(first), self.pool.node(last).next)
            }
            None => LocalRange::empty(&self.pool),
        }
    }

    /// Bucket `q` hashes to, or `None` while the table has no buckets.
    pub fn bucket<Q>(&self, q: &Q) -> Option<usize>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.index.bucket_count() == 0 {
            return None;
        }
        Some(self.index.bucket_of(self.make_hash(q)))
    }

    pub fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    pub fn bucket_size(&self, n: usize) -> usize {
        self.bucket_iter(n).count()
    }

    /// Elements of bucket `n`; empty for `n >= bucket_count()`.
    pub fn bucket_iter(&self, n: usize) -> LocalRange<'_, P::Elem> {
        if n >= self.index.bucket_count() {
            return LocalRange::empty(&self.pool);
        }
        let (begin, end) = self.index.slice(n);
        LocalRange::new(&self.pool, begin, end)
    }

    /// All elements in bucket order.
    pub fn iter(&self) -> Range<'_, P::Elem> {
        Range::new(&self.pool, self.index.first())
    }

    /// `len / bucket_count`, or `0.0` while the table has no buckets.
    pub fn load_factor(&self) -> f32 {
        match self.index.bucket_count() {
            0 => 0.0,
            n => self.len() as f32 / n as f32,
        }
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Changes the growth threshold. Takes effect at the next insert.
    pub fn set_max_load_factor(&mut self, lf: f32) -> TableResult<()> {
        config::check_load_factor(lf)?;
        self.max_load_factor = lf;
        Ok(())
    }

    /// Rebuilds the bucket index with at least `count` buckets, and never
    /// fewer than the current elements need. The count is rounded up to a
    /// power of two. On allocation failure the table is unchanged.
    pub fn rehash(&mut self, count: usize) -> TableResult<()> {
        let floor = config::buckets_for(self.len(), self.max_load_factor);
        let target = round_buckets(count.max(floor))?;
        let mut index = BucketIndex::with_buckets(target)?;

        // Relink in the old global order; equal keys stay adjacent because
        // they land in the same new bucket in the same relative order.
        let mut cur = self.index.first();
        while let Some(id) = cur {
            let node = self.pool.node_mut(id);
            cur = node.next;
            node.prev = None;
            node.next = None;
            let h = index.bucket_of(node.hash);
            index.link(&mut self.pool, h, id);
        }

        log::debug!(
            "rehash: {} -> {} buckets ({} live)",
            self.index.bucket_count(),
            target,
            self.len()
        );
        self.index = index;
        self.epoch.advance();
        Ok(())
    }

    /// Sizes the index for `count` elements.
    pub fn reserve(&mut self, count: usize) -> TableResult<()> {
        self.rehash(config::buckets_for(count, self.max_load_factor))
    }

    /// Like `reserve`, but never shrinks the index.
    pub fn reserve_at_least(&mut self, count: usize) -> TableResult<()> {
        let want = config::buckets_for(count, self.max_load_factor);
        if self.index.bucket_count() >= want {
            return Ok(());
        }
        self.rehash(want)
    }

    /// Grows the index if inserting `n` more elements would exceed the max
    /// load factor.
    fn rehash_ahead(&mut self, n: usize) -> TableResult<()> {
        let buckets = self.index.bucket_count();
        if buckets == 0 {
            return self.reserve(n);
        }
        let want = self
            .len()
            .checked_add(n)
            .ok_or(TableError::CapacityOverflow)?;
        if want as f64 / buckets as f64 > f64::from(self.max_load_factor) {
            let target = config::buckets_for(want, self.max_load_factor)
                .checked_mul(2)
                .ok_or(TableError::CapacityOverflow)?;
            self.rehash(target)?;
        }
        Ok(())
    }

    /// Drops every element and node chunk. The bucket count is kept.
    pub fn clear(&mut self) {
        log::trace!(
            "clear: {} elements, {} chunks",
            self.len(),
            self.pool.chunk_count()
        );
        self.index.reset();
        self.pool.clear();
        self.epoch.advance();
    }

    /// Visits the data of every element in global order.
    pub fn for_each_data_mut<F>(&mut self, mut f: F)
    where
        P: DataMut,
        F: FnMut(&P::Key, &mut P::Data),
    {
        let mut cur = self.index.first();
        while let Some(id) = cur {
            let node = self.pool.node_mut(id);
            cur = node.next;
            let (key, data) = P::split_mut(node.elem_mut());
            f(key, data);
        }
    }
}

/// Operations that only make sense with one element per key.
impl<P: Policy, S: BuildHasher> Hashtable<P, Unique, S> {
    pub fn at<Q>(&self, q: &Q) -> Option<&P::Data>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).map(P::data)
    }

    pub fn at_mut<Q>(&mut self, q: &Q) -> Option<&mut P::Data>
    where
        P: DataMut,
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let (_, id) = self.locate(hash, q)?;
        Some(P::data_mut(self.pool.node_mut(id).elem_mut()))
    }

    /// Data for `key`, inserting an element built from the key if missing.
    pub fn get_or_insert_default(&mut self, key: P::Key) -> TableResult<&mut P::Data>
    where
        P: FromKey + DataMut,
    {
        let hash = self.make_hash(&key);
        let id = match self.locate(hash, &key) {
            Some((_, id)) => id,
            None => self.emplace(P::from_key(key))?.0.node,
        };
        Ok(P::data_mut(self.pool.node_mut(id).elem_mut()))
    }
}

impl<P, M, S> Clone for Hashtable<P, M, S>
where
    P: Policy,
    P::Elem: Clone,
    M: Mode,
    S: BuildHasher + Clone,
{
    /// Copies elements in global order into an index of the same size, so
    /// the copy iterates in the same order as the source.
    fn clone(&self) -> Self {
        let mut out = Self::with_hasher(self.hasher.clone());
        out.max_load_factor = self.max_load_factor;
        out.index = error::or_panic(BucketIndex::with_buckets(self.index.bucket_count()));
        let mut cur = self.index.first();
        while let Some(id) = cur {
            let node = self.pool.node(id);
            let copy = error::or_panic(out.pool.request(node.hash, node.elem().clone()));
            let h = out.index.bucket_of(node.hash);
            out.index.link(&mut out.pool, h, copy);
            cur = node.next;
        }
        out
    }
}

impl<P, M, S> fmt::Debug for Hashtable<P, M, S>
where
    P: Policy,
    P::Elem: fmt::Debug,
    M: Mode,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<P: Policy, M: Mode, S: BuildHasher> Extend<P::Elem> for Hashtable<P, M, S> {
    fn extend<I: IntoIterator<Item = P::Elem>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if lower > 0 {
            error::or_panic(self.reserve_at_least(self.len().saturating_add(lower)));
        }
        for elem in iter {
            error::or_panic(self.emplace(elem));
        }
    }
}

impl<P: Policy, M: Mode, S: BuildHasher + Default> FromIterator<P::Elem> for Hashtable<P, M, S> {
    fn from_iter<I: IntoIterator<Item = P::Elem>>(iter: I) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<'a, P: Policy, M: Mode, S: BuildHasher> IntoIterator for &'a Hashtable<P, M, S> {
    type Item = &'a P::Elem;
    type IntoIter = Range<'a, P::Elem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<P: Policy, M: Mode, S: BuildHasher> Hashtable<P, M, S> {
    /// Element slot `h` of the bucket index points at.
    pub(crate) fn slot(&self, h: usize) -> Option<&P::Elem> {
        self.index.head(h).map(|id| self.pool.node(id).elem())
    }

    /// Checks every structural invariant of the table.
    pub(crate) fn assert_invariants(&self) {
        let buckets = self.bucket_count();
        if buckets == 0 {
            assert!(self.is_empty(), "elements stored without buckets");
            assert_eq!(self.index.first(), None);
            return;
        }
        assert!(buckets.is_power_of_two());
        assert_eq!(self.index.head(buckets), None, "sentinel slot must stay empty");

        let mut order: Vec<(NodeId, usize)> = Vec::with_capacity(self.len());
        let mut prev = None;
        let mut cur = self.index.first();
        while let Some(id) = cur {
            let node = self.pool.node(id);
            assert_eq!(node.prev, prev, "prev link must mirror next link");
            assert_eq!(
                node.hash,
                self.make_hash(P::key(node.elem())),
                "cached hash out of date"
            );
            order.push((id, self.index.bucket_of(node.hash)));
            assert!(order.len() <= self.len(), "global list longer than len");
            prev = Some(id);
            cur = node.next;
        }
        assert_eq!(order.len(), self.len(), "global list must reach every element");
        assert!(
            order.windows(2).all(|w| w[0].1 <= w[1].1),
            "global order must be non-decreasing by bucket"
        );

        for h in 0..=buckets {
            let first = order.iter().find(|(_, b)| *b >= h).map(|(id, _)| *id);
            assert_eq!(self.index.head(h), first, "slot {h} is not forward-filled");
        }

        let key = |i: usize| P::key(self.pool.node(order[i].0).elem());
        for i in 0..order.len() {
            let last = (i..order.len()).rev().find(|&j| key(j) == key(i)).unwrap_or(i);
            if M::MULTI {
                assert!(
                    (i..=last).all(|j| key(j) == key(i)),
                    "equal keys must be adjacent"
                );
            } else {
                assert_eq!(last, i, "unique table holds a duplicate key");
            }
        }
    }
}
