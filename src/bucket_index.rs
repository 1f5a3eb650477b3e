//! Bucket index: `bucket_count + 1` head slots over the global node list.
//!
//! Slot `h` holds the first node of bucket `h`. An empty bucket holds the
//! same value as the next non-empty bucket after it (or `None`), so
//! `[heads[h], heads[h + 1])` is always exactly the run of nodes in bucket
//! `h`. The last slot is a sentinel and stays `None`.
//!
//! Linking appends a node at the end of its bucket and then rewrites the
//! run of empty buckets directly below it that used to point past it.
//! Unlinking does the reverse. Both only touch slots that actually change.

use crate::error::TableResult;
use crate::node_pool::{NodeId, NodePool};

#[derive(Debug, Default)]
pub(crate) struct BucketIndex {
    heads: Box<[Option<NodeId>]>,
}

impl BucketIndex {
    /// Index with no buckets; every lookup misses.
    pub fn empty() -> Self {
        Self {
            heads: Box::new([]),
        }
    }

    /// Index with `buckets` empty buckets. `buckets` must be zero or a
    /// power of two.
    pub fn with_buckets(buckets: usize) -> TableResult<Self> {
        debug_assert!(buckets == 0 || buckets.is_power_of_two());
        if buckets == 0 {
            return Ok(Self::empty());
        }
        let mut heads = Vec::new();
        heads.try_reserve_exact(buckets + 1)?;
        heads.resize(buckets + 1, None);
        Ok(Self {
            heads: heads.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.heads.len().saturating_sub(1)
    }

    #[inline]
    pub fn bucket_of(&self, hash: u64) -> usize {
        debug_assert!(self.bucket_count() > 0);
        (hash as usize) & (self.bucket_count() - 1)
    }

    /// First node of the global order.
    #[inline]
    pub fn first(&self) -> Option<NodeId> {
        self.heads.first().copied().flatten()
    }

    /// Slot `h`; `h` may be the sentinel.
    #[inline]
    pub fn head(&self, h: usize) -> Option<NodeId> {
        self.heads[h]
    }

    /// Half-open node range of bucket `h`.
    #[inline]
    pub fn slice(&self, h: usize) -> (Option<NodeId>, Option<NodeId>) {
        (self.heads[h], self.heads[h + 1])
    }

    /// Forgets every node while keeping the bucket count.
    pub fn reset(&mut self) {
        self.heads.fill(None);
    }

    /// Appends `c` at the end of bucket `h`.
    pub fn link<E>(&mut self, pool: &mut NodePool<E>, h: usize, c: NodeId) {
        let head = self.heads[h + 1];
        pool.node_mut(c).next = head;
        match head {
            Some(next) => {
                let prev = pool.node(next).prev;
                pool.node_mut(c).prev = prev;
                pool.node_mut(next).prev = Some(c);
                if let Some(p) = prev {
                    pool.node_mut(p).next = Some(c);
                }
            }
            None => {
                // Every bucket after `h` is empty, so `c` becomes the new
                // global tail: find the last non-empty bucket up to `h` and
                // walk to its end.
                let prev = (0..=h)
                    .rev()
                    .find_map(|b| self.heads[b])
                    .map(|mut p| {
                        while let Some(n) = pool.node(p).next {
                            p = n;
                        }
                        p
                    });
                pool.node_mut(c).prev = prev;
                if let Some(p) = prev {
                    pool.node_mut(p).next = Some(c);
                }
            }
        }
        for b in (0..=h).rev() {
            if self.heads[b] != head {
                break;
            }
            self.heads[b] = Some(c);
        }
    }

    /// Links `c` directly after `a`, a linked node of the same bucket. Used
    /// to keep equal keys adjacent; `c` never becomes a bucket head, so no
    /// slot changes.
    pub fn link_after<E>(&mut self, pool: &mut NodePool<E>, a: NodeId, c: NodeId) {
        let next = pool.node(a).next;
        {
            let node = pool.node_mut(c);
            node.prev = Some(a);
            node.next = next;
        }
        pool.node_mut(a).next = Some(c);
        if let Some(n) = next {
            pool.node_mut(n).prev = Some(c);
        }
    }

    /// Removes `c`, which lives in bucket `h`, from the global order and
    /// the index. Returns the node that followed it.
    pub fn unlink<E>(&mut self, pool: &mut NodePool<E>, h: usize, c: NodeId) -> Option<NodeId> {
        let (prev, next) = {
            let node = pool.node(c);
            (node.prev, node.next)
        };
        for b in (0..=h).rev() {
            if self.heads[b] != Some(c) {
                break;
            }
            self.heads[b] = next;
        }
        if let Some(p) = prev {
            pool.node_mut(p).next = next;
        }
        if let Some(n) = next {
            pool.node_mut(n).prev = prev;
        }
        next
    }
}
