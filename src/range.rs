//! Forward ranges over the global node list.
//!
//! Both ranges borrow the table, so they cannot outlive a structural
//! mutation. Cloning a range yields an independent cursor starting at the
//! same position.

use crate::node_pool::{NodeId, NodePool};
use core::fmt;
use core::iter::FusedIterator;

/// All elements of a table in global order.
pub struct Range<'a, E> {
    pool: &'a NodePool<E>,
    node: Option<NodeId>,
}

impl<'a, E> Range<'a, E> {
    pub(crate) fn new(pool: &'a NodePool<E>, node: Option<NodeId>) -> Self {
        Self { pool, node }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Element at the current position.
    #[inline]
    pub fn front(&self) -> Option<&'a E> {
        self.node.map(|id| self.pool.node(id).elem())
    }

    /// Advances by one element. Returns `false` if the range was empty.
    pub fn pop_front(&mut self) -> bool {
        match self.node {
            Some(id) => {
                self.node = self.pool.node(id).next;
                true
            }
            None => false,
        }
    }
}

impl<'a, E> Clone for Range<'a, E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            node: self.node,
        }
    }
}

impl<'a, E> Iterator for Range<'a, E> {
    type Item = &'a E;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pool.node(self.node?);
        self.node = node.next;
        Some(node.elem())
    }
}

impl<'a, E> FusedIterator for Range<'a, E> {}

impl<'a, E: fmt::Debug> fmt::Debug for Range<'a, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Elements of a half-open run of the global order: one bucket, or one
/// group of equal keys.
pub struct LocalRange<'a, E> {
    pool: &'a NodePool<E>,
    node: Option<NodeId>,
    end: Option<NodeId>,
}

impl<'a, E> LocalRange<'a, E> {
    pub(crate) fn new(pool: &'a NodePool<E>, node: Option<NodeId>, end: Option<NodeId>) -> Self {
        Self { pool, node, end }
    }

    pub(crate) fn empty(pool: &'a NodePool<E>) -> Self {
        Self::new(pool, None, None)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node == self.end
    }

    #[inline]
    pub fn front(&self) -> Option<&'a E> {
        if self.is_empty() {
            return None;
        }
        self.node.map(|id| self.pool.node(id).elem())
    }

    pub fn pop_front(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        match self.node {
            Some(id) => {
                self.node = self.pool.node(id).next;
                true
            }
            None => false,
        }
    }
}

impl<'a, E> Clone for LocalRange<'a, E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            node: self.node,
            end: self.end,
        }
    }
}

impl<'a, E> Iterator for LocalRange<'a, E> {
    type Item = &'a E;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }
        let node = self.pool.node(self.node?);
        self.node = node.next;
        Some(node.elem())
    }
}

impl<'a, E> FusedIterator for LocalRange<'a, E> {}

impl<'a, E: fmt::Debug> fmt::Debug for LocalRange<'a, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket_index::BucketIndex;

    fn table(values: &[(usize, u32)]) -> (NodePool<u32>, BucketIndex) {
        let mut pool = NodePool::new();
        let mut idx = BucketIndex::with_buckets(4).unwrap();
        for &(h, v) in values {
            let id = pool.request(h as u64, v).unwrap();
            idx.link(&mut pool, h, id);
        }
        (pool, idx)
    }

    #[test]
    fn range_walks_global_order() {
        let (pool, idx) = table(&[(3, 30), (0, 1), (1, 10), (0, 2)]);
        let r = Range::new(&pool, idx.first());
        assert_eq!(r.collect::<Vec<_>>(), vec![&1, &2, &10, &30]);
    }

    #[test]
    fn copies_restart_independently() {
        let (pool, idx) = table(&[(0, 1), (2, 2)]);
        let mut r = Range::new(&pool, idx.first());
        let saved = r.clone();
        assert!(r.pop_front());
        assert_eq!(r.front(), Some(&2));
        assert!(r.pop_front());
        assert!(r.is_empty());
        assert!(!r.pop_front());
        assert_eq!(saved.front(), Some(&1));
        assert_eq!(saved.count(), 2);
    }

    #[test]
    fn local_range_stops_at_bucket_end() {
        let (pool, idx) = table(&[(1, 10), (1, 11), (2, 20)]);
        let (b, e) = idx.slice(1);
        let local = LocalRange::new(&pool, b, e);
        assert_eq!(local.clone().collect::<Vec<_>>(), vec![&10, &11]);

        let (b, e) = idx.slice(0);
        let mut empty = LocalRange::new(&pool, b, e);
        assert!(empty.is_empty());
        assert_eq!(empty.front(), None);
        assert!(!empty.pop_front());
        assert_eq!(format!("{:?}", local), "[10, 11]");
    }
}
