//! Hash-consing table.
//!
//! Nodes live in a slab indexed by [`NodeId`]. A separate open-addressed index
//! keyed by the node shape guarantees that at most one live node exists for each
//! distinct `(op, children)` pair. The index capacity is always a prime from
//! [`BIG_PRIMES`][crate::utils::BIG_PRIMES] and collisions step through the increasing
//! step sequence `1, 3, 5, ...`, which together with a load factor below one
//! half always finds a free bucket.

use log::debug;

use crate::node::{shape_hash, Node, Op};
use crate::reference::{NodeId, Ref};
use crate::utils::next_prime;

/// Largest node count honored by [`Table::new`] and [`Table::grow`].
pub const MAX_PREDICTED_NODES: usize = 1 << 20;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Bucket {
    Empty,
    /// A released entry. Keeps lookup chains intact until the next rehash.
    Deleted,
    Full { hash: u64, id: NodeId },
}

pub struct Table {
    nodes: Vec<Option<Node>>,
    /// Index of the first *possibly* free slab cell.
    min_free: usize,
    /// Number of live nodes.
    real_size: usize,

    buckets: Vec<Bucket>,
    /// Live entries plus tombstones in `buckets`.
    used: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Table {
    /// Create a table able to hold about `num_nodes` nodes before growing.
    pub fn new(num_nodes: usize) -> Self {
        let capacity = next_prime((num_nodes.min(MAX_PREDICTED_NODES) + 2) << 1);
        Self {
            nodes: Vec::new(),
            min_free: 0,
            real_size: 0,
            buckets: vec![Bucket::Empty; capacity],
            used: 0,
        }
    }

    /// Capacity of the hash index.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Number of live nodes.
    pub fn real_size(&self) -> usize {
        self.real_size
    }

    /// One past the largest node index ever allocated.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    /// Get the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the node was released or never allocated.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("Node {} is not live", id),
        }
    }

    /// Make room for `num_nodes` live nodes without further growth.
    ///
    /// Predictions above [`MAX_PREDICTED_NODES`] are capped; the table still
    /// grows on demand past that.
    pub fn grow(&mut self, num_nodes: usize) {
        let need = (num_nodes.min(MAX_PREDICTED_NODES) + 2) << 1;
        if need < self.capacity() {
            return;
        }
        self.rehash(next_prime(need));
    }

    fn rehash(&mut self, new_capacity: usize) {
        debug!(
            "rehash: capacity {} -> {} ({} live nodes)",
            self.capacity(),
            new_capacity,
            self.real_size
        );
        let old = std::mem::replace(&mut self.buckets, vec![Bucket::Empty; new_capacity]);
        self.used = 0;
        for bucket in old {
            if let Bucket::Full { hash, id } = bucket {
                let mut index = (hash % new_capacity as u64) as usize;
                let mut step = 1;
                while self.buckets[index] != Bucket::Empty {
                    index = (index + step) % new_capacity;
                    step += 2;
                }
                self.buckets[index] = Bucket::Full { hash, id };
                self.used += 1;
            }
        }
    }

    /// Allocate a new slab cell for `node` and return its id.
    fn alloc(&mut self, node: Node) -> NodeId {
        let index = (self.min_free..self.nodes.len())
            .find(|&i| self.nodes[i].is_none())
            .unwrap_or_else(|| {
                self.nodes.push(None);
                self.nodes.len() - 1
            });
        assert!(index <= u32::MAX as usize, "Storage is full");

        self.nodes[index] = Some(node);
        self.min_free = index + 1;
        self.real_size += 1;
        NodeId::new(index as u32)
    }

    /// Find the bucket holding the node shaped `(op, children)`.
    ///
    /// Returns `Ok(bucket)` on a hit and `Err(bucket)` with the first reusable
    /// bucket on the search path otherwise.
    fn lookup(&self, hash: u64, op: Op, children: &[Ref]) -> Result<usize, usize> {
        let capacity = self.capacity();
        let mut index = (hash % capacity as u64) as usize;
        let mut step = 1;
        let mut first_deleted = None;
        loop {
            match self.buckets[index] {
                Bucket::Empty => return Err(first_deleted.unwrap_or(index)),
                Bucket::Deleted => {
                    first_deleted.get_or_insert(index);
                }
                Bucket::Full { hash: h, id } => {
                    if h == hash {
                        let node = self.node(id);
                        if node.op() == op && node.children() == children {
                            return Ok(index);
                        }
                    }
                }
            }
            index = (index + step) % capacity;
            step += 2;
        }
    }

    /// Return the unique node shaped `(op, children)`, creating it if needed.
    pub fn unify(&mut self, op: Op, children: &[Ref]) -> Ref {
        if (self.used + 1) * 2 >= self.capacity() {
            self.rehash(next_prime((self.real_size + 2) << 1));
        }

        let hash = shape_hash(op, children);
        match self.lookup(hash, op, children) {
            Ok(index) => match self.buckets[index] {
                Bucket::Full { id, .. } => Ref::node(id),
                _ => unreachable!(),
            },
            Err(index) => {
                let id = self.alloc(Node::new(op, children.to_vec()));
                if self.buckets[index] == Bucket::Empty {
                    self.used += 1;
                }
                self.buckets[index] = Bucket::Full { hash, id };
                debug!("unify: new {} node {} with children {:?}", op, id, children);
                Ref::node(id)
            }
        }
    }

    /// Remove the node pointed to by `r` from the table and free its slab cell.
    ///
    /// Returns `false` if `r` is not a live node.
    pub fn release(&mut self, r: Ref) -> bool {
        let Some(id) = r.node_id() else {
            return false;
        };
        if !self.is_live(id) {
            return false;
        }
        let node = self.node(id).clone();
        let hash = shape_hash(node.op(), node.children());
        if let Ok(index) = self.lookup(hash, node.op(), node.children()) {
            self.buckets[index] = Bucket::Deleted;
        }
        self.nodes[id.index()] = None;
        self.min_free = self.min_free.min(id.index());
        self.real_size -= 1;
        debug!("release: {}", id);
        true
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::utils::BIG_PRIMES;

    #[test]
    fn test_unify_is_unique() {
        let mut table = Table::default();
        let x1 = Ref::var(1);
        let x2 = Ref::var(2);
        let a = table.unify(Op::And, &[x1, x2]);
        let b = table.unify(Op::And, &[x1, x2]);
        assert_eq!(a, b);
        assert_eq!(table.real_size(), 1);

        let c = table.unify(Op::And, &[x1, -x2]);
        let d = table.unify(Op::Iff, &[x1, x2]);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_ne!(c, d);
        assert_eq!(table.real_size(), 3);
    }

    #[test]
    fn test_node_contents() {
        let mut table = Table::default();
        let x1 = Ref::var(1);
        let x2 = Ref::var(2);
        let x3 = Ref::var(3);
        let r = table.unify(Op::Ite, &[x1, -x2, x3]);
        let node = table.node(r.node_id().unwrap());
        assert_eq!(node.op(), Op::Ite);
        assert_eq!(node.children(), &[x1, -x2, x3]);
    }

    #[test]
    fn test_growth_keeps_entries() {
        let mut table = Table::default();
        let initial = table.capacity();
        let refs: Vec<Ref> = (1..=2000)
            .map(|i| table.unify(Op::And, &[Ref::var(i), Ref::var(i + 1)]))
            .collect();
        assert!(table.capacity() > initial);
        for (i, &r) in (1..=2000).zip(refs.iter()) {
            assert_eq!(table.unify(Op::And, &[Ref::var(i), Ref::var(i + 1)]), r);
        }
        assert_eq!(table.real_size(), 2000);
    }

    #[test]
    fn test_release() {
        let mut table = Table::default();
        let x1 = Ref::var(1);
        let x2 = Ref::var(2);
        let x3 = Ref::var(3);
        let a = table.unify(Op::And, &[x1, x2]);
        let b = table.unify(Op::And, &[x1, x3]);
        assert!(table.release(a));
        assert!(!table.release(a));
        assert!(!table.is_live(a.node_id().unwrap()));
        assert_eq!(table.real_size(), 1);

        // Entries behind the tombstone are still found.
        assert_eq!(table.unify(Op::And, &[x1, x3]), b);
        // The freed cell is reused.
        let c = table.unify(Op::And, &[x2, x3]);
        assert_eq!(c.node_id(), a.node_id());
    }

    #[test]
    fn test_grow_with_prediction() {
        let mut table = Table::default();
        table.grow(10_000);
        assert!(table.capacity() > 20_000);
        assert!(BIG_PRIMES.contains(&table.capacity()));
    }

    #[test]
    fn test_grow_caps_prediction() {
        let mut table = Table::default();
        table.grow(usize::MAX);
        let capped = table.capacity();
        assert!(capped > MAX_PREDICTED_NODES * 2);
        table.grow(MAX_PREDICTED_NODES * 4);
        assert_eq!(table.capacity(), capped);
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn test_dangling_node() {
        let table = Table::default();
        table.node(NodeId::new(7));
    }
}
