use std::fmt::{Display, Formatter};

use crate::reference::Ref;
use crate::utils::{hash_combine, hash_u32, MyHash};

/// Largest number of children a single node may hold.
pub const MAX_ARITY: usize = u16::MAX as usize;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    /// Conjunction of two or more children.
    And,
    /// `ite(test, then, else)`, exactly three children.
    Ite,
    /// Equivalence of two children.
    Iff,
}

impl Op {
    fn tag(self) -> u32 {
        match self {
            Op::And => 0,
            Op::Ite => 1,
            Op::Iff => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::And => "AND",
            Op::Ite => "ITE",
            Op::Iff => "IFF",
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable operator node: the operator and its ordered children.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Node {
    op: Op,
    children: Box<[Ref]>,
}

impl Node {
    pub fn new(op: Op, children: impl Into<Box<[Ref]>>) -> Self {
        let children = children.into();
        debug_assert!(children.len() <= MAX_ARITY);
        debug_assert!(match op {
            Op::And => children.len() >= 2,
            Op::Ite => children.len() == 3,
            Op::Iff => children.len() == 2,
        });
        Self { op, children }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn children(&self) -> &[Ref] {
        &self.children
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, i: usize) -> Ref {
        self.children[i]
    }

    /// ITE and IFF nodes get pseudo-expanded before CNF production.
    pub fn is_expandable(&self) -> bool {
        matches!(self.op, Op::Ite | Op::Iff)
    }
}

/// Hash over the operator, the arity and each child's handle value.
pub fn shape_hash(op: Op, children: &[Ref]) -> u64 {
    let mut acc = hash_u32(op.tag());
    hash_combine(&mut acc, hash_u32(children.len() as u32));
    for &child in children {
        hash_combine(&mut acc, MyHash::hash(&child) as u32);
    }
    acc as u64
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        shape_hash(self.op, &self.children)
    }
}
