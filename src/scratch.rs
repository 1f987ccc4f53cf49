//! Per-node compilation scratch.
//!
//! Nodes themselves are immutable. Everything the compilation passes need to
//! remember about a node lives here instead, indexed by [`NodeId`] and split
//! by [`Polarity`].

use std::ops::Not;

use crate::cnf::Cnf;
use crate::reference::{NodeId, Ref};
use crate::types::Lit;

/// Which occurrence of a node: the node itself or its negation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Polarity {
    Pos,
    Neg,
}

impl Polarity {
    pub fn of(r: Ref) -> Self {
        if r.is_negated() {
            Polarity::Neg
        } else {
            Polarity::Pos
        }
    }

    pub fn is_neg(self) -> bool {
        self == Polarity::Neg
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Not for Polarity {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Polarity::Pos => Polarity::Neg,
            Polarity::Neg => Polarity::Pos,
        }
    }
}

/// What the passes have stored for one polarity of a node.
#[derive(Debug, Default)]
pub enum Annotation {
    #[default]
    Unset,
    /// AND/OR rewriting of an ITE or IFF node in this polarity.
    Expansion(Ref),
    /// Produced clauses, not yet consumed by every parent.
    Cnf(Cnf),
    /// Literal standing for the produced clauses.
    Proxy(Lit),
}

impl Annotation {
    pub fn expansion(&self) -> Option<Ref> {
        match *self {
            Annotation::Expansion(r) => Some(r),
            _ => None,
        }
    }

    pub fn proxy(&self) -> Option<Lit> {
        match *self {
            Annotation::Proxy(l) => Some(l),
            _ => None,
        }
    }

    pub fn cnf(&self) -> Option<&Cnf> {
        match self {
            Annotation::Cnf(cnf) => Some(cnf),
            _ => None,
        }
    }

    pub fn take(&mut self) -> Annotation {
        std::mem::take(self)
    }
}

#[derive(Debug, Default)]
pub struct Side {
    /// Visited by the counting pass.
    pub expanded: bool,
    /// Children pushed by the CNF pass.
    pub cnf_down: bool,
    /// Clauses produced by the CNF pass.
    pub cnf_up: bool,
    /// Share count, decremented as parents consume the produced value.
    pub count: u32,
    pub annotation: Annotation,
}

#[derive(Debug, Default)]
pub struct Scratch {
    sides: [Side; 2],
    /// A reference equivalent to the negation of this node (positive occurrence).
    pub semantic_negation: Option<Ref>,
    /// Always name the produced clauses with a proxy literal.
    pub var_forced: bool,
}

impl Scratch {
    pub fn side(&self, pol: Polarity) -> &Side {
        &self.sides[pol.index()]
    }

    pub fn side_mut(&mut self, pol: Polarity) -> &mut Side {
        &mut self.sides[pol.index()]
    }

    /// Forget everything but the user-set `var_forced` flag.
    pub fn reset(&mut self) {
        let var_forced = self.var_forced;
        *self = Scratch {
            var_forced,
            ..Scratch::default()
        };
    }
}

#[derive(Debug, Default)]
pub struct ScratchTable {
    entries: Vec<Scratch>,
}

impl ScratchTable {
    pub fn get(&self, id: NodeId) -> Option<&Scratch> {
        self.entries.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Scratch {
        let index = id.index();
        if index >= self.entries.len() {
            self.entries.resize_with(index + 1, Scratch::default);
        }
        &mut self.entries[index]
    }

    pub fn side(&self, id: NodeId, pol: Polarity) -> Option<&Side> {
        self.get(id).map(|s| s.side(pol))
    }

    pub fn side_mut(&mut self, id: NodeId, pol: Polarity) -> &mut Side {
        self.get_mut(id).side_mut(pol)
    }

    pub fn is_expanded(&self, id: NodeId, pol: Polarity) -> bool {
        self.side(id, pol).is_some_and(|s| s.expanded)
    }

    pub fn is_cnf_up(&self, id: NodeId, pol: Polarity) -> bool {
        self.side(id, pol).is_some_and(|s| s.cnf_up)
    }

    pub fn count(&self, id: NodeId, pol: Polarity) -> u32 {
        self.side(id, pol).map_or(0, |s| s.count)
    }

    pub fn expansion(&self, id: NodeId, pol: Polarity) -> Option<Ref> {
        self.side(id, pol).and_then(|s| s.annotation.expansion())
    }

    /// Proxy literal stored for `(id, pol)`, if its clauses were produced and named.
    pub fn proxy(&self, id: NodeId, pol: Polarity) -> Option<Lit> {
        self.side(id, pol)
            .filter(|s| s.cnf_up)
            .and_then(|s| s.annotation.proxy())
    }

    /// Drop a released node's entry.
    pub fn clear(&mut self, id: NodeId) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            *entry = Scratch::default();
        }
    }

    /// Reset every entry before a new compilation.
    pub fn reset_all(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.reset();
        }
    }
}
