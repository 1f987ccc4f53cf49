use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Neg;

use crate::types::{Lit, Var};
use crate::utils::MyHash;

/// Index of a node inside the hash-consing table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// What a [`Ref`] points to, ignoring its sign.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Target {
    /// The boolean constant. Positive is `true`, negated is `false`.
    Const,
    /// An input variable (1-indexed).
    Var(u32),
    /// An operator node owned by the table.
    Node(NodeId),
}

/// Signed reference to a constant, a variable or a node.
///
/// References are plain values: they do not own the node they point to.
/// The absence of a reference is spelled `Option<Ref>`.
///
/// The total order on references follows the numeric value of [`Ref::raw`]. It is
/// used only for canonical sorting and has nothing to do with boolean values,
/// except that the constants always sort first, `true` before `false`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref {
    target: Target,
    negated: bool,
}

impl Ref {
    pub const TRUE: Ref = Ref {
        target: Target::Const,
        negated: false,
    };
    pub const FALSE: Ref = Ref {
        target: Target::Const,
        negated: true,
    };

    pub const fn constant(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// Positive reference to the variable `v`.
    ///
    /// # Panics
    ///
    /// Panics if `v == 0`.
    pub fn var(v: u32) -> Self {
        assert_ne!(v, 0, "Variable index must be >= 1");
        Self {
            target: Target::Var(v),
            negated: false,
        }
    }

    pub const fn node(id: NodeId) -> Self {
        Self {
            target: Target::Node(id),
            negated: false,
        }
    }

    /// Reference for a literal: the variable of `lit` with its sign.
    pub fn from_lit(lit: Lit) -> Self {
        Self::var(lit.var().id()).negate_if(lit.is_negative())
    }

    pub const fn target(self) -> Target {
        self.target
    }

    pub const fn is_negated(self) -> bool {
        self.negated
    }

    pub const fn is_positive(self) -> bool {
        !self.negated
    }

    pub const fn negate(self) -> Self {
        Self {
            target: self.target,
            negated: !self.negated,
        }
    }

    pub const fn negate_if(self, condition: bool) -> Self {
        if condition {
            self.negate()
        } else {
            self
        }
    }

    /// The same target with positive sign.
    pub const fn abs(self) -> Self {
        Self {
            target: self.target,
            negated: false,
        }
    }

    pub const fn is_const(self) -> bool {
        matches!(self.target, Target::Const)
    }

    pub const fn is_true(self) -> bool {
        self.is_const() && !self.negated
    }

    pub const fn is_false(self) -> bool {
        self.is_const() && self.negated
    }

    pub const fn is_var(self) -> bool {
        matches!(self.target, Target::Var(_))
    }

    pub const fn is_node(self) -> bool {
        matches!(self.target, Target::Node(_))
    }

    pub const fn node_id(self) -> Option<NodeId> {
        match self.target {
            Target::Node(id) => Some(id),
            _ => None,
        }
    }

    pub const fn var_index(self) -> Option<u32> {
        match self.target {
            Target::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Signed literal of a variable reference.
    pub fn to_lit(self) -> Option<Lit> {
        self.var_index().map(|v| Var::new(v).pos().negate_if(self.negated))
    }

    /// Both references point to the same target (sign ignored).
    pub fn same_node(self, other: Ref) -> bool {
        self.target == other.target
    }

    pub fn same_sign(self, other: Ref) -> bool {
        self.negated == other.negated
    }

    /// `self == ~other`.
    pub fn same_node_opp_sign(self, other: Ref) -> bool {
        self.same_node(other) && !self.same_sign(other)
    }

    /// Numeric handle value used for canonical ordering.
    ///
    /// Layout: bit 0 is the sign, bit 1 tags variables, the remaining bits hold
    /// the variable number or the node index shifted by one. Constants use 0 and 1.
    pub const fn raw(self) -> u64 {
        let body = match self.target {
            Target::Const => 0,
            Target::Var(v) => ((v as u64) << 2) | 2,
            Target::Node(id) => ((id.0 as u64) + 1) << 2,
        };
        body | self.negated as u64
    }
}

impl Ord for Ref {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw().cmp(&other.raw())
    }
}

impl PartialOrd for Ref {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        crate::utils::hash_u64(self.raw())
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.negated { "~" } else { "" };
        match self.target {
            Target::Const => write!(f, "{}", if self.negated { "0" } else { "1" }),
            Target::Var(v) => write!(f, "{}x{}", sign, v),
            Target::Node(id) => write!(f, "{}{}", sign, id),
        }
    }
}

impl Debug for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
