//! Type-safe wrappers for propositional variables and literals.
//!
//! Variables are 1-indexed, and literals use the signed DIMACS convention:
//! the magnitude names the variable, the sign its polarity. Zero is never a
//! valid literal.

use std::fmt;
use std::ops::Neg;

/// A propositional variable (1-indexed).
///
/// # Invariants
///
/// - Variable ids must be >= 1 (0 is reserved for the boolean constants)
/// - Variable ids fit into a positive `i32`, so they can always be turned into a [`Lit`]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0` or if `id` does not fit into a literal.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable ids must be >= 1");
        assert!(id <= i32::MAX as u32, "Variable id {} is too large", id);
        Var(id)
    }

    /// Returns the raw variable id.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit(self.0 as i32)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit(-(self.0 as i32))
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A signed literal in DIMACS convention.
///
/// Literals are ordered by their raw signed value. Clause-level code that needs
/// the "sorted by variable" order uses [`Lit::var_key`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit(i32);

impl Lit {
    /// Creates a literal from its DIMACS value.
    ///
    /// # Panics
    ///
    /// Panics if `value == 0`.
    pub fn from_dimacs(value: i32) -> Self {
        assert_ne!(value, 0, "Literal 0 is not a valid literal");
        Lit(value)
    }

    /// Returns the DIMACS value of the literal.
    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    pub fn var(self) -> Var {
        Var(self.0.unsigned_abs())
    }

    /// Key used to keep clauses sorted by variable.
    pub fn var_key(self) -> u32 {
        self.0.unsigned_abs()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn negate_if(self, condition: bool) -> Self {
        if condition {
            -self
        } else {
            self
        }
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Lit> for i32 {
    fn from(lit: Lit) -> Self {
        lit.0
    }
}
