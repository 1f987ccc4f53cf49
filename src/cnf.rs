//! Partial-CNF values.
//!
//! A [`Cnf`] is a conjunction of clauses. Unit clauses are kept apart in a merged
//! [`LitVec`], so conjoining literals detects contradictions immediately; all
//! other clauses are merged literal vectors as well, so a clause never holds a
//! duplicate or a complementary pair.
//!
//! The two boolean constants have no clauses to speak of and are encoded in the
//! counters alone:
//!
//! | literals | clauses | value |
//! |---|---|---|
//! | 0 | 0 | `false` |
//! | 0 | > 0 | `true` |
//!
//! Clause buffers come from a [`ClausePool`] free list and go back to it when a
//! value is cleared or released. Operations taking `other` by value consume it and
//! may splice its clauses in place; the `_ref` variants copy.

use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use crate::litvec::LitVec;
use crate::types::Lit;

/// Free list of clause buffers.
#[derive(Debug, Default)]
pub struct ClausePool {
    free: Vec<LitVec>,
}

impl ClausePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers waiting for reuse.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn take(&mut self) -> LitVec {
        match self.free.pop() {
            Some(mut clause) => {
                clause.clear();
                clause
            }
            None => LitVec::new(),
        }
    }

    pub fn put(&mut self, clause: LitVec) {
        self.free.push(clause);
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Cnf {
    units: LitVec,
    clauses: Vec<LitVec>,
    lit_size: usize,
    clause_size: usize,
}

impl Default for Cnf {
    fn default() -> Self {
        Self::constant(true)
    }
}

impl Cnf {
    pub fn constant(value: bool) -> Self {
        Self {
            units: LitVec::new(),
            clauses: Vec::new(),
            lit_size: 0,
            clause_size: value as usize,
        }
    }

    /// The single unit clause `(lit)`.
    pub fn unit(lit: Lit) -> Self {
        let mut units = LitVec::new();
        units.set_unit(lit);
        Self {
            units,
            clauses: Vec::new(),
            lit_size: 1,
            clause_size: 1,
        }
    }

    pub fn is_false(&self) -> bool {
        self.lit_size == 0 && self.clause_size == 0
    }

    pub fn is_true(&self) -> bool {
        self.lit_size == 0 && self.clause_size > 0
    }

    pub fn is_const(&self) -> bool {
        self.lit_size == 0
    }

    /// Total number of literal occurrences.
    pub fn lit_size(&self) -> usize {
        self.lit_size
    }

    /// Number of clauses (constants report 0 for `false` and 1 for `true`).
    pub fn clause_size(&self) -> usize {
        self.clause_size
    }

    pub fn units(&self) -> &LitVec {
        &self.units
    }

    /// Clauses with two or more literals.
    pub fn clauses(&self) -> &[LitVec] {
        &self.clauses
    }

    /// Every clause, unit clauses first.
    pub fn iter_clauses(&self) -> impl Iterator<Item = &[Lit]> + '_ {
        self.units
            .as_slice()
            .iter()
            .map(std::slice::from_ref)
            .chain(self.clauses.iter().map(|c| c.as_slice()))
    }

    /// The single literal of a one-literal value.
    pub fn as_single_lit(&self) -> Option<Lit> {
        if self.lit_size == 1 && self.units.len() == 1 {
            self.units.iter().next()
        } else {
            None
        }
    }

    /// Evaluate the value under the assignment `value`.
    pub fn eval(&self, value: impl Fn(Lit) -> bool) -> bool {
        if self.is_const() {
            return self.is_true();
        }
        self.iter_clauses().all(|clause| clause.iter().any(|&l| value(l)))
    }

    /// Become the constant `value`, returning clause buffers to `pool`.
    pub fn clear(&mut self, value: bool, pool: &mut ClausePool) {
        self.units.clear();
        for clause in self.clauses.drain(..) {
            pool.put(clause);
        }
        self.lit_size = 0;
        self.clause_size = value as usize;
    }

    /// Dispose of the value, returning clause buffers to `pool`.
    pub fn release(mut self, pool: &mut ClausePool) {
        self.clear(true, pool);
    }

    /// Deep copy through the pool.
    pub fn copy(&self, pool: &mut ClausePool) -> Cnf {
        let mut clauses = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            let mut c = pool.take();
            c.set_copy(clause);
            clauses.push(c);
        }
        Cnf {
            units: self.units.clone(),
            clauses,
            lit_size: self.lit_size,
            clause_size: self.clause_size,
        }
    }

    fn recount(&mut self) {
        self.lit_size = self.units.len() + self.clauses.iter().map(|c| c.len()).sum::<usize>();
        self.clause_size = self.units.len() + self.clauses.len();
        if self.clause_size == 0 {
            // Everything cancelled: an empty conjunction is `true`.
            self.lit_size = 0;
            self.clause_size = 1;
        }
    }

    /// Keep the clauses for which `f` returns `true`, in order.
    fn retain_clauses(&mut self, pool: &mut ClausePool, mut f: impl FnMut(&mut LitVec) -> bool) {
        let mut keep = 0;
        for i in 0..self.clauses.len() {
            if f(&mut self.clauses[i]) {
                self.clauses.swap(keep, i);
                keep += 1;
            }
        }
        for clause in self.clauses.drain(keep..) {
            pool.put(clause);
        }
    }

    /// Replace the contents of a constant with `other`.
    fn assign(&mut self, other: Cow<'_, Cnf>, pool: &mut ClausePool) {
        debug_assert!(self.is_const());
        *self = match other {
            Cow::Owned(cnf) => cnf,
            Cow::Borrowed(cnf) => cnf.copy(pool),
        };
    }

    /// `self = self & lit`.
    pub fn conjoin_lit(&mut self, lit: Lit, pool: &mut ClausePool) {
        if self.lit_size == 0 {
            if self.clause_size == 0 {
                return;
            }
            self.clause_size = 0;
        }

        self.lit_size -= self.units.len();
        self.clause_size -= self.units.len();
        if self.units.insert(lit) {
            self.lit_size += self.units.len();
            self.clause_size += self.units.len();
        } else {
            // Contradiction.
            self.clear(false, pool);
        }
    }

    /// `self = self & other`, consuming `other`.
    pub fn conjoin(&mut self, other: Cnf, pool: &mut ClausePool) {
        self.conjoin_impl(Cow::Owned(other), pool);
    }

    /// `self = self & other`, copying `other`.
    pub fn conjoin_ref(&mut self, other: &Cnf, pool: &mut ClausePool) {
        self.conjoin_impl(Cow::Borrowed(other), pool);
    }

    fn conjoin_impl(&mut self, other: Cow<'_, Cnf>, pool: &mut ClausePool) {
        if other.is_const() {
            if other.is_false() {
                self.clear(false, pool);
            }
            if let Cow::Owned(other) = other {
                other.release(pool);
            }
            return;
        }

        if self.is_const() {
            if self.is_true() {
                self.assign(other, pool);
            } else if let Cow::Owned(other) = other {
                other.release(pool);
            }
            return;
        }

        if !other.units.is_empty() {
            self.lit_size -= self.units.len();
            self.clause_size -= self.units.len();
            let mut scratch = pool.take();
            let ok = self.units.merge_with(other.units.as_slice(), &mut scratch);
            pool.put(scratch);
            if !ok {
                self.clear(false, pool);
                if let Cow::Owned(other) = other {
                    other.release(pool);
                }
                return;
            }
            self.lit_size += self.units.len();
            self.clause_size += self.units.len();
        }

        let other_units = other.units.len();
        self.lit_size += other.lit_size - other_units;
        self.clause_size += other.clause_size - other_units;
        match other {
            Cow::Owned(mut other) => {
                self.clauses.append(&mut other.clauses);
            }
            Cow::Borrowed(other) => {
                for clause in &other.clauses {
                    let mut c = pool.take();
                    c.set_copy(clause);
                    self.clauses.push(c);
                }
            }
        }
    }

    /// `self = self | lit`: the literal is added to every clause.
    pub fn disjoin_lit(&mut self, lit: Lit, pool: &mut ClausePool) {
        if self.is_const() {
            if self.is_false() {
                *self = Cnf::unit(lit);
            }
            return;
        }

        self.retain_clauses(pool, |clause| clause.insert(lit));

        let old_units = std::mem::take(&mut self.units);
        for u in old_units.iter() {
            if u == lit {
                self.units.set_unit(lit);
            } else if u != -lit {
                let mut c = pool.take();
                c.set_pair(u, lit);
                self.clauses.push(c);
            }
        }

        self.recount();
    }

    /// `self = self | other`, consuming `other`.
    pub fn disjoin(&mut self, other: Cnf, pool: &mut ClausePool) {
        self.disjoin_impl(Cow::Owned(other), pool);
    }

    /// `self = self | other`, copying `other`.
    pub fn disjoin_ref(&mut self, other: &Cnf, pool: &mut ClausePool) {
        self.disjoin_impl(Cow::Borrowed(other), pool);
    }

    fn disjoin_impl(&mut self, other: Cow<'_, Cnf>, pool: &mut ClausePool) {
        if other.is_const() {
            if other.is_true() {
                self.clear(true, pool);
            }
            if let Cow::Owned(other) = other {
                other.release(pool);
            }
            return;
        }

        if self.is_const() {
            if self.is_false() {
                self.assign(other, pool);
            } else if let Cow::Owned(other) = other {
                other.release(pool);
            }
            return;
        }

        self.cross_product_with(&other, pool);
        if let Cow::Owned(other) = other {
            other.release(pool);
        }
    }

    /// Replace `self` with the clause-wise cross product of `self` and `other`.
    ///
    /// Neither operand may be constant. The clauses of `self` are reused in place
    /// for the last pairing.
    fn cross_product_with(&mut self, other: &Cnf, pool: &mut ClausePool) {
        debug_assert!(!self.is_const() && !other.is_const());

        let mut old_clauses = std::mem::take(&mut self.clauses);
        let old_units = std::mem::take(&mut self.units);

        // The partner that old_clauses get merged with destructively at the end.
        let (last, rest_units, rest_clauses) = match other.units.as_slice().split_first() {
            Some((first, rest)) => (std::slice::from_ref(first), rest, other.clauses.as_slice()),
            None => {
                let (last, rest) = other
                    .clauses
                    .split_last()
                    .expect("non-constant value has a clause");
                (last.as_slice(), &[][..], rest)
            }
        };

        // 1. Old clauses with the other side's clauses and units, except `last`.
        let partners = rest_clauses
            .iter()
            .map(|c| c.as_slice())
            .chain(rest_units.iter().map(std::slice::from_ref));
        for partner in partners {
            for clause in &old_clauses {
                let mut c = pool.take();
                if c.set_union(clause.as_slice(), partner) {
                    self.clauses.push(c);
                } else {
                    pool.put(c);
                }
            }
        }

        // 2. Old clauses with `last`, in place.
        let mut scratch = pool.take();
        let mut keep = 0;
        for i in 0..old_clauses.len() {
            if old_clauses[i].merge_with(last, &mut scratch) {
                old_clauses.swap(keep, i);
                keep += 1;
            }
        }
        pool.put(scratch);
        for clause in old_clauses.drain(keep..) {
            pool.put(clause);
        }
        self.clauses.append(&mut old_clauses);

        // 3. Old units with the other side's clauses.
        for u in old_units.iter() {
            for clause in &other.clauses {
                let mut c = pool.take();
                if c.set_union(clause.as_slice(), &[u]) {
                    self.clauses.push(c);
                } else {
                    pool.put(c);
                }
            }
        }

        // 4. Old units with the other side's units.
        for u in old_units.iter() {
            for v in other.units.iter() {
                if u == v {
                    self.units.insert(u);
                } else if u != -v {
                    let mut c = pool.take();
                    c.set_pair(u, v);
                    self.clauses.push(c);
                }
            }
        }

        // 5. Nothing left means every clause was a tautology.
        self.recount();
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_const() {
            return write!(f, "{}", if self.is_true() { "true" } else { "false" });
        }
        for (i, clause) in self.iter_clauses().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "(")?;
            for (j, lit) in clause.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", lit)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}
