//! Merged literal sequences.
//!
//! A [`LitVec`] keeps its literals sorted by variable, with every variable
//! appearing at most once. Adding a literal that is already present is a no-op;
//! adding the complement of a present literal *cancels* the whole sequence,
//! leaving it empty. Read as a clause, a cancelled sequence is a tautology; read
//! as a set of unit clauses, it is a contradiction. The caller decides which.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use crate::types::Lit;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LitVec {
    lits: Vec<Lit>,
}

impl LitVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn as_slice(&self) -> &[Lit] {
        &self.lits
    }

    pub fn iter(&self) -> impl Iterator<Item = Lit> + '_ {
        self.lits.iter().copied()
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.position(lit).is_ok_and(|i| self.lits[i] == lit)
    }

    pub fn clear(&mut self) {
        self.lits.clear();
    }

    fn position(&self, lit: Lit) -> Result<usize, usize> {
        self.lits.binary_search_by_key(&lit.var_key(), |l| l.var_key())
    }

    /// Reset to the single literal `lit`.
    pub fn set_unit(&mut self, lit: Lit) {
        self.lits.clear();
        self.lits.push(lit);
    }

    /// Reset to the two literals `a` and `b` of distinct variables.
    pub fn set_pair(&mut self, a: Lit, b: Lit) {
        debug_assert_ne!(a.var(), b.var());
        self.lits.clear();
        if a.var_key() < b.var_key() {
            self.lits.extend([a, b]);
        } else {
            self.lits.extend([b, a]);
        }
    }

    /// Reset to a copy of `other`.
    pub fn set_copy(&mut self, other: &LitVec) {
        self.lits.clear();
        self.lits.extend_from_slice(&other.lits);
    }

    /// Add one literal. Returns `false` (and cancels) on a complementary pair.
    pub fn insert(&mut self, lit: Lit) -> bool {
        match self.position(lit) {
            Ok(i) => {
                if self.lits[i] == lit {
                    true
                } else {
                    self.lits.clear();
                    false
                }
            }
            Err(i) => {
                self.lits.insert(i, lit);
                true
            }
        }
    }

    /// Reset to the merge of `a` and `b`. Returns `false` (and cancels) on a
    /// complementary pair.
    pub fn set_union(&mut self, a: &[Lit], b: &[Lit]) -> bool {
        self.lits.clear();
        self.lits.reserve(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].var_key().cmp(&b[j].var_key()) {
                Ordering::Less => {
                    self.lits.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    self.lits.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    if a[i] != b[j] {
                        self.lits.clear();
                        return false;
                    }
                    self.lits.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        self.lits.extend_from_slice(&a[i..]);
        self.lits.extend_from_slice(&b[j..]);
        true
    }

    /// Merge `other` into `self`, using `scratch` as the output buffer.
    ///
    /// On return `scratch` holds the previous contents of `self` (cleared).
    pub fn merge_with(&mut self, other: &[Lit], scratch: &mut LitVec) -> bool {
        let ok = scratch.set_union(&self.lits, other);
        std::mem::swap(self, scratch);
        scratch.clear();
        if !ok {
            self.clear();
        }
        ok
    }
}

impl FromIterator<Lit> for LitVec {
    /// Collect literals, merging as they come. A complementary pair leaves the
    /// result empty.
    fn from_iter<I: IntoIterator<Item = Lit>>(iter: I) -> Self {
        let mut v = LitVec::new();
        for lit in iter {
            if !v.insert(lit) {
                break;
            }
        }
        v
    }
}

impl Display for LitVec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, lit) in self.lits.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", lit)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(values: &[i32]) -> Vec<Lit> {
        values.iter().map(|&v| Lit::from_dimacs(v)).collect()
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut v = LitVec::new();
        for l in lits(&[5, -2, 9, 1]) {
            assert!(v.insert(l));
        }
        assert_eq!(v.as_slice(), lits(&[1, -2, 5, 9]).as_slice());
        assert!(v.contains(Lit::from_dimacs(-2)));
        assert!(!v.contains(Lit::from_dimacs(2)));
    }

    #[test]
    fn test_insert_duplicate_and_complement() {
        let mut v: LitVec = lits(&[3, 4]).into_iter().collect();
        assert!(v.insert(Lit::from_dimacs(3)));
        assert_eq!(v.len(), 2);
        assert!(!v.insert(Lit::from_dimacs(-4)));
        assert!(v.is_empty());
    }

    #[test]
    fn test_union() {
        let mut v = LitVec::new();
        assert!(v.set_union(&lits(&[1, 4]), &lits(&[-2, 4, 7])));
        assert_eq!(v.as_slice(), lits(&[1, -2, 4, 7]).as_slice());
        assert!(!v.set_union(&lits(&[1, 4]), &lits(&[-1])));
        assert!(v.is_empty());
    }

    #[test]
    fn test_merge_with() {
        let mut v: LitVec = lits(&[2, 6]).into_iter().collect();
        let mut scratch = LitVec::new();
        assert!(v.merge_with(&lits(&[1, 6]), &mut scratch));
        assert_eq!(v.as_slice(), lits(&[1, 2, 6]).as_slice());
        assert!(scratch.is_empty());
        assert!(!v.merge_with(&lits(&[-2]), &mut scratch));
        assert!(v.is_empty());
    }

    #[test]
    fn test_set_pair_sorts() {
        let mut v = LitVec::new();
        v.set_pair(Lit::from_dimacs(8), Lit::from_dimacs(-3));
        assert_eq!(v.as_slice(), lits(&[-3, 8]).as_slice());
        assert_eq!(format!("{}", v), "(-3 8)");
    }
}
