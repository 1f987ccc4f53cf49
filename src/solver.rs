//! The solver collaborator.
//!
//! Compilation streams clauses into a [`Solver`]. Nothing in the compiler relies on
//! solving actually happening: [`NullSolver`] drops every clause, and
//! [`DimacsSolver`][crate::dimacs::DimacsSolver] only writes them out.

use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::cnf::Cnf;
use crate::types::Lit;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Answer {
    Sat,
    Unsat,
    Unknown,
}

impl Display for Answer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Answer::Sat => "SATISFIABLE",
            Answer::Unsat => "UNSATISFIABLE",
            Answer::Unknown => "UNKNOWN",
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Assignment {
    True,
    False,
    Unknown,
}

impl Assignment {
    pub fn negate_if(self, condition: bool) -> Self {
        if condition {
            -self
        } else {
            self
        }
    }
}

impl From<bool> for Assignment {
    fn from(value: bool) -> Self {
        if value {
            Assignment::True
        } else {
            Assignment::False
        }
    }
}

impl Neg for Assignment {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Assignment::True => Assignment::False,
            Assignment::False => Assignment::True,
            Assignment::Unknown => Assignment::Unknown,
        }
    }
}

pub trait Solver {
    /// Reserve the variables `1..=num_vars` for the caller. Must come before any
    /// call to [`Solver::new_var`].
    fn reserve(&mut self, num_vars: u32);

    /// Allocate a fresh variable and return its positive literal.
    fn new_var(&mut self) -> Lit;

    /// Map a reserved literal to the solver's own literal.
    fn resolve(&mut self, lit: Lit) -> Lit;

    fn add_clause(&mut self, lits: &[Lit]);

    fn add_unit(&mut self, lit: Lit) {
        self.add_clause(&[lit]);
    }

    /// Assert every clause of `cnf`.
    fn add_cnf(&mut self, cnf: &Cnf) {
        if cnf.is_false() {
            let l = self.new_var();
            self.add_unit(l);
            self.add_unit(-l);
            return;
        }
        for clause in cnf.iter_clauses() {
            self.add_clause(clause);
        }
    }

    /// Assert `lit -> cnf`.
    fn add_implication(&mut self, lit: Lit, cnf: &Cnf) {
        if cnf.is_false() {
            self.add_unit(-lit);
            return;
        }
        let mut buffer = Vec::new();
        for clause in cnf.iter_clauses() {
            buffer.clear();
            buffer.push(-lit);
            buffer.extend_from_slice(clause);
            self.add_clause(&buffer);
        }
    }

    fn solve(&mut self) -> Answer;

    /// Value of `lit` in the last model, if any.
    fn value(&self, lit: Lit) -> Assignment;
}

/// Variable bookkeeping shared by the solvers of this crate.
#[derive(Debug, Default, Clone)]
pub struct Variables {
    num_vars: u32,
    num_reserved: u32,
}

impl Variables {
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn num_reserved(&self) -> u32 {
        self.num_reserved
    }

    /// # Panics
    ///
    /// Panics if any variable was allocated before.
    pub fn reserve(&mut self, num_vars: u32) {
        assert_eq!(
            self.num_vars, 0,
            "Variables must be reserved before any variable is allocated"
        );
        self.num_vars = num_vars;
        self.num_reserved = num_vars;
    }

    pub fn new_var(&mut self) -> Lit {
        self.num_vars += 1;
        Lit::from_dimacs(self.num_vars as i32)
    }

    /// # Panics
    ///
    /// Panics if `lit` lies outside the reserved range.
    pub fn resolve(&self, lit: Lit) -> Lit {
        assert!(
            lit.var_key() <= self.num_reserved,
            "Literal {} lies outside the reserved range 1..={}",
            lit,
            self.num_reserved
        );
        lit
    }

    /// Account for variables mentioned in a clause that were never allocated.
    pub fn observe(&mut self, lits: &[Lit]) {
        if let Some(max) = lits.iter().map(|l| l.var_key()).max() {
            self.num_vars = self.num_vars.max(max);
        }
    }
}

/// Solver that drops every clause.
#[derive(Debug, Default)]
pub struct NullSolver {
    vars: Variables,
    num_clauses: usize,
}

impl NullSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_vars(&self) -> u32 {
        self.vars.num_vars()
    }

    /// Number of clauses received (and dropped).
    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }
}

impl Solver for NullSolver {
    fn reserve(&mut self, num_vars: u32) {
        self.vars.reserve(num_vars);
    }

    fn new_var(&mut self) -> Lit {
        self.vars.new_var()
    }

    fn resolve(&mut self, lit: Lit) -> Lit {
        self.vars.resolve(lit)
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        self.vars.observe(lits);
        self.num_clauses += 1;
    }

    fn solve(&mut self) -> Answer {
        Answer::Unknown
    }

    fn value(&self, _lit: Lit) -> Assignment {
        Assignment::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: i32) -> Lit {
        Lit::from_dimacs(v)
    }

    /// Records clauses verbatim.
    #[derive(Default)]
    struct Recorder {
        vars: Variables,
        clauses: Vec<Vec<i32>>,
    }

    impl Solver for Recorder {
        fn reserve(&mut self, num_vars: u32) {
            self.vars.reserve(num_vars);
        }
        fn new_var(&mut self) -> Lit {
            self.vars.new_var()
        }
        fn resolve(&mut self, lit: Lit) -> Lit {
            self.vars.resolve(lit)
        }
        fn add_clause(&mut self, lits: &[Lit]) {
            self.clauses.push(lits.iter().map(|l| l.to_dimacs()).collect());
        }
        fn solve(&mut self) -> Answer {
            Answer::Unknown
        }
        fn value(&self, _lit: Lit) -> Assignment {
            Assignment::Unknown
        }
    }

    #[test]
    fn test_assignment_negation() {
        assert_eq!(-Assignment::True, Assignment::False);
        assert_eq!(-Assignment::Unknown, Assignment::Unknown);
        assert_eq!(Assignment::from(true).negate_if(true), Assignment::False);
    }

    #[test]
    fn test_reserve_then_allocate() {
        let mut vars = Variables::default();
        vars.reserve(3);
        assert_eq!(vars.new_var(), lit(4));
        assert_eq!(vars.resolve(lit(-2)), lit(-2));
    }

    #[test]
    #[should_panic(expected = "must be reserved before")]
    fn test_reserve_after_allocate() {
        let mut vars = Variables::default();
        vars.new_var();
        vars.reserve(3);
    }

    #[test]
    #[should_panic(expected = "outside the reserved range")]
    fn test_resolve_out_of_range() {
        let mut vars = Variables::default();
        vars.reserve(2);
        vars.resolve(lit(3));
    }

    #[test]
    fn test_add_implication() {
        let mut pool = crate::cnf::ClausePool::new();
        let mut cnf = Cnf::unit(lit(2));
        cnf.conjoin_lit(lit(3), &mut pool);
        cnf.disjoin_lit(lit(4), &mut pool);

        let mut solver = Recorder::default();
        solver.add_implication(lit(1), &cnf);
        assert_eq!(solver.clauses, vec![vec![-1, 2, 4], vec![-1, 3, 4]]);

        let mut solver = Recorder::default();
        solver.add_implication(lit(1), &Cnf::constant(false));
        assert_eq!(solver.clauses, vec![vec![-1]]);

        let mut solver = Recorder::default();
        solver.add_implication(lit(1), &Cnf::constant(true));
        assert!(solver.clauses.is_empty());
    }

    #[test]
    fn test_add_false_cnf() {
        let mut solver = Recorder::default();
        solver.add_cnf(&Cnf::constant(false));
        assert_eq!(solver.clauses, vec![vec![1], vec![-1]]);
    }

    #[test]
    fn test_null_solver() {
        let mut solver = NullSolver::new();
        solver.reserve(2);
        let l = solver.new_var();
        solver.add_clause(&[l, lit(-1)]);
        assert_eq!(solver.num_vars(), 3);
        assert_eq!(solver.num_clauses(), 1);
        assert_eq!(solver.solve(), Answer::Unknown);
        assert_eq!(solver.value(l), Assignment::Unknown);
    }
}
