//! In-process solver.
//!
//! [`MemorySolver`] hands every clause to a [`varisat`] CDCL solver and keeps a
//! copy of the clause log, so callers can inspect exactly what a compilation
//! produced. Clauses may be added between `solve` calls.

use std::fmt::{Debug, Formatter};

use log::debug;
use varisat::ExtendFormula;

use crate::solver::{Answer, Assignment, Solver, Variables};
use crate::types::Lit;

pub struct MemorySolver {
    sat: varisat::Solver<'static>,
    vars: Variables,
    clauses: Vec<Vec<Lit>>,
    model: Vec<Assignment>,
}

impl Debug for MemorySolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySolver")
            .field("num_vars", &self.vars.num_vars())
            .field("num_clauses", &self.clauses.len())
            .field("has_model", &!self.model.is_empty())
            .finish()
    }
}

impl Default for MemorySolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySolver {
    pub fn new() -> Self {
        Self {
            sat: varisat::Solver::new(),
            vars: Variables::default(),
            clauses: Vec::new(),
            model: Vec::new(),
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.vars.num_vars()
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    /// Literals of the last model, one per variable the solver has seen.
    pub fn model(&self) -> Vec<Lit> {
        (1..self.model.len())
            .filter_map(|v| {
                let lit = Lit::from_dimacs(v as i32);
                match self.model[v] {
                    Assignment::True => Some(lit),
                    Assignment::False => Some(-lit),
                    Assignment::Unknown => None,
                }
            })
            .collect()
    }
}

fn to_varisat(lit: Lit) -> varisat::Lit {
    varisat::Lit::from_dimacs(lit.to_dimacs() as isize)
}

impl Solver for MemorySolver {
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
        let clause: Vec<varisat::Lit> = lits.iter().map(|&l| to_varisat(l)).collect();
        self.sat.add_clause(&clause);
        self.clauses.push(lits.to_vec());
    }

    fn solve(&mut self) -> Answer {
        debug!(
            "solve: {} variables, {} clauses",
            self.vars.num_vars(),
            self.clauses.len()
        );
        self.model.clear();
        let answer = match self.sat.solve() {
            Ok(true) => {
                let mut model = vec![Assignment::Unknown; self.vars.num_vars() as usize + 1];
                for lit in self.sat.model().unwrap_or_default() {
                    let v = lit.var().index() + 1;
                    if v < model.len() {
                        model[v] = Assignment::from(lit.is_positive());
                    }
                }
                self.model = model;
                Answer::Sat
            }
            Ok(false) => Answer::Unsat,
            Err(e) => {
                debug!("solve: {}", e);
                Answer::Unknown
            }
        };
        debug!("solve: {}", answer);
        answer
    }

    fn value(&self, lit: Lit) -> Assignment {
        match self.model.get(lit.var_key() as usize) {
            Some(&value) => value.negate_if(lit.is_negative()),
            None => Assignment::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn add(solver: &mut MemorySolver, clause: &[i32]) {
        let lits: Vec<Lit> = clause.iter().map(|&l| Lit::from_dimacs(l)).collect();
        solver.add_clause(&lits);
    }

    fn satisfies(solver: &MemorySolver) -> bool {
        solver
            .clauses()
            .iter()
            .all(|c| c.iter().any(|&l| solver.value(l) == Assignment::True))
    }

    #[test]
    fn test_empty_is_sat() {
        let mut solver = MemorySolver::new();
        assert_eq!(solver.solve(), Answer::Sat);
    }

    #[test]
    fn test_simple_sat() {
        let mut solver = MemorySolver::new();
        add(&mut solver, &[1, 2]);
        add(&mut solver, &[-1, 3]);
        add(&mut solver, &[-2, -3]);
        add(&mut solver, &[-3]);
        assert_eq!(solver.solve(), Answer::Sat);
        assert!(satisfies(&solver));
        assert_eq!(solver.value(Lit::from_dimacs(2)), Assignment::True);
        assert_eq!(solver.value(Lit::from_dimacs(-1)), Assignment::True);
        assert_eq!(solver.model().len(), 3);
    }

    #[test]
    fn test_unit_conflict() {
        let mut solver = MemorySolver::new();
        add(&mut solver, &[1]);
        add(&mut solver, &[-1]);
        assert_eq!(solver.solve(), Answer::Unsat);
        assert_eq!(solver.value(Lit::from_dimacs(1)), Assignment::Unknown);
    }

    #[test]
    fn test_pigeonhole_unsat() {
        // Three pigeons, two holes: p(i, h) = 2 * i + h + 1.
        let mut solver = MemorySolver::new();
        let p = |i: i32, h: i32| 2 * i + h + 1;
        for i in 0..3 {
            add(&mut solver, &[p(i, 0), p(i, 1)]);
        }
        for h in 0..2 {
            for i in 0..3 {
                for j in (i + 1)..3 {
                    add(&mut solver, &[-p(i, h), -p(j, h)]);
                }
            }
        }
        assert_eq!(solver.solve(), Answer::Unsat);
    }

    #[test]
    fn test_forced_model() {
        let mut solver = MemorySolver::new();
        add(&mut solver, &[-1, 2]);
        add(&mut solver, &[-1, -2]);
        add(&mut solver, &[3, 4]);
        add(&mut solver, &[-3, 4]);
        assert_eq!(solver.solve(), Answer::Sat);
        assert!(satisfies(&solver));
        assert_eq!(solver.value(Lit::from_dimacs(1)), Assignment::False);
        assert_eq!(solver.value(Lit::from_dimacs(4)), Assignment::True);
    }

    #[test]
    fn test_variables_counted() {
        let mut solver = MemorySolver::new();
        solver.reserve(2);
        let l = solver.new_var();
        assert_eq!(l, Lit::from_dimacs(3));
        add(&mut solver, &[5]);
        assert_eq!(solver.num_vars(), 5);
        assert_eq!(solver.num_clauses(), 1);
    }

    #[test]
    fn test_incremental_solving() {
        let mut solver = MemorySolver::new();
        add(&mut solver, &[1, 2]);
        add(&mut solver, &[-1, 2]);
        assert_eq!(solver.solve(), Answer::Sat);
        assert_eq!(solver.value(Lit::from_dimacs(2)), Assignment::True);

        add(&mut solver, &[-2]);
        assert_eq!(solver.solve(), Answer::Unsat);
        assert!(solver.model().is_empty());
        assert_eq!(solver.value(Lit::from_dimacs(2)), Assignment::Unknown);
    }

    #[test]
    fn test_queens_4() {
        // x(r, c) = 4 * r + c + 1; two solutions exist.
        let mut solver = MemorySolver::new();
        let x = |r: i32, c: i32| 4 * r + c + 1;
        for r in 0..4 {
            add(&mut solver, &[x(r, 0), x(r, 1), x(r, 2), x(r, 3)]);
        }
        for r1 in 0..4i32 {
            for c1 in 0..4i32 {
                for r2 in 0..4 {
                    for c2 in 0..4 {
                        let same_col = c1 == c2;
                        let same_diag = (r1 - r2).abs() == (c1 - c2).abs();
                        let same_row = r1 == r2;
                        if x(r1, c1) < x(r2, c2) && (same_col || same_diag || same_row) {
                            add(&mut solver, &[-x(r1, c1), -x(r2, c2)]);
                        }
                    }
                }
            }
        }
        assert_eq!(solver.solve(), Answer::Sat);
        assert!(satisfies(&solver));
        assert_eq!(solver.model().iter().filter(|l| l.is_positive()).count(), 4);

        // A queen in a corner leaves no solution.
        add(&mut solver, &[x(0, 0)]);
        assert_eq!(solver.solve(), Answer::Unsat);
    }
}
