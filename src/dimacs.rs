//! DIMACS CNF output.
//!
//! The header `p cnf <vars> <clauses>` has to come first, but neither count is
//! known until compilation is over. [`DimacsSolver`] therefore buffers the
//! clause lines and writes everything in [`DimacsSolver::finish`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::solver::{Answer, Assignment, Solver, Variables};
use crate::types::Lit;

#[derive(Debug)]
pub struct DimacsSolver<W: Write> {
    writer: W,
    vars: Variables,
    body: String,
    num_clauses: usize,
}

impl DimacsSolver<BufWriter<File>> {
    /// Write to the file at `path`, truncating it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DimacsSolver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            vars: Variables::default(),
            body: String::new(),
            num_clauses: 0,
        }
    }

    pub fn num_vars(&self) -> u32 {
        self.vars.num_vars()
    }

    pub fn num_clauses(&self) -> usize {
        self.num_clauses
    }

    /// Write the header and the buffered clauses, and return the writer.
    pub fn finish(mut self) -> Result<W> {
        debug!(
            "finish: {} variables, {} clauses",
            self.vars.num_vars(),
            self.num_clauses
        );
        writeln!(self.writer, "p cnf {} {}", self.vars.num_vars(), self.num_clauses)?;
        self.writer.write_all(self.body.as_bytes())?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> Solver for DimacsSolver<W> {
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
        use std::fmt::Write as _;

        self.vars.observe(lits);
        for lit in lits {
            // Writing to a String cannot fail.
            let _ = write!(self.body, "{} ", lit);
        }
        self.body.push_str("0\n");
        self.num_clauses += 1;
    }

    fn solve(&mut self) -> Answer {
        Answer::Unknown
    }

    fn value(&self, _lit: Lit) -> Assignment {
        Assignment::Unknown
    }
}
