//! Binary AIGER (`aig`) importer.
//!
//! Only combinational circuits are accepted. The layout is:
//!
//! ```text
//! aig M I L O A
//! <one output literal per line>
//! <A AND gates, each two LEB128-style deltas>
//! ```
//!
//! Input `i` (1-based) is AIGER literal `2i`, gate `k` has left-hand side
//! `2(I + k)`. Literal `0` is false, `1` is true and odd literals are negated.
//! The symbol table and comments after the gates are ignored.

use std::fs::File;
use std::io::{BufReader, Bytes, Read};
use std::path::Path;

use log::{debug, info};

use crate::dag::Dag;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::solver::Solver;
use crate::types::Lit;

/// Header counts of an AIGER file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Header {
    pub max_var: u64,
    pub num_inputs: u64,
    pub num_latches: u64,
    pub num_outputs: u64,
    pub num_ands: u64,
}

/// Imported circuit: the conjunction of all outputs.
#[derive(Debug, Copy, Clone)]
pub struct Aiger {
    pub header: Header,
    pub root: Ref,
}

impl Dag {
    /// Import the AIGER file at `path`.
    pub fn read_aiger_file<S: Solver>(&self, path: impl AsRef<Path>, solver: &mut S) -> Result<Aiger> {
        let file = File::open(path)?;
        self.read_aiger(BufReader::new(file), solver)
    }

    /// Import a binary AIGER circuit.
    ///
    /// The inputs are reserved in `solver`, so input `i` becomes variable `i`.
    pub fn read_aiger<R: Read, S: Solver>(&self, reader: R, solver: &mut S) -> Result<Aiger> {
        let mut input = Input::new(reader);
        let header = input.header()?;
        info!("read_aiger: {:?}", header);

        // The header checks keep inputs and gates within `i32::MAX`.
        let num_inputs = header.num_inputs;
        solver.reserve(num_inputs as u32);
        self.predict_node_count(preallocated(header.num_ands));

        let mut outputs = Vec::with_capacity(preallocated(header.num_outputs));
        for _ in 0..header.num_outputs {
            outputs.push(input.decimal(b'\n')?);
        }

        let mut gates = Vec::with_capacity(preallocated(header.num_ands));
        for index in (num_inputs + 1)..=header.max_var {
            let lhs = index << 1;
            let rhs0 = input.delta(lhs)?;
            let rhs1 = input.delta(rhs0)?;
            let a = self.aiger_literal(solver, num_inputs, &gates, rhs0, &input)?;
            let b = self.aiger_literal(solver, num_inputs, &gates, rhs1, &input)?;
            gates.push(self.apply_and(a, b));
        }

        let outputs = outputs
            .into_iter()
            .map(|o| self.aiger_literal(solver, num_inputs, &gates, o, &input))
            .collect::<Result<Vec<_>>>()?;
        let root = self.try_apply_and_many(outputs)?;
        debug!("read_aiger: root = {}", root);
        Ok(Aiger { header, root })
    }
}

/// Largest variable index a [`Lit`] can carry.
const MAX_VARIABLE: u64 = i32::MAX as u64;

/// Largest number of entries allocated up front from a header count.
const MAX_PREALLOCATED: u64 = 1 << 16;

fn preallocated(count: u64) -> usize {
    count.min(MAX_PREALLOCATED) as usize
}

impl Dag {
    /// Reference for AIGER literal `lit`. Inputs map to the reserved variables,
    /// gates to the nodes built so far.
    fn aiger_literal<S: Solver>(
        &self,
        solver: &mut S,
        num_inputs: u64,
        gates: &[Ref],
        lit: u64,
        input: &Input<impl Read>,
    ) -> Result<Ref> {
        let index = lit >> 1;
        let r = if index == 0 {
            Ref::FALSE
        } else if index <= num_inputs {
            self.reserved_var(solver, Lit::from_dimacs(index as i32))
        } else {
            match gates.get((index - num_inputs - 1) as usize) {
                Some(&r) => r,
                None => return Err(input.error(format!("literal {} is not defined yet", lit))),
            }
        };
        Ok(r.negate_if(lit & 1 == 1))
    }
}

struct Input<R: Read> {
    bytes: Bytes<R>,
    offset: u64,
}

impl<R: Read> Input<R> {
    fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
            offset: 0,
        }
    }

    fn error(&self, message: String) -> Error {
        Error::Parse {
            offset: self.offset,
            message,
        }
    }

    fn next(&mut self) -> Result<u8> {
        match self.bytes.next() {
            Some(byte) => {
                self.offset += 1;
                Ok(byte?)
            }
            None => Err(self.error("unexpected end of input".to_string())),
        }
    }

    fn header(&mut self) -> Result<Header> {
        for &expected in b"aig " {
            if self.next()? != expected {
                return Err(Error::InvalidHeader("expected `aig ` magic".to_string()));
            }
        }
        let header = Header {
            max_var: self.decimal(b' ')?,
            num_inputs: self.decimal(b' ')?,
            num_latches: self.decimal(b' ')?,
            num_outputs: self.decimal(b' ')?,
            num_ands: self.decimal(b'\n')?,
        };
        if header.num_latches != 0 {
            return Err(Error::UnsupportedLatches(header.num_latches));
        }
        let sum = header
            .num_inputs
            .checked_add(header.num_ands)
            .ok_or_else(|| self.error("header counts overflow".to_string()))?;
        if header.max_var != sum {
            return Err(Error::InconsistentHeader {
                max_var: header.max_var,
                sum,
            });
        }
        if header.max_var > MAX_VARIABLE {
            return Err(self.error(format!(
                "M = {} exceeds the largest variable {}",
                header.max_var, MAX_VARIABLE
            )));
        }
        Ok(header)
    }

    /// Unsigned decimal number terminated by `end`.
    fn decimal(&mut self, end: u8) -> Result<u64> {
        let mut value: u64 = 0;
        let mut digits = 0;
        loop {
            let byte = self.next()?;
            match byte {
                b'0'..=b'9' => {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u64::from(byte - b'0')))
                        .ok_or_else(|| self.error("number is too large".to_string()))?;
                    digits += 1;
                }
                _ if byte == end && digits > 0 => return Ok(value),
                _ => {
                    return Err(self.error(format!(
                        "unexpected {:?} while reading a number",
                        char::from(byte)
                    )))
                }
            }
        }
    }

    /// Variable-length number: seven bits per byte, low bits first.
    fn varint(&mut self) -> Result<u64> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.next()?;
            if shift >= 64 {
                return Err(self.error("delta is too large".to_string()));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// `base` minus the next delta, which must not exceed it.
    fn delta(&mut self, base: u64) -> Result<u64> {
        let delta = self.varint()?;
        base.checked_sub(delta)
            .ok_or_else(|| self.error(format!("delta {} exceeds literal {}", delta, base)))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::sat::MemorySolver;

    fn read(bytes: &[u8]) -> Result<(Dag, Aiger)> {
        let dag = Dag::default();
        let mut solver = MemorySolver::new();
        let aiger = dag.read_aiger(bytes, &mut solver)?;
        Ok((dag, aiger))
    }

    #[test]
    fn test_and_gate() {
        // Gate 6 = 2 & 4: deltas 6 - 4 = 2 and 4 - 2 = 2.
        let (dag, aiger) = read(b"aig 3 2 0 1 1\n6\n\x02\x02").unwrap();
        assert_eq!(aiger.header.num_inputs, 2);
        assert_eq!(aiger.root, dag.apply_and(dag.mk_var(1), dag.mk_var(2)));
    }

    #[test]
    fn test_negated_output_and_inputs() {
        // Gate 6 = ~2 & ~4 (literals 3 and 5), output ~6: an OR.
        let (dag, aiger) = read(b"aig 3 2 0 1 1\n7\n\x01\x02").unwrap();
        assert_eq!(aiger.root, dag.apply_or(dag.mk_var(1), dag.mk_var(2)));
    }

    #[test]
    fn test_constant_outputs() {
        let (_, aiger) = read(b"aig 0 0 0 1 0\n1\n").unwrap();
        assert_eq!(aiger.root, Ref::TRUE);
        let (_, aiger) = read(b"aig 1 1 0 2 0\n2\n0\n").unwrap();
        assert_eq!(aiger.root, Ref::FALSE);
    }

    #[test]
    fn test_multibyte_delta() {
        // 200 inputs, gate 402 = 400 & 2: deltas 2 and 398 = 0x8e 0x03.
        let mut bytes = b"aig 201 200 0 1 1\n402\n".to_vec();
        bytes.extend([0x02, 0x8e, 0x03]);
        let (dag, aiger) = read(&bytes).unwrap();
        assert_eq!(aiger.root, dag.apply_and(dag.mk_var(1), dag.mk_var(200)));
    }

    #[test]
    fn test_symbols_ignored() {
        let (dag, aiger) = read(b"aig 3 2 0 1 1\n6\n\x02\x02i0 a\ni1 b\nc\ncomment\n").unwrap();
        assert_eq!(aiger.root, dag.apply_and(dag.mk_var(1), dag.mk_var(2)));
    }

    #[test]
    fn test_rejects_latches() {
        let err = read(b"aig 3 1 1 1 1\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedLatches(1)));
    }

    #[test]
    fn test_rejects_inconsistent_header() {
        let err = read(b"aig 5 2 0 1 1\n").unwrap_err();
        assert!(matches!(err, Error::InconsistentHeader { max_var: 5, sum: 3 }));
    }

    #[test]
    fn test_rejects_ascii_format() {
        let err = read(b"aag 0 0 0 0 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_truncated() {
        let err = read(b"aig 3 2 0 1 1\n6\n\x02").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn test_bad_delta() {
        let err = read(b"aig 1 0 0 1 1\n2\n\x05\x00").unwrap_err();
        assert!(err.to_string().contains("delta 5 exceeds literal 2"));
    }

    #[test]
    fn test_rejects_overflowing_header() {
        let err = read(b"aig 5 18446744073709551615 0 0 7\n").unwrap_err();
        assert!(err.to_string().contains("header counts overflow"));
    }

    #[test]
    fn test_rejects_too_many_variables() {
        let err = read(b"aig 3000000000 0 0 0 3000000000\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("exceeds the largest variable"));
    }

    #[test]
    fn test_huge_counts_hit_end_of_input() {
        let err = read(b"aig 0 0 0 4611686018427387904 0\n").unwrap_err();
        assert!(err.to_string().contains("unexpected end of input"));

        let err = read(b"aig 1000000000 0 0 0 1000000000\n").unwrap_err();
        assert!(err.to_string().contains("unexpected end of input"));

        let err = read(b"aig 2000000000 2000000000 0 1 0\n").unwrap_err();
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn test_undefined_literal() {
        let err = read(b"aig 1 1 0 1 0\n4\n").unwrap_err();
        assert!(err.to_string().contains("literal 4 is not defined yet"));
    }

    #[test]
    fn test_reserves_inputs() {
        let dag = Dag::default();
        let mut solver = MemorySolver::new();
        dag.read_aiger(&b"aig 3 2 0 1 1\n6\n\x02\x02"[..], &mut solver).unwrap();
        assert_eq!(solver.new_var(), Lit::from_dimacs(3));
    }
}
