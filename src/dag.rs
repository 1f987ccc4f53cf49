//! The [`Dag`] manager and its construction layer.
//!
//! Every reference handed out by the manager is canonical: building the same
//! boolean structure twice yields the same [`Ref`], and simple algebraic
//! identities are folded before a node is ever allocated.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;

use log::debug;

use crate::cnf::ClausePool;
use crate::error::{Error, Result};
use crate::node::{Op, MAX_ARITY};
use crate::reference::{NodeId, Ref};
use crate::scratch::ScratchTable;
use crate::solver::Solver;
use crate::table::Table;
use crate::types::Lit;

#[derive(Debug, Clone)]
pub struct DagConfig {
    /// Number of nodes the table can hold before its first growth.
    pub initial_capacity: usize,
    /// Recover `ite` structure from pairs of negated binary conjunctions.
    pub matching: bool,
    /// Largest clause count an accumulated disjunction may reach before its
    /// value gets named by a proxy literal.
    pub clause_max: usize,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            matching: true,
            clause_max: 3,
        }
    }
}

pub struct Dag {
    pub(crate) table: RefCell<Table>,
    pub(crate) scratch: RefCell<ScratchTable>,
    pub(crate) pool: RefCell<ClausePool>,
    matching: Cell<bool>,
    clause_max: usize,
    num_matches: Cell<usize>,
}

impl Dag {
    pub fn new(config: DagConfig) -> Self {
        Self {
            table: RefCell::new(Table::new(config.initial_capacity)),
            scratch: RefCell::new(ScratchTable::default()),
            pool: RefCell::new(ClausePool::new()),
            matching: Cell::new(config.matching),
            clause_max: config.clause_max,
            num_matches: Cell::new(0),
        }
    }
}

impl Default for Dag {
    fn default() -> Self {
        Dag::new(DagConfig::default())
    }
}

impl Debug for Dag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("Dag")
            .field("capacity", &table.capacity())
            .field("size", &table.size())
            .field("real_size", &table.real_size())
            .field("matching", &self.matching.get())
            .field("num_matches", &self.num_matches.get())
            .finish()
    }
}

impl Dag {
    pub fn is_matching(&self) -> bool {
        self.matching.get()
    }

    /// Enable or disable the `ite` pattern matcher. Returns the previous setting.
    pub fn set_matching(&self, matching: bool) -> bool {
        self.matching.replace(matching)
    }

    pub fn clause_max(&self) -> usize {
        self.clause_max
    }

    /// Number of successful `ite` pattern matches so far.
    pub fn num_matches(&self) -> usize {
        self.num_matches.get()
    }

    /// Number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.table.borrow().real_size()
    }

    pub fn op(&self, id: NodeId) -> Op {
        self.table.borrow().node(id).op()
    }
    pub fn arity(&self, id: NodeId) -> usize {
        self.table.borrow().node(id).arity()
    }
    pub fn child(&self, id: NodeId, i: usize) -> Ref {
        self.table.borrow().node(id).child(i)
    }
    pub fn children(&self, id: NodeId) -> Vec<Ref> {
        self.table.borrow().node(id).children().to_vec()
    }

    /// Pre-size the table for about `num_nodes` nodes.
    pub fn predict_node_count(&self, num_nodes: usize) {
        debug!("predict_node_count(num_nodes = {})", num_nodes);
        self.table.borrow_mut().grow(num_nodes);
    }

    /// Drop the node behind `r` from the table.
    ///
    /// The caller guarantees that no other live node or reference still uses it.
    pub fn release(&self, r: Ref) -> bool {
        let released = self.table.borrow_mut().release(r);
        if released {
            if let Some(id) = r.node_id() {
                self.scratch.borrow_mut().clear(id);
            }
        }
        released
    }
}

// Variables
impl Dag {
    pub fn mk_var(&self, v: u32) -> Ref {
        Ref::var(v)
    }

    /// Allocate a fresh solver variable and return a reference to it.
    pub fn new_var<S: Solver>(&self, solver: &mut S) -> Ref {
        Ref::from_lit(solver.new_var())
    }

    /// Reference to the reserved literal `lit`, as named by the solver.
    pub fn reserved_var<S: Solver>(&self, solver: &mut S, lit: Lit) -> Ref {
        Ref::from_lit(solver.resolve(lit))
    }
}

// Construction
impl Dag {
    pub fn apply_not(&self, r: Ref) -> Ref {
        -r
    }

    pub fn apply_and(&self, a: Ref, b: Ref) -> Ref {
        debug!("apply_and(a = {}, b = {})", a, b);

        let (a, b) = if b < a { (b, a) } else { (a, b) };

        if a.is_const() {
            return if a.is_true() { b } else { Ref::FALSE };
        }
        if a.same_node(b) {
            debug!("and(F,F) or and(F,~F)");
            return if a == b { a } else { Ref::FALSE };
        }
        if self.matching.get() {
            if let Some(r) = self.match_ite(a, b) {
                return r;
            }
        }
        self.table.borrow_mut().unify(Op::And, &[a, b])
    }

    /// Conjunction of any number of references.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_ARITY`] arguments are given.
    /// Use [`Dag::try_apply_and_many`] to handle that case.
    pub fn apply_and_many(&self, args: impl IntoIterator<Item = Ref>) -> Ref {
        match self.try_apply_and_many(args) {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_apply_and_many(&self, args: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        let mut args: Vec<Ref> = args.into_iter().collect();
        if args.len() > MAX_ARITY {
            return Err(Error::too_many_arguments(args.len()));
        }
        debug!("apply_and_many(args = {:?})", args);

        args.sort();
        let start = args.iter().take_while(|r| r.is_true()).count();
        let args = &args[start..];
        match args {
            [] => return Ok(Ref::TRUE),
            [single] => return Ok(*single),
            [first, ..] if first.is_false() => return Ok(Ref::FALSE),
            _ => {}
        }

        let mut unique: Vec<Ref> = Vec::with_capacity(args.len());
        for &r in args {
            match unique.last() {
                Some(&last) if last.same_node(r) => {
                    if last != r {
                        debug!("and_many: {} and {} cancel", last, r);
                        return Ok(Ref::FALSE);
                    }
                }
                _ => unique.push(r),
            }
        }

        match unique[..] {
            [single] => return Ok(single),
            [a, b] if self.matching.get() => {
                if let Some(r) = self.match_ite(a, b) {
                    return Ok(r);
                }
            }
            _ => {}
        }
        Ok(self.table.borrow_mut().unify(Op::And, &unique))
    }

    /// Recognize `~(p & x) & ~(~p & y)` as `~ite(p, x, y)`.
    fn match_ite(&self, a: Ref, b: Ref) -> Option<Ref> {
        let ac = self.binary_and_children(a)?;
        let bc = self.binary_and_children(b)?;

        self.num_matches.set(self.num_matches.get() + 1);
        for (i, j) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            if ac[i].same_node_opp_sign(bc[j]) {
                debug!(
                    "match_ite: {} & {} => ~ite({}, {}, {})",
                    a,
                    b,
                    ac[i],
                    ac[1 - i],
                    bc[1 - j]
                );
                return Some(-self.apply_ite(ac[i], ac[1 - i], bc[1 - j]));
            }
        }
        self.num_matches.set(self.num_matches.get() - 1);
        None
    }

    /// Children of `~AND(x, y)`, or `None` for any other shape.
    fn binary_and_children(&self, r: Ref) -> Option<[Ref; 2]> {
        if !r.is_negated() {
            return None;
        }
        let id = r.node_id()?;
        let table = self.table.borrow();
        let node = table.node(id);
        match (node.op(), node.children()) {
            (Op::And, &[x, y]) => Some([x, y]),
            _ => None,
        }
    }

    pub fn apply_or(&self, a: Ref, b: Ref) -> Ref {
        debug!("apply_or(a = {}, b = {})", a, b);
        -self.apply_and(-a, -b)
    }

    pub fn apply_or_many(&self, args: impl IntoIterator<Item = Ref>) -> Ref {
        -self.apply_and_many(args.into_iter().map(|r| -r))
    }

    pub fn try_apply_or_many(&self, args: impl IntoIterator<Item = Ref>) -> Result<Ref> {
        self.try_apply_and_many(args.into_iter().map(|r| -r))
            .map(|r| -r)
    }

    pub fn apply_implies(&self, lhs: Ref, rhs: Ref) -> Ref {
        debug!("apply_implies(lhs = {}, rhs = {})", lhs, rhs);
        -self.apply_and(lhs, -rhs)
    }

    pub fn apply_iff(&self, a: Ref, b: Ref) -> Ref {
        debug!("apply_iff(a = {}, b = {})", a, b);

        let negate = !a.same_sign(b);
        let (a, b) = (a.abs(), b.abs());
        if a == b {
            debug!("iff(F,F) => 1");
            return Ref::TRUE.negate_if(negate);
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let r = if lo.is_const() {
            debug!("iff(1,F) => F");
            hi
        } else {
            self.table.borrow_mut().unify(Op::Iff, &[lo, hi])
        };
        r.negate_if(negate)
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use nicedag::dag::Dag;
    ///
    /// let dag = Dag::default();
    /// let x = dag.mk_var(1);
    /// let y = dag.mk_var(2);
    /// assert_eq!(dag.apply_ite(x, y, -y), dag.apply_iff(x, y));
    /// assert_eq!(dag.apply_ite(x, y, y), y);
    /// ```
    pub fn apply_ite(&self, tst: Ref, tt: Ref, ff: Ref) -> Ref {
        debug!("apply_ite(tst = {}, tt = {}, ff = {})", tst, tt, ff);

        let (tst, tt, ff) = if tst.is_negated() {
            (-tst, ff, tt)
        } else {
            (tst, tt, ff)
        };
        let negate = tt.is_negated();
        let (tt, ff) = (tt.negate_if(negate), ff.negate_if(negate));

        let r = if tst.is_true() {
            debug!("ite(1,G,H) => G");
            tt
        } else if tt.is_true() || tst == tt {
            debug!("ite(F,1,H) => F | H");
            self.apply_or(tst, ff)
        } else if ff.is_true() || tst.same_node_opp_sign(ff) {
            debug!("ite(F,G,1) => F -> G");
            self.apply_implies(tst, tt)
        } else if ff.is_false() || tst == ff {
            debug!("ite(F,G,0) => F & G");
            self.apply_and(tst, tt)
        } else if tt == ff {
            debug!("ite(F,G,G) => G");
            tt
        } else if tt.same_node_opp_sign(ff) {
            debug!("ite(F,G,~G) => F <-> G");
            self.apply_iff(tst, tt)
        } else {
            self.table.borrow_mut().unify(Op::Ite, &[tst, tt, ff])
        };
        r.negate_if(negate)
    }
}
