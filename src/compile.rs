//! CNF production.
//!
//! After [`Dag::count_and_expand`], every needed `(node, polarity)` is turned
//! into a [`Cnf`] bottom-up. A positive AND occurrence conjoins the values of its
//! children; a negative one takes their disjunction (cross product). Values
//! consumed by more than one parent, and disjunction operands that would blow
//! up the cross product, get named by a proxy literal `l` instead: the clauses
//! of `l -> value` go to the solver right away and parents use `l` alone.

use std::cell::{Ref as CellRef, RefMut};
use std::time::Instant;

use log::{debug, info};

use crate::cnf::{ClausePool, Cnf};
use crate::dag::Dag;
use crate::reference::{NodeId, Ref, Target};
use crate::scratch::{Annotation, Polarity, ScratchTable};
use crate::solver::{Assignment, Solver};
use crate::table::Table;
use crate::types::Lit;

impl Dag {
    /// Compile `root` into clauses and stream them to `solver`.
    ///
    /// With `retractable`, the root is always named by a proxy literal, which is
    /// then asserted as a unit clause.
    ///
    /// Returns the literal asserted for the root, if the root's clauses were
    /// named by one.
    pub fn compile<S: Solver>(&self, root: Ref, retractable: bool, solver: &mut S) -> Option<Lit> {
        debug!("compile(root = {}, retractable = {})", root, retractable);
        self.scratch.borrow_mut().reset_all();

        let start = Instant::now();
        info!("Counting shares and pseudo-expanding...");
        self.count_and_expand(root);
        info!(
            "Counting shares and pseudo-expanding finished in {:.3} s",
            start.elapsed().as_secs_f64()
        );

        let start = Instant::now();
        info!("Generating CNF...");
        let lit = CnfPass::new(self, solver).run(root, retractable);
        info!(
            "Generating CNF finished in {:.3} s",
            start.elapsed().as_secs_f64()
        );
        lit
    }

    /// Always name the value of the node behind `r` by a proxy literal.
    ///
    /// For ITE and IFF nodes the flag carries over to their expansions.
    pub fn force_proxy(&self, r: Ref) {
        if let Some(id) = r.node_id() {
            self.scratch.borrow_mut().get_mut(id).var_forced = true;
        }
    }

    /// Value of `r` under the solver's current model.
    ///
    /// Only meaningful after [`Dag::compile`] on a root containing `r`, and a
    /// call to [`Solver::solve`]. Nodes without produced clauses are `Unknown`.
    pub fn value_of<S: Solver>(&self, r: Ref, solver: &S) -> Assignment {
        let mut frames: Vec<Frame> = Vec::new();
        let mut answer = self.enter(r, solver, &mut frames);
        loop {
            if let Some(a) = answer {
                let Some(top) = frames.last() else {
                    return a;
                };
                if a != top.neutral() {
                    frames.pop();
                    continue;
                }
            }

            let Some(top) = frames.last_mut() else {
                return answer.unwrap_or(Assignment::Unknown);
            };
            if top.next == self.arity(top.id) {
                answer = Some(top.neutral());
                frames.pop();
                continue;
            }
            let child = self.child(top.id, top.next).negate_if(top.negated);
            top.next += 1;
            answer = self.enter(child, solver, &mut frames);
        }
    }

    /// Answer for a leaf, or `None` after pushing a frame for an inner node.
    fn enter<S: Solver>(&self, r: Ref, solver: &S, frames: &mut Vec<Frame>) -> Option<Assignment> {
        let scratch = self.scratch.borrow();
        let r = match r.node_id() {
            Some(id) if self.table.borrow().node(id).is_expandable() => {
                match scratch.expansion(id, Polarity::of(r)) {
                    Some(exp) => exp,
                    None => return Some(Assignment::Unknown),
                }
            }
            _ => r,
        };
        match r.target() {
            Target::Const => Some(Assignment::from(r.is_true())),
            Target::Var(_) => Some(r.to_lit().map_or(Assignment::Unknown, |l| solver.value(l))),
            Target::Node(id) => {
                if !scratch.is_cnf_up(id, Polarity::of(r)) {
                    return Some(Assignment::Unknown);
                }
                frames.push(Frame {
                    id,
                    negated: r.is_negated(),
                    next: 0,
                });
                None
            }
        }
    }
}

/// Partially evaluated node occurrence in [`Dag::value_of`].
struct Frame {
    id: NodeId,
    negated: bool,
    next: usize,
}

impl Frame {
    /// Answer that does not decide the occurrence: `True` for a conjunction,
    /// `False` for a disjunction.
    fn neutral(&self) -> Assignment {
        Assignment::from(!self.negated)
    }
}

/// Child occurrence, resolved through expansions.
#[derive(Debug, Copy, Clone)]
enum Arg {
    Const(bool),
    Lit(Lit),
    Node(NodeId, Polarity),
}

struct CnfPass<'a, S: Solver> {
    table: CellRef<'a, Table>,
    scratch: RefMut<'a, ScratchTable>,
    pool: RefMut<'a, ClausePool>,
    solver: &'a mut S,
    clause_max: usize,
}

impl<'a, S: Solver> CnfPass<'a, S> {
    fn new(dag: &'a Dag, solver: &'a mut S) -> Self {
        Self {
            table: dag.table.borrow(),
            scratch: dag.scratch.borrow_mut(),
            pool: dag.pool.borrow_mut(),
            solver,
            clause_max: dag.clause_max(),
        }
    }

    /// The occurrence that carries the value of `r`.
    fn resolve(&self, r: Ref) -> Ref {
        match r.node_id() {
            Some(id) if self.table.node(id).is_expandable() => self
                .scratch
                .expansion(id, Polarity::of(r))
                .unwrap_or_else(|| panic!("{} was not expanded", r)),
            _ => r,
        }
    }

    fn arg(&self, r: Ref) -> Arg {
        let r = self.resolve(r);
        if let Some(l) = r.to_lit() {
            return Arg::Lit(l);
        }
        match r.target() {
            Target::Node(id) => Arg::Node(id, Polarity::of(r)),
            _ => Arg::Const(r.is_true()),
        }
    }

    fn run(mut self, root: Ref, retractable: bool) -> Option<Lit> {
        let root = self.resolve(root);
        let root_id = match root.target() {
            Target::Const => {
                if root.is_false() {
                    let l = self.solver.new_var();
                    self.solver.add_unit(l);
                    self.solver.add_unit(-l);
                }
                return None;
            }
            Target::Var(_) => {
                let l = root.to_lit()?;
                self.solver.add_unit(l);
                return Some(l);
            }
            Target::Node(id) => id,
        };

        let mut stack = vec![root];
        while let Some(&e) = stack.last() {
            let Some(id) = e.node_id() else {
                stack.pop();
                continue;
            };
            if self.table.node(id).is_expandable() {
                stack.pop();
                for pol in [Polarity::Pos, Polarity::Neg] {
                    if let Some(exp) = self.scratch.expansion(id, pol) {
                        if exp.is_node() {
                            stack.push(exp);
                        }
                    }
                }
                continue;
            }

            let need_pos = self.scratch.count(id, Polarity::Pos) > 0;
            let need_neg = self.scratch.count(id, Polarity::Neg) > 0;
            let done = |pol: Polarity, need: bool| !need || self.scratch.is_cnf_up(id, pol);
            let down = |pol: Polarity, need: bool| {
                !need || self.scratch.side(id, pol).is_some_and(|s| s.cnf_down)
            };

            if done(Polarity::Pos, need_pos) && done(Polarity::Neg, need_neg) {
                stack.pop();
            } else if !down(Polarity::Pos, need_pos) || !down(Polarity::Neg, need_neg) {
                if need_pos {
                    self.scratch.side_mut(id, Polarity::Pos).cnf_down = true;
                }
                if need_neg {
                    self.scratch.side_mut(id, Polarity::Neg).cnf_down = true;
                }
                for &child in self.table.node(id).children() {
                    if child.is_node() {
                        stack.push(child.negate_if(e.is_negated()));
                    }
                }
            } else {
                stack.pop();
                self.produce(e);
            }
        }

        let root_pol = Polarity::of(root);
        let annotation = self.scratch.side_mut(root_id, root_pol).annotation.take();
        let lit = match annotation {
            Annotation::Proxy(l) => {
                self.solver.add_unit(l);
                self.scratch.side_mut(root_id, root_pol).annotation = Annotation::Proxy(l);
                Some(l)
            }
            Annotation::Cnf(cnf) if retractable => {
                let l = self.intro_proxy(root_id, root_pol, cnf);
                self.solver.add_unit(l);
                Some(l)
            }
            Annotation::Cnf(cnf) => {
                self.solver.add_cnf(&cnf);
                cnf.release(&mut self.pool);
                None
            }
            other => panic!("Root {} has no clauses: {:?}", root, other),
        };
        let side = self.scratch.side_mut(root_id, root_pol);
        side.count = side.count.saturating_sub(1);
        lit
    }

    /// Produce the values of every needed polarity of `e`'s node.
    fn produce(&mut self, e: Ref) {
        let Some(id) = e.node_id() else { return };
        debug!("produce({})", e);

        let mut pos = if self.scratch.count(id, Polarity::Pos) > 0 {
            Some(self.conjunction(id))
        } else {
            None
        };
        let mut neg = if self.scratch.count(id, Polarity::Neg) > 0 {
            Some(self.disjunction(id))
        } else {
            None
        };

        share_constant(&mut pos, &mut neg, &mut self.pool);

        // Save the polarity it was discovered in first.
        if e.is_negated() {
            self.save(id, Polarity::Neg, neg);
            self.save(id, Polarity::Pos, pos);
        } else {
            self.save(id, Polarity::Pos, pos);
            self.save(id, Polarity::Neg, neg);
        }
    }

    fn save(&mut self, id: NodeId, pol: Polarity, cnf: Option<Cnf>) {
        self.scratch.side_mut(id, pol).cnf_up = true;
        let Some(cnf) = cnf else { return };

        let count = self.scratch.count(id, pol);
        let forced = self.scratch.get(id).is_some_and(|s| s.var_forced);
        if let Some(l) = cnf.as_single_lit() {
            cnf.release(&mut self.pool);
            self.scratch.side_mut(id, pol).annotation = Annotation::Proxy(l);
        } else if cnf.lit_size() != 0 && (count > 1 || forced) {
            self.intro_proxy(id, pol, cnf);
        } else {
            self.scratch.side_mut(id, pol).annotation = Annotation::Cnf(cnf);
        }
    }

    /// Name `cnf`, the value of `(id, pol)`, by a literal `l` and send the clauses
    /// of `l -> cnf` to the solver.
    ///
    /// Reuses the negation of a proxy already introduced for the opposite
    /// polarity, or for the semantic negation of this node.
    fn intro_proxy(&mut self, id: NodeId, pol: Polarity, cnf: Cnf) -> Lit {
        let l = self.reusable_proxy(id, pol).unwrap_or_else(|| self.solver.new_var());
        self.solver.add_implication(l, &cnf);
        debug!("intro_proxy: {} for {} of {} ({})", l, pol_sign(pol), id, cnf);
        cnf.release(&mut self.pool);
        self.scratch.side_mut(id, pol).annotation = Annotation::Proxy(l);
        l
    }

    fn reusable_proxy(&self, id: NodeId, pol: Polarity) -> Option<Lit> {
        if let Some(p) = self.scratch.proxy(id, !pol) {
            return Some(-p);
        }
        // `(id, pol)` is equivalent to `~t`.
        let t = self.scratch.get(id)?.semantic_negation?.negate_if(pol.is_neg());
        let t_id = t.node_id()?;
        let t_pol = Polarity::of(t);
        self.scratch
            .proxy(t_id, t_pol)
            .map(|p| -p)
            .or_else(|| self.scratch.proxy(t_id, !t_pol))
    }

    /// Resolve the children of `(id, pol)` and take out the largest value that
    /// can be consumed destructively.
    fn fill_args(&mut self, id: NodeId, pol: Polarity) -> (Option<(NodeId, Polarity, Cnf)>, Vec<Arg>) {
        let mut args: Vec<Arg> = self
            .table
            .node(id)
            .children()
            .iter()
            .map(|&c| self.arg(c.negate_if(pol.is_neg())))
            .collect();

        let mut best: Option<(usize, usize)> = None;
        for (i, arg) in args.iter().enumerate() {
            let Arg::Node(cid, cpol) = *arg else { continue };
            let Some(side) = self.scratch.side(cid, cpol) else { continue };
            if side.count != 1 {
                continue;
            }
            if let Some(cnf) = side.annotation.cnf() {
                if best.map_or(true, |(_, size)| cnf.lit_size() > size) {
                    best = Some((i, cnf.lit_size()));
                }
            }
        }

        let largest = best.and_then(|(i, _)| {
            let Arg::Node(cid, cpol) = args.remove(i) else {
                return None;
            };
            let side = self.scratch.side_mut(cid, cpol);
            side.count -= 1;
            match side.annotation.take() {
                Annotation::Cnf(cnf) => Some((cid, cpol, cnf)),
                _ => None,
            }
        });
        (largest, args)
    }

    /// Consume one use of `(id, pol)`. Returns `true` if that was the last one.
    fn consume(&mut self, id: NodeId, pol: Polarity) -> bool {
        let side = self.scratch.side_mut(id, pol);
        assert!(side.count > 0, "{} of {} consumed too often", pol_sign(pol), id);
        side.count -= 1;
        side.count == 0
    }

    fn take_cnf(&mut self, id: NodeId, pol: Polarity) -> Cnf {
        match self.scratch.side_mut(id, pol).annotation.take() {
            Annotation::Cnf(cnf) => cnf,
            other => panic!("{} of {} holds no clauses: {:?}", pol_sign(pol), id, other),
        }
    }

    fn conjunction(&mut self, id: NodeId) -> Cnf {
        let (largest, args) = self.fill_args(id, Polarity::Pos);
        let mut acc = largest.map_or_else(|| Cnf::constant(true), |(_, _, cnf)| cnf);

        for arg in args {
            match arg {
                Arg::Const(value) => acc.conjoin(Cnf::constant(value), &mut self.pool),
                Arg::Lit(l) => acc.conjoin_lit(l, &mut self.pool),
                Arg::Node(cid, cpol) => {
                    let destroy = self.consume(cid, cpol);
                    let annotation = self.scratch.side(cid, cpol).map(|s| &s.annotation);
                    match annotation {
                        Some(Annotation::Proxy(l)) => acc.conjoin_lit(*l, &mut self.pool),
                        Some(Annotation::Cnf(cnf)) if !destroy => acc.conjoin_ref(cnf, &mut self.pool),
                        Some(Annotation::Cnf(_)) => {
                            let cnf = self.take_cnf(cid, cpol);
                            acc.conjoin(cnf, &mut self.pool);
                        }
                        other => panic!("{} of {} holds no clauses: {:?}", pol_sign(cpol), cid, other),
                    }
                }
            }
        }
        acc
    }

    fn disjunction(&mut self, id: NodeId) -> Cnf {
        let (largest, args) = self.fill_args(id, Polarity::Neg);
        let mut acc = match largest {
            Some((lid, lpol, cnf)) if cnf.clause_size() > self.clause_max => {
                Cnf::unit(self.intro_proxy(lid, lpol, cnf))
            }
            Some((_, _, cnf)) => cnf,
            None => Cnf::constant(false),
        };

        for arg in args {
            match arg {
                Arg::Const(value) => acc.disjoin(Cnf::constant(value), &mut self.pool),
                Arg::Lit(l) => acc.disjoin_lit(l, &mut self.pool),
                Arg::Node(cid, cpol) => {
                    let destroy = self.consume(cid, cpol);
                    let annotation = self.scratch.side(cid, cpol).map(|s| &s.annotation);
                    let cnf = match annotation {
                        Some(Annotation::Proxy(l)) => {
                            acc.disjoin_lit(*l, &mut self.pool);
                            continue;
                        }
                        Some(Annotation::Cnf(cnf)) => cnf,
                        other => panic!("{} of {} holds no clauses: {:?}", pol_sign(cpol), cid, other),
                    };

                    if cnf.lit_size() != 0 && self.needs_proxy(&acc, cnf) {
                        let cnf = self.take_cnf(cid, cpol);
                        let l = self.intro_proxy(cid, cpol, cnf);
                        acc.disjoin_lit(l, &mut self.pool);
                    } else if destroy {
                        let cnf = self.take_cnf(cid, cpol);
                        acc.disjoin(cnf, &mut self.pool);
                    } else {
                        acc.disjoin_ref(cnf, &mut self.pool);
                    }
                }
            }
        }
        acc
    }

    /// Disjoining `arg` into `acc` directly would cost more than naming `arg`.
    fn needs_proxy(&self, acc: &Cnf, arg: &Cnf) -> bool {
        let a_l = acc.lit_size();
        let a_c = acc.clause_size();
        let e_l = arg.lit_size();
        let e_c = arg.clause_size();
        e_c > self.clause_max || e_l * a_c + a_l * e_c > e_l + a_c + a_l + a_c
    }
}

/// If `src` is constant, make `dest` its negation. Returns `true` on propagation.
fn propagate(dest: &mut Option<Cnf>, src: &Option<Cnf>, pool: &mut ClausePool) -> bool {
    let Some(src) = src else { return false };
    if !src.is_const() {
        return false;
    }
    let value = !src.is_true();
    match dest {
        Some(dest) => dest.clear(value, pool),
        None => *dest = Some(Cnf::constant(value)),
    }
    true
}

/// A constant on either side fixes the other side to its complement.
fn share_constant(pos: &mut Option<Cnf>, neg: &mut Option<Cnf>, pool: &mut ClausePool) {
    if !propagate(pos, neg, pool) {
        propagate(neg, pos, pool);
    }
}

fn pol_sign(pol: Polarity) -> &'static str {
    match pol {
        Polarity::Pos => "+",
        Polarity::Neg => "-",
    }
}
