//! Share counting and pseudo-expansion.
//!
//! Before CNF production, every `(node, polarity)` reachable from the root gets
//! a share count: how many parents will consume the value produced for it. ITE
//! and IFF nodes are not turned into clauses directly. Instead, each polarity in
//! which such a node occurs is rewritten into an equivalent conjunction of
//! negated binary conjunctions (its *expansion*), and counts are carried by the
//! expansion.

use log::debug;

use crate::dag::Dag;
use crate::node::Op;
use crate::reference::{NodeId, Ref};
use crate::scratch::{Annotation, Polarity};

impl Dag {
    /// Run the counting pass from `root`.
    ///
    /// Scratch data of previous passes must have been reset.
    pub fn count_and_expand(&self, root: Ref) {
        debug!("count_and_expand(root = {})", root);

        let mut stack = Vec::new();
        if root.is_node() {
            stack.push(root);
        }

        while let Some(e) = stack.pop() {
            let Some(id) = e.node_id() else { continue };
            let pol = Polarity::of(e);
            let (op, children) = {
                let table = self.table.borrow();
                let node = table.node(id);
                (node.op(), node.children().to_vec())
            };

            {
                let mut scratch = self.scratch.borrow_mut();
                if scratch.is_expanded(id, pol) {
                    if op == Op::And {
                        scratch.side_mut(id, pol).count += 1;
                    } else if let Some(exp) = scratch.expansion(id, pol) {
                        if let Some(exp_id) = exp.node_id() {
                            scratch.side_mut(exp_id, Polarity::of(exp)).count += 1;
                        }
                    }
                    continue;
                }
                let side = scratch.side_mut(id, pol);
                side.expanded = true;
                side.count = if op == Op::And { 1 } else { 0 };
            }

            match op {
                Op::And => {
                    for child in children {
                        let child = child.negate_if(pol.is_neg());
                        if child.is_node() {
                            stack.push(child);
                        }
                    }
                }
                Op::Ite | Op::Iff => {
                    let exp = self.expansion(op, &children, pol);
                    debug!("count_and_expand: {} of {} => {}", pol_name(pol), id, exp);
                    self.annotate_expansion(id, pol, exp);
                    if exp.is_node() {
                        stack.push(exp);
                    }
                }
            }
        }
    }

    /// Conjunctive form of `op(children)` (negated for `Polarity::Neg`):
    ///
    /// ```text
    /// ite(c, t, f) = ~(c & ~t) & ~(~c & ~f)
    /// ```
    fn expansion(&self, op: Op, children: &[Ref], pol: Polarity) -> Ref {
        let tst = children[0];
        let tt = children[1];
        let ff = if op == Op::Iff { -tt } else { children[2] };
        let negate = !pol.is_neg();
        let tt = self.apply_and(tst, tt.negate_if(negate));
        let ff = self.apply_and(-tst, ff.negate_if(negate));

        let matching = self.set_matching(false);
        let exp = self.apply_and(-tt, -ff);
        self.set_matching(matching);
        exp
    }

    /// Store `exp` as the expansion of `(id, pol)` and link it with the
    /// expansion of the opposite polarity, if there is one.
    fn annotate_expansion(&self, id: NodeId, pol: Polarity, exp: Ref) {
        let mut scratch = self.scratch.borrow_mut();
        scratch.side_mut(id, pol).annotation = Annotation::Expansion(exp);

        let forced = scratch.get(id).is_some_and(|s| s.var_forced);
        if let (true, Some(exp_id)) = (forced, exp.node_id()) {
            scratch.get_mut(exp_id).var_forced = true;
        }

        let Some(other) = scratch.expansion(id, !pol) else {
            return;
        };
        // `exp` and `other` are equivalent to each other's negation.
        if let (Some(n1), Some(n2)) = (exp.node_id(), other.node_id()) {
            scratch.get_mut(n1).semantic_negation = Some(other.negate_if(exp.is_negated()));
            scratch.get_mut(n2).semantic_negation = Some(exp.negate_if(other.is_negated()));
        }
    }
}

fn pol_name(pol: Polarity) -> &'static str {
    match pol {
        Polarity::Pos => "positive",
        Polarity::Neg => "negative",
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_counts_shared_and() {
        let dag = Dag::default();
        let x1 = dag.mk_var(1);
        let x2 = dag.mk_var(2);
        let x3 = dag.mk_var(3);
        let x4 = dag.mk_var(4);
        let shared = dag.apply_and(x1, x2);
        let a = dag.apply_and(shared, x3);
        let b = dag.apply_and(shared, x4);
        let root = dag.apply_and(-a, -b);
        dag.count_and_expand(root);

        let id = shared.node_id().unwrap();
        let scratch = dag.scratch.borrow();
        assert_eq!(scratch.count(id, Polarity::Neg), 2);
        assert_eq!(scratch.count(id, Polarity::Pos), 0);
        assert_eq!(scratch.count(a.node_id().unwrap(), Polarity::Neg), 1);
        assert_eq!(scratch.count(root.node_id().unwrap(), Polarity::Pos), 1);
    }

    #[test]
    fn test_expands_ite_per_polarity() {
        let dag = Dag::default();
        let c = dag.mk_var(1);
        let t = dag.mk_var(2);
        let f = dag.mk_var(3);
        let e = dag.apply_ite(c, t, f);
        let x4 = dag.mk_var(4);
        // Keep the matcher from folding the root back into an IFF.
        dag.set_matching(false);
        let root = dag.apply_and(-dag.apply_and(e, x4), -dag.apply_and(-e, -x4));
        dag.count_and_expand(root);

        let id = e.node_id().unwrap();
        let scratch = dag.scratch.borrow();
        let pos = scratch.expansion(id, Polarity::Pos).unwrap();
        let neg = scratch.expansion(id, Polarity::Neg).unwrap();
        assert_ne!(pos, neg);
        assert_eq!(scratch.count(id, Polarity::Pos), 0);
        assert_eq!(scratch.count(pos.node_id().unwrap(), Polarity::of(pos)), 1);
        assert_eq!(scratch.count(neg.node_id().unwrap(), Polarity::of(neg)), 1);

        let pos_id = pos.node_id().unwrap();
        let neg_id = neg.node_id().unwrap();
        assert_eq!(scratch.get(pos_id).unwrap().semantic_negation, Some(neg));
        assert_eq!(scratch.get(neg_id).unwrap().semantic_negation, Some(pos));
    }

    #[test]
    fn test_expansion_shape() {
        let dag = Dag::default();
        let c = dag.mk_var(1);
        let t = dag.mk_var(2);
        let f = dag.mk_var(3);
        let e = dag.apply_ite(c, t, f);
        dag.count_and_expand(e);

        assert!(dag.is_matching());
        let exp = dag.scratch.borrow().expansion(e.node_id().unwrap(), Polarity::Pos);
        dag.set_matching(false);
        let expected = dag.apply_and(-dag.apply_and(c, -t), -dag.apply_and(-c, -f));
        assert_eq!(exp, Some(expected));
    }

    #[test]
    fn test_repeated_ite_counts_on_expansion() {
        let dag = Dag::default();
        let e = dag.apply_iff(dag.mk_var(1), dag.mk_var(2));
        let x3 = dag.mk_var(3);
        let x4 = dag.mk_var(4);
        let root = dag.apply_and_many([-dag.apply_and(e, x3), -dag.apply_and(e, x4)]);
        dag.count_and_expand(root);

        let scratch = dag.scratch.borrow();
        let exp = scratch.expansion(e.node_id().unwrap(), Polarity::Neg).unwrap();
        assert_eq!(scratch.count(exp.node_id().unwrap(), Polarity::of(exp)), 2);
        assert!(!scratch.is_expanded(e.node_id().unwrap(), Polarity::Pos));
    }

    #[test]
    fn test_trivial_roots() {
        let dag = Dag::default();
        dag.count_and_expand(Ref::TRUE);
        dag.count_and_expand(dag.mk_var(1));
        assert_eq!(dag.num_nodes(), 0);
    }
}
