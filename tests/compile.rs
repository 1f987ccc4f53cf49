use test_log::test;

use nicedag::dag::{Dag, DagConfig};
use nicedag::node::Op;
use nicedag::reference::Ref;
use nicedag::sat::MemorySolver;
use nicedag::solver::{Answer, Assignment, Solver};
use nicedag::types::Lit;

fn bit(m: u32, v: u32) -> bool {
    (m >> (v - 1)) & 1 == 1
}

/// Compile `root` once per input assignment, with the inputs fixed by unit
/// clauses, and compare satisfiability against `eval`.
fn assert_equivalent(dag: &Dag, root: Ref, num_inputs: u32, eval: impl Fn(u32) -> bool) {
    for m in 0..1u32 << num_inputs {
        let mut solver = MemorySolver::new();
        solver.reserve(num_inputs);
        dag.compile(root, false, &mut solver);
        for v in 1..=num_inputs {
            let lit = Lit::from_dimacs(v as i32);
            solver.add_unit(if bit(m, v) { lit } else { -lit });
        }
        let expected = if eval(m) { Answer::Sat } else { Answer::Unsat };
        assert_eq!(solver.solve(), expected, "assignment {:#b}", m);
    }
}

#[test]
fn test_round_trip() {
    let dag = Dag::default();
    let x: Vec<Ref> = (1..=4).map(|v| dag.mk_var(v)).collect();
    let root = dag.apply_and(dag.apply_or(x[0], x[1]), dag.apply_implies(x[2], x[3]));
    assert_equivalent(&dag, root, 4, |m| {
        (bit(m, 1) || bit(m, 2)) && (!bit(m, 3) || bit(m, 4))
    });
    assert_equivalent(&dag, -root, 4, |m| {
        !((bit(m, 1) || bit(m, 2)) && (!bit(m, 3) || bit(m, 4)))
    });
}

#[test]
fn test_model_values() {
    let dag = Dag::default();
    let x: Vec<Ref> = (1..=4).map(|v| dag.mk_var(v)).collect();
    let inner = dag.apply_ite(x[0], x[1], x[2]);
    let root = dag.apply_and_many([inner, dag.apply_or(-x[1], x[3]), -x[3]]);

    let mut solver = MemorySolver::new();
    solver.reserve(4);
    dag.compile(root, false, &mut solver);
    assert_eq!(solver.solve(), Answer::Sat);

    // x4 = 0 forces x2 = 0, so the ITE must take its else branch.
    assert_eq!(solver.value(Lit::from_dimacs(1)), Assignment::False);
    assert_eq!(solver.value(Lit::from_dimacs(3)), Assignment::True);
    assert_eq!(dag.value_of(root, &solver), Assignment::True);
    assert_eq!(dag.value_of(inner, &solver), Assignment::True);
    // Only the polarities that were compiled have a value.
    assert_eq!(dag.value_of(-inner, &solver), Assignment::Unknown);
}

#[test]
fn test_pattern_match() {
    let dag = Dag::default();
    let (c, t, f) = (dag.mk_var(1), dag.mk_var(2), dag.mk_var(3));
    let root = dag.apply_and(-dag.apply_and(c, -t), -dag.apply_and(-c, -f));
    assert_eq!(dag.op(root.node_id().unwrap()), Op::Ite);
    assert_eq!(root, dag.apply_ite(c, t, f));
    assert_eq!(dag.num_matches(), 1);
    assert_equivalent(&dag, root, 3, |m| if bit(m, 1) { bit(m, 2) } else { bit(m, 3) });

    let plain = Dag::new(DagConfig {
        matching: false,
        ..DagConfig::default()
    });
    let (c, t, f) = (plain.mk_var(1), plain.mk_var(2), plain.mk_var(3));
    let root = plain.apply_and(-plain.apply_and(c, -t), -plain.apply_and(-c, -f));
    assert_eq!(plain.op(root.node_id().unwrap()), Op::And);
    assert_equivalent(&plain, root, 3, |m| if bit(m, 1) { bit(m, 2) } else { bit(m, 3) });
}

#[test]
fn test_iff_match() {
    let dag = Dag::default();
    let (a, b) = (dag.mk_var(1), dag.mk_var(2));
    let root = dag.apply_and(-dag.apply_and(a, -b), -dag.apply_and(-a, b));
    assert_eq!(dag.op(root.node_id().unwrap()), Op::Iff);
    assert_eq!(root, dag.apply_iff(a, b));
}

#[test]
fn test_proxy_reuse_across_polarities() {
    let dag = Dag::default();
    let x: Vec<Ref> = (1..=6).map(|v| dag.mk_var(v)).collect();
    let e = dag.apply_iff(x[0], x[1]);
    let root = dag.apply_and_many([
        dag.apply_or(e, x[2]),
        dag.apply_or(e, x[3]),
        dag.apply_or(-e, x[4]),
        dag.apply_or(-e, x[5]),
    ]);

    let mut solver = MemorySolver::new();
    solver.reserve(6);
    dag.compile(root, false, &mut solver);
    // One auxiliary variable names `e` in both polarities.
    assert_eq!(solver.num_vars(), 7);

    assert_equivalent(&dag, root, 6, |m| {
        let e = bit(m, 1) == bit(m, 2);
        (e || bit(m, 3)) && (e || bit(m, 4)) && (!e || bit(m, 5)) && (!e || bit(m, 6))
    });
}

#[test]
fn test_compile_is_idempotent() {
    let dag = Dag::default();
    let x: Vec<Ref> = (1..=5).map(|v| dag.mk_var(v)).collect();
    let shared = dag.apply_ite(x[0], x[1], x[2]);
    let root = dag.apply_and(dag.apply_or(shared, x[3]), dag.apply_or(-shared, x[4]));

    let mut first = MemorySolver::new();
    first.reserve(5);
    dag.compile(root, false, &mut first);

    let mut second = MemorySolver::new();
    second.reserve(5);
    dag.compile(root, false, &mut second);

    assert_eq!(first.clauses(), second.clauses());
    assert_eq!(first.num_vars(), second.num_vars());
}

#[test]
fn test_retractable_root() {
    let dag = Dag::default();
    let x: Vec<Ref> = (1..=3).map(|v| dag.mk_var(v)).collect();
    let root = dag.apply_or(dag.apply_and(x[0], x[1]), x[2]);

    let mut solver = MemorySolver::new();
    solver.reserve(3);
    let lit = dag.compile(root, true, &mut solver).unwrap();
    assert_eq!(solver.clauses().last(), Some(&vec![lit]));

    // Without the unit, the proxy can be switched off and anything goes.
    let without_unit = &solver.clauses()[..solver.num_clauses() - 1];
    let mut relaxed = MemorySolver::new();
    for clause in without_unit {
        relaxed.add_clause(clause);
    }
    for v in 1..=3 {
        relaxed.add_unit(Lit::from_dimacs(-v));
    }
    assert_eq!(relaxed.solve(), Answer::Sat);
    assert_eq!(relaxed.value(lit), Assignment::False);
}

#[test]
fn test_unsatisfiable_root() {
    let dag = Dag::default();
    let x1 = dag.mk_var(1);
    let root = dag.apply_and(x1, -x1);
    assert_eq!(root, Ref::FALSE);

    let mut solver = MemorySolver::new();
    solver.reserve(1);
    dag.compile(root, false, &mut solver);
    assert_eq!(solver.solve(), Answer::Unsat);
}
