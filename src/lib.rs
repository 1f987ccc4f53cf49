//! # nicedag: boolean DAGs to compact CNF
//!
//! **`nicedag`** builds boolean formulas as a hash-consed directed acyclic graph of
//! AND, ITE and IFF nodes and compiles them into conjunctive normal form for a SAT solver.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through the [`Dag`][crate::dag::Dag] manager.
//!   Structurally equal nodes are shared, and trivial formulas are folded while they are built.
//! - **Lightweight handles**: Formulas are signed [`Ref`][crate::reference::Ref] values.
//!   Negation is free and never allocates a node.
//! - **Pattern matching**: Conjunctions of two negated conjunctions that encode an if-then-else
//!   (or an equivalence) are recognised and stored as a single ITE (or IFF) node.
//! - **Compact CNF**: Each shared subformula is produced once, in the polarities in which it is used,
//!   and auxiliary (Tseitin) variables are only introduced where they make the CNF smaller.
//! - **1-Based Indexing**: Variables are 1-indexed, matching the DIMACS convention.
//!
//! ## Basic Usage
//!
//! ```rust
//! use nicedag::dag::Dag;
//! use nicedag::sat::MemorySolver;
//! use nicedag::solver::{Answer, Assignment, Solver};
//!
//! // 1. Initialize the manager and a solver
//! let dag = Dag::default();
//! let mut solver = MemorySolver::new();
//!
//! // 2. Create variables (1-indexed)
//! let x1 = dag.mk_var(1);
//! let x2 = dag.mk_var(2);
//! let x3 = dag.mk_var(3);
//!
//! // 3. Build a formula: f = (x1 OR x2) AND (x2 -> NOT x3) AND x3
//! let f = dag.apply_and_many([dag.apply_or(x1, x2), dag.apply_implies(x2, -x3), x3]);
//!
//! // 4. Send its clauses to the solver
//! dag.compile(f, false, &mut solver);
//!
//! // 5. Solve and read back the values of subformulas
//! assert_eq!(solver.solve(), Answer::Sat);
//! assert_eq!(dag.value_of(x1, &solver), Assignment::True);
//! assert_eq!(dag.value_of(f, &solver), Assignment::True);
//! ```
//!
//! ## Core Components
//!
//! - **[`dag`]**: The [`Dag`][crate::dag::Dag] manager and the construction layer.
//! - **[`expand`]** and **[`compile`]**: The two passes that turn a root into clauses.
//! - **[`cnf`]**: The partial-CNF values manipulated during compilation.
//! - **[`solver`]**: The [`Solver`][crate::solver::Solver] interface, with the [`sat`] and [`dimacs`] implementations.
//! - **[`named`]**: A [`NamedDag`][crate::named::NamedDag] that maps caller-chosen names to variables.
//! - **[`aiger`]**, **[`stats`]** and **[`dot`]**: Import, statistics and Graphviz export.

pub mod aiger;
pub mod cnf;
pub mod compile;
pub mod dag;
pub mod dimacs;
pub mod dot;
pub mod error;
pub mod expand;
pub mod litvec;
pub mod named;
pub mod node;
pub mod reference;
pub mod sat;
pub mod scratch;
pub mod solver;
pub mod stats;
pub mod table;
pub mod types;
pub mod utils;
