//! Variables addressed by name.
//!
//! [`NamedDag`] is a [`Dag`] with a two-way map between caller-chosen names and
//! the solver variables allocated for them. It is meant for front ends that read
//! symbolic input, where the same name must always resolve to the same variable.
//! Variables allocated without a name (including the proxies of a compilation)
//! simply have no entry.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

use log::debug;

use crate::dag::{Dag, DagConfig};
use crate::reference::Ref;
use crate::solver::Solver;

pub struct NamedDag<N> {
    dag: Dag,
    /// Sparse: proxy variables leave gaps in the variable range.
    var_to_name: RefCell<HashMap<u32, N>>,
    name_to_var: RefCell<HashMap<N, Ref>>,
}

impl<N: Hash + Eq + Clone + Debug> NamedDag<N> {
    pub fn new(config: DagConfig) -> Self {
        Self {
            dag: Dag::new(config),
            var_to_name: RefCell::new(HashMap::new()),
            name_to_var: RefCell::new(HashMap::new()),
        }
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn into_dag(self) -> Dag {
        self.dag
    }

    pub fn num_named_vars(&self) -> usize {
        self.name_to_var.borrow().len()
    }

    /// Variable named `name`. The first request allocates it in `solver`,
    /// later ones return the same reference.
    pub fn mk_named_var<S: Solver>(&self, name: N, solver: &mut S) -> Ref {
        if let Some(&r) = self.name_to_var.borrow().get(&name) {
            return r;
        }
        let r = self.dag.new_var(solver);
        debug!("mk_named_var({:?}) => {}", name, r);
        if let Some(v) = r.var_index() {
            self.var_to_name.borrow_mut().insert(v, name.clone());
        }
        self.name_to_var.borrow_mut().insert(name, r);
        r
    }

    /// Name of the variable behind `r`, in either polarity.
    pub fn lookup_name(&self, r: Ref) -> Option<N> {
        let v = r.var_index()?;
        self.var_to_name.borrow().get(&v).cloned()
    }

    /// Pre-size the name maps for about `num_named_vars` names.
    pub fn predict_num_named_vars(&self, num_named_vars: usize) {
        debug!("predict_num_named_vars(num_named_vars = {})", num_named_vars);
        let mut var_to_name = self.var_to_name.borrow_mut();
        let additional = num_named_vars.saturating_sub(var_to_name.len());
        var_to_name.reserve(additional);
        self.name_to_var.borrow_mut().reserve(additional);
    }
}

impl<N: Hash + Eq + Clone + Debug> Default for NamedDag<N> {
    fn default() -> Self {
        NamedDag::new(DagConfig::default())
    }
}

impl<N> Deref for NamedDag<N> {
    type Target = Dag;

    fn deref(&self) -> &Dag {
        &self.dag
    }
}

impl<N> Debug for NamedDag<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedDag")
            .field("dag", &self.dag)
            .field("num_named_vars", &self.name_to_var.borrow().len())
            .finish()
    }
}
