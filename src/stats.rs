use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::dag::Dag;
use crate::node::Op;
use crate::reference::{NodeId, Ref};

/// Shape of the graph reachable from a root.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Stats {
    pub num_ite_nodes: usize,
    pub num_iff_nodes: usize,
    pub num_and_nodes: usize,
    /// Largest variable index mentioned.
    pub max_var: u32,
    /// Largest number of children of an AND node.
    pub max_and_arity: usize,
}

impl Stats {
    pub fn num_nodes(&self) -> usize {
        self.num_ite_nodes + self.num_iff_nodes + self.num_and_nodes
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "  {:<23}: {}", "# ITE Nodes", self.num_ite_nodes)?;
        writeln!(f, "  {:<23}: {}", "# IFF Nodes", self.num_iff_nodes)?;
        writeln!(f, "  {:<23}: {}", "# AND Nodes", self.num_and_nodes)?;
        writeln!(f, "  {:<23}: {}", "Max Atom #", self.max_var)?;
        write!(f, "  {:<23}: {}", "Max AND Out Degree", self.max_and_arity)
    }
}

impl Dag {
    /// Count the nodes reachable from `root`, each node once regardless of sign.
    pub fn stats(&self, root: Ref) -> Stats {
        let mut stats = Stats::default();
        if let Some(v) = root.var_index() {
            stats.max_var = v;
        }

        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = root.node_id().into_iter().collect();
        let table = self.table.borrow();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = table.node(id);
            match node.op() {
                Op::Ite => stats.num_ite_nodes += 1,
                Op::Iff => stats.num_iff_nodes += 1,
                Op::And => {
                    stats.num_and_nodes += 1;
                    stats.max_and_arity = stats.max_and_arity.max(node.arity());
                }
            }
            for &child in node.children() {
                if let Some(v) = child.var_index() {
                    stats.max_var = stats.max_var.max(v);
                } else if let Some(child_id) = child.node_id() {
                    if !visited.contains(&child_id) {
                        stack.push(child_id);
                    }
                }
            }
        }
        stats
    }
}
