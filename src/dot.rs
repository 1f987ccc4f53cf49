//! DAG to DOT (Graphviz) conversion.
//!
//! # DOT Format
//!
//! - **Operator nodes** are boxes labelled with their operator (`AND`, `ITE`, `IFF`)
//! - **Variables** are circles, **constants** are squares, all at the bottom (sink rank)
//! - **Edges** point from a node to its children, in argument order:
//!   - Solid lines are positive references
//!   - Dotted lines with a hollow circle are negated references
//! - **Roots** are rectangles at the top (source rank)
//!
//! After [`Dag::count_and_expand`], the share counts of both polarities and the
//! expansions of ITE/IFF nodes can be drawn as well.
//!
//! # Examples
//!
//! ```
//! use nicedag::dag::Dag;
//!
//! let dag = Dag::default();
//! let f = dag.apply_ite(dag.mk_var(1), dag.mk_var(2), dag.mk_var(3));
//!
//! let dot = dag.to_dot(&[f]).unwrap();
//! assert!(dot.starts_with("digraph nicedag {"));
//! // Render with: dot -Tpng output.dot -o output.png
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::dag::Dag;
use crate::reference::{NodeId, Ref, Target};
use crate::scratch::Polarity;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for operator nodes (default: "box")
    pub node_shape: &'static str,
    /// Shape for variables (default: "circle")
    pub var_shape: &'static str,
    /// Shape for constants (default: "square")
    pub const_shape: &'static str,
    /// Shape for root nodes (default: "rect")
    pub root_shape: &'static str,
    /// Style for negated edges (default: "dotted")
    pub negated_edge_style: &'static str,
    /// Whether to use HTML labels for subscripts (default: true)
    pub use_html_labels: bool,
    /// Append the share counts `+pos/-neg` to node labels (default: false)
    pub show_counts: bool,
    /// Draw an edge from each ITE/IFF node to its expansions, green for the
    /// positive polarity and red for the negative one (default: false)
    pub show_expansions: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "box",
            var_shape: "circle",
            const_shape: "square",
            root_shape: "rect",
            negated_edge_style: "dotted",
            use_html_labels: true,
            show_counts: false,
            show_expansions: false,
        }
    }
}

impl Dag {
    /// Converts the graph below `roots` to DOT format.
    pub fn to_dot(&self, roots: &[Ref]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    /// Converts the graph below `roots` to DOT format with custom configuration.
    ///
    /// Shared nodes are drawn once. With `show_expansions`, the expansion
    /// nodes are included as well.
    pub fn to_dot_with_config(&self, roots: &[Ref], config: &DotConfig) -> Result<String, std::fmt::Error> {
        let (nodes, leaves) = self.reachable(roots, config.show_expansions);

        let mut dot = String::new();
        writeln!(dot, "digraph nicedag {{")?;
        writeln!(dot, "node [shape={}];", config.node_shape)?;

        let scratch = self.scratch.borrow();
        for &id in nodes.iter() {
            let mut label = self.op(id).name().to_string();
            if config.show_counts {
                let pos = scratch.count(id, Polarity::Pos);
                let neg = scratch.count(id, Polarity::Neg);
                write!(label, " +{}/-{}", pos, neg)?;
            }
            writeln!(dot, "n{} [label=\"{}\"];", id.get(), label)?;
        }

        writeln!(dot, "{{ rank=sink")?;
        for leaf in leaves.iter() {
            match leaf.target() {
                Target::Const => {
                    writeln!(dot, "c [shape={}, label=\"T\"];", config.const_shape)?;
                }
                Target::Var(v) => {
                    let label = if config.use_html_labels {
                        format!("<x<SUB>{}</SUB>>", v)
                    } else {
                        format!("\"x{}\"", v)
                    };
                    writeln!(dot, "v{} [shape={}, label={}];", v, config.var_shape, label)?;
                }
                Target::Node(_) => unreachable!(),
            }
        }
        writeln!(dot, "}}")?;

        for &id in nodes.iter() {
            for child in self.children(id) {
                write_edge(&mut dot, &format!("n{}", id.get()), child, config, None)?;
            }
            if config.show_expansions {
                for (pol, color) in [(Polarity::Pos, "green"), (Polarity::Neg, "red")] {
                    if let Some(exp) = scratch.expansion(id, pol) {
                        write_edge(&mut dot, &format!("n{}", id.get()), exp, config, Some(color))?;
                    }
                }
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape={}, label=\"{}\"];", i, config.root_shape, root)?;
        }
        writeln!(dot, "}}")?;
        for (i, &root) in roots.iter().enumerate() {
            write_edge(&mut dot, &format!("r{}", i), root, config, None)?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Node ids and leaves (constant and variables, positive) below `roots`.
    fn reachable(&self, roots: &[Ref], with_expansions: bool) -> (BTreeSet<NodeId>, BTreeSet<Ref>) {
        let mut nodes = BTreeSet::new();
        let mut leaves = BTreeSet::new();
        let mut stack: Vec<Ref> = roots.to_vec();
        while let Some(r) = stack.pop() {
            let Some(id) = r.node_id() else {
                leaves.insert(r.abs());
                continue;
            };
            if !nodes.insert(id) {
                continue;
            }
            stack.extend(self.children(id));
            if with_expansions {
                let scratch = self.scratch.borrow();
                for pol in [Polarity::Pos, Polarity::Neg] {
                    stack.extend(scratch.expansion(id, pol));
                }
            }
        }
        (nodes, leaves)
    }
}

fn write_edge(
    dot: &mut String,
    from: &str,
    to: Ref,
    config: &DotConfig,
    color: Option<&str>,
) -> Result<(), std::fmt::Error> {
    let target = match to.target() {
        Target::Const => "c".to_string(),
        Target::Var(v) => format!("v{}", v),
        Target::Node(id) => format!("n{}", id.get()),
    };
    let mut attrs = Vec::new();
    if to.is_negated() {
        attrs.push(format!("style={}", config.negated_edge_style));
        attrs.push("arrowhead=odot".to_string());
    }
    if let Some(color) = color {
        attrs.push(format!("color={}", color));
    }
    if attrs.is_empty() {
        writeln!(dot, "{} -> {};", from, target)
    } else {
        writeln!(dot, "{} -> {} [{}];", from, target, attrs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_to_dot_basic() {
        let dag = Dag::default();
        let f = dag.apply_and(dag.mk_var(1), -dag.mk_var(2));
        let id = f.node_id().unwrap().get();

        let dot = dag.to_dot(&[f]).unwrap();
        assert!(dot.starts_with("digraph nicedag {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains(&format!("n{} [label=\"AND\"];", id)));
        assert!(dot.contains(&format!("n{} -> v1;", id)));
        assert!(dot.contains(&format!("n{} -> v2 [style=dotted, arrowhead=odot];", id)));
        assert!(dot.contains(&format!("r0 -> n{};", id)));
    }

    #[test]
    fn test_shared_node_drawn_once() {
        let dag = Dag::default();
        let shared = dag.apply_and(dag.mk_var(1), dag.mk_var(2));
        let a = dag.apply_and(shared, dag.mk_var(3));
        let b = dag.apply_and(-shared, dag.mk_var(4));

        let dot = dag.to_dot(&[a, b]).unwrap();
        let decl = format!("n{} [label=", shared.node_id().unwrap().get());
        assert_eq!(dot.matches(&decl).count(), 1);
    }

    #[test]
    fn test_to_dot_constants() {
        let dag = Dag::default();
        let dot = dag.to_dot(&[Ref::TRUE, Ref::FALSE]).unwrap();
        assert!(dot.contains("c [shape=square, label=\"T\"];"));
        assert!(dot.contains("r0 -> c;"));
        assert!(dot.contains("r1 -> c [style=dotted, arrowhead=odot];"));
    }

    #[test]
    fn test_counts_and_expansions() {
        let dag = Dag::default();
        let e = dag.apply_ite(dag.mk_var(1), dag.mk_var(2), dag.mk_var(3));
        dag.count_and_expand(e);
        let config = DotConfig {
            show_counts: true,
            show_expansions: true,
            use_html_labels: false,
            ..DotConfig::default()
        };

        let dot = dag.to_dot_with_config(&[e], &config).unwrap();
        assert!(dot.contains("ITE +0/-0"));
        assert!(dot.contains("AND +1/-0"));
        assert!(dot.contains("color=green"));
        assert!(!dot.contains("color=red"));
        assert!(dot.contains("v1 [shape=circle, label=\"x1\"];"));
    }
}
