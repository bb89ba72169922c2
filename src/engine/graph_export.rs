//! Graphviz export of the variable/constraint bipartite graph.

use std::io;
use std::io::Write;

use itertools::Itertools;

use crate::engine::propagation::ConstraintStore;
use crate::engine::variable::VariableStore;

/// Writes the constraint network as an undirected graphviz graph: one
/// ellipse per variable, one box per constraint, an edge per attachment.
pub(crate) fn write_constraint_network(
    vars: &VariableStore,
    constraints: &ConstraintStore,
    writer: &mut dyn Write,
) -> io::Result<()> {
    writeln!(writer, "graph constraint_network {{")?;

    for variable in vars.ids() {
        let entry = vars.entry(variable);
        let domain = &entry.domain;
        let label = match &entry.name {
            Some(name) => format!("{name} [{}, {}]", domain.min(), domain.max()),
            None => format!("{variable} [{}, {}]", domain.min(), domain.max()),
        };
        writeln!(writer, "  {variable} [shape=ellipse, label=\"{label}\"];")?;
    }

    for (id, entry) in constraints.iter_enumerated() {
        writeln!(
            writer,
            "  {id} [shape=box, label=\"{}\"];",
            entry.constraint.name()
        )?;
        // One edge per distinct attached variable.
        for variable in entry.constraint.variables().into_iter().unique() {
            writeln!(writer, "  {id} -- {variable};")?;
        }
    }

    writeln!(writer, "}}")
}

#[cfg(test)]
mod tests {
    use crate::engine::ProblemManager;

    #[test]
    fn export_mentions_every_variable_and_constraint() {
        let mut manager = ProblemManager::new();
        let x = manager.new_variable_named(0, 3, "x").unwrap();
        let y = manager.new_variable(0, 3).unwrap();
        manager.less_than(x, y).unwrap();

        let mut output = Vec::new();
        manager.write_constraint_network(&mut output).unwrap();
        let text = String::from_utf8(output).unwrap();

        // Posting already tightened the bounds through the constraint.
        assert!(text.contains("x [0, 2]"));
        assert!(text.contains("less_than"));
        assert!(text.contains("c0 -- x0"));
        assert!(text.contains("c0 -- x1"));
    }
}
