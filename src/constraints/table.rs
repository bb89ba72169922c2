use itertools::Itertools;

use super::order::DomainValues;
use crate::basic_types::EmptyDomain;
use crate::containers::HashSet;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// Positive table constraint: the variables must jointly equal one of the
/// rows. Value consistent through straightforward support counting.
#[derive(Debug)]
pub(crate) struct Table {
    pub(crate) variables: Vec<VariableId>,
    pub(crate) rows: Vec<Vec<i32>>,
}

impl Constraint for Table {
    fn name(&self) -> &'static str {
        "table"
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        // A row supports a value only while every one of its entries is
        // still present.
        let mut supported: Vec<HashSet<i32>> =
            self.variables.iter().map(|_| HashSet::default()).collect();
        for row in &self.rows {
            let alive = row
                .iter()
                .zip_eq(&self.variables)
                .all(|(&value, &variable)| context.contains(variable, value));
            if alive {
                for (column, &value) in row.iter().enumerate() {
                    let _ = supported[column].insert(value);
                }
            }
        }

        for (column, &variable) in self.variables.iter().enumerate() {
            let dead: Vec<i32> = DomainValues::of(context, variable)
                .filter(|value| !supported[column].contains(value))
                .collect();
            for value in dead {
                context.remove_value(variable, value)?;
            }
        }
        Ok(())
    }

    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        _variable: VariableId,
        _change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        self.initial_arc_cons(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::propagation::tests::TestEngine;

    #[test]
    fn unsupported_values_are_removed() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 5);
        let y = engine.new_variable(0, 5);

        let constraint = Table {
            variables: vec![x, y],
            rows: vec![vec![1, 2], vec![1, 4], vec![3, 0]],
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(x).size(), 2);
        assert!(engine.vars.domain(x).contains(1));
        assert!(engine.vars.domain(x).contains(3));
        assert_eq!(engine.vars.domain(y).size(), 3);
    }

    #[test]
    fn binding_a_column_selects_the_matching_rows() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 5);
        let y = engine.new_variable(0, 5);

        let constraint = Table {
            variables: vec![x, y],
            rows: vec![vec![1, 2], vec![1, 4], vec![3, 0]],
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        engine.context().set(x, 3).unwrap();
        engine.fixpoint(&constraint).unwrap();

        assert!(engine.vars.domain(y).is_bound());
        assert_eq!(engine.vars.domain(y).min(), 0);
    }

    #[test]
    fn no_live_row_is_inconsistent() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(4, 5);
        let y = engine.new_variable(0, 5);

        let constraint = Table {
            variables: vec![x, y],
            rows: vec![vec![1, 2], vec![3, 0]],
        };
        assert!(engine.post_and_fixpoint(&constraint).is_err());
    }
}
