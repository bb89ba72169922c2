use super::order::DomainValues;
use crate::basic_types::EmptyDomain;
use crate::containers::HashSet;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// `result = array[index]` for a constant array; value consistent both ways.
#[derive(Debug)]
pub(crate) struct Element {
    pub(crate) index: VariableId,
    pub(crate) array: Vec<i32>,
    pub(crate) result: VariableId,
}

impl Constraint for Element {
    fn name(&self) -> &'static str {
        "element"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.index, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        context.set_min(self.index, 0)?;
        context.set_max(self.index, self.array.len() as i32 - 1)?;

        // An index is supported iff its array entry is still a possible
        // result; a result value iff some possible index maps to it.
        let dead_indices: Vec<i32> = DomainValues::of(context, self.index)
            .filter(|&i| !context.contains(self.result, self.array[i as usize]))
            .collect();
        for index in dead_indices {
            context.remove_value(self.index, index)?;
        }

        let supported: HashSet<i32> = DomainValues::of(context, self.index)
            .map(|i| self.array[i as usize])
            .collect();
        let dead_values: Vec<i32> = DomainValues::of(context, self.result)
            .filter(|value| !supported.contains(value))
            .collect();
        for value in dead_values {
            context.remove_value(self.result, value)?;
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
    fn index_domain_is_clipped_to_the_array() {
        let mut engine = TestEngine::default();
        let index = engine.new_variable(-5, 10);
        let result = engine.new_variable(-100, 100);

        let constraint = Element {
            index,
            array: vec![4, 7, 4],
            result,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(index).min(), 0);
        assert_eq!(engine.vars.domain(index).max(), 2);
        assert_eq!(engine.vars.domain(result).min(), 4);
        assert_eq!(engine.vars.domain(result).max(), 7);
    }

    #[test]
    fn result_prunes_the_index() {
        let mut engine = TestEngine::default();
        let index = engine.new_variable(0, 2);
        let result = engine.new_variable(5, 9);

        let constraint = Element {
            index,
            array: vec![4, 7, 4],
            result,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert!(engine.vars.domain(index).is_bound());
        assert_eq!(engine.vars.domain(index).min(), 1);
        assert_eq!(engine.vars.domain(result).min(), 7);
    }
}
