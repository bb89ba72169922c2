use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// `result` = number of terms equal to `value`.
#[derive(Debug)]
pub(crate) struct Count {
    pub(crate) terms: Vec<VariableId>,
    pub(crate) value: i32,
    pub(crate) result: VariableId,
}

impl Constraint for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.terms.clone();
        variables.push(self.result);
        variables
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        // Terms certainly counting `value`, and terms that still could.
        let certain = self
            .terms
            .iter()
            .filter(|&&t| context.is_bound(t) && context.min(t) == self.value)
            .count() as i32;
        let possible = self
            .terms
            .iter()
            .filter(|&&t| context.contains(t, self.value))
            .count() as i32;

        context.set_min(self.result, certain)?;
        context.set_max(self.result, possible)?;

        if context.max(self.result) == certain {
            // No further term may take the value.
            for &term in &self.terms {
                if context.contains(term, self.value) && !context.is_bound(term) {
                    context.remove_value(term, self.value)?;
                }
            }
        } else if context.min(self.result) == possible {
            // Every candidate term must take the value.
            for &term in &self.terms {
                if context.contains(term, self.value) {
                    context.set(term, self.value)?;
                }
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
