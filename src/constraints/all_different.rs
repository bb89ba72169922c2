use crate::basic_types::EmptyDomain;
use crate::containers::HashMap;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// All variables take pairwise distinct values.
///
/// Decomposition-strength propagation: a value is removed from the other
/// domains once some variable is bound to it. Two variables bound to the
/// same value fail through the removal emptying one of them.
#[derive(Debug)]
pub(crate) struct AllDifferent {
    pub(crate) variables: Vec<VariableId>,
}

impl Constraint for AllDifferent {
    fn name(&self) -> &'static str {
        "all_different"
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        for &variable in &self.variables {
            if context.is_bound(variable) {
                let value = context.min(variable);
                strike_value(context, &self.variables, variable, value)?;
            }
        }
        Ok(())
    }

    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        variable: VariableId,
        _change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        if context.is_bound(variable) {
            let value = context.min(variable);
            strike_value(context, &self.variables, variable, value)?;
        }
        Ok(())
    }
}

fn strike_value(
    context: &mut PropagationContext<'_>,
    variables: &[VariableId],
    except: VariableId,
    value: i32,
) -> Result<(), EmptyDomain> {
    for &other in variables {
        if other != except {
            context.remove_value(other, value)?;
        }
    }
    Ok(())
}

/// Every value is taken by at most `capacity` of the variables.
#[derive(Debug)]
pub(crate) struct AllDifferentCapacity {
    pub(crate) variables: Vec<VariableId>,
    pub(crate) capacity: usize,
}

impl Constraint for AllDifferentCapacity {
    fn name(&self) -> &'static str {
        "all_different_capacity"
    }

    fn variables(&self) -> Vec<VariableId> {
        self.variables.clone()
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let mut bound_occurrences: HashMap<i32, usize> = HashMap::default();
        for &variable in &self.variables {
            if context.is_bound(variable) {
                *bound_occurrences.entry(context.min(variable)).or_insert(0) += 1;
            }
        }

        for (&value, &occurrences) in &bound_occurrences {
            if occurrences > self.capacity {
                return Err(EmptyDomain);
            }
            if occurrences == self.capacity {
                for &variable in &self.variables {
                    if !context.is_bound(variable) {
                        context.remove_value(variable, value)?;
                    }
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
