use super::clamp_bound;
use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// `total = terms[0] + ... + terms[n-1]`; bounds consistent.
#[derive(Debug)]
pub(crate) struct Sum {
    pub(crate) terms: Vec<VariableId>,
    pub(crate) total: VariableId,
}

impl Constraint for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.terms.clone();
        variables.push(self.total);
        variables
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bidirectional
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let sum_of_mins: i64 = self
            .terms
            .iter()
            .map(|&term| i64::from(context.min(term)))
            .sum();
        let sum_of_maxs: i64 = self
            .terms
            .iter()
            .map(|&term| i64::from(context.max(term)))
            .sum();

        context.set_min(self.total, clamp_bound(sum_of_mins))?;
        context.set_max(self.total, clamp_bound(sum_of_maxs))?;

        // Each term is the total minus the extreme contribution of the rest.
        for &term in &self.terms {
            let rest_min = sum_of_mins - i64::from(context.min(term));
            let rest_max = sum_of_maxs - i64::from(context.max(term));
            context.set_min(
                term,
                clamp_bound(i64::from(context.min(self.total)) - rest_max),
            )?;
            context.set_max(
                term,
                clamp_bound(i64::from(context.max(self.total)) - rest_min),
            )?;
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
