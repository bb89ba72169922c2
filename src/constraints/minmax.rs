use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// Which extremum an [`Extremum`] constraint channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExtremumKind {
    Minimum,
    Maximum,
}

/// `result = min(terms)` or `result = max(terms)`; bounds consistent.
#[derive(Debug)]
pub(crate) struct Extremum {
    pub(crate) terms: Vec<VariableId>,
    pub(crate) result: VariableId,
    pub(crate) kind: ExtremumKind,
}

impl Constraint for Extremum {
    fn name(&self) -> &'static str {
        match self.kind {
            ExtremumKind::Minimum => "minimum",
            ExtremumKind::Maximum => "maximum",
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.terms.clone();
        variables.push(self.result);
        variables
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bounds
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        match self.kind {
            ExtremumKind::Minimum => {
                let low = self.terms.iter().map(|&t| context.min(t)).min().unwrap();
                let high = self.terms.iter().map(|&t| context.max(t)).min().unwrap();
                context.set_min(self.result, low)?;
                context.set_max(self.result, high)?;
                for &term in &self.terms {
                    context.set_min(term, context.min(self.result))?;
                }
            }
            ExtremumKind::Maximum => {
                let low = self.terms.iter().map(|&t| context.min(t)).max().unwrap();
                let high = self.terms.iter().map(|&t| context.max(t)).max().unwrap();
                context.set_min(self.result, low)?;
                context.set_max(self.result, high)?;
                for &term in &self.terms {
                    context.set_max(term, context.max(self.result))?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::propagation::tests::TestEngine;

    #[test]
    fn minimum_of_bound_terms_is_bound() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(4, 4);
        let y = engine.new_variable(7, 7);
        let m = engine.new_variable(-100, 100);

        let constraint = Extremum {
            terms: vec![x, y],
            result: m,
            kind: ExtremumKind::Minimum,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert!(engine.vars.domain(m).is_bound());
        assert_eq!(engine.vars.domain(m).min(), 4);
    }

    #[test]
    fn maximum_result_caps_every_term() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 9);
        let y = engine.new_variable(0, 9);
        let m = engine.new_variable(0, 5);

        let constraint = Extremum {
            terms: vec![x, y],
            result: m,
            kind: ExtremumKind::Maximum,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(x).max(), 5);
        assert_eq!(engine.vars.domain(y).max(), 5);
    }
}
