use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

/// `left < right` (or `left <= right` when `or_equal` is set); bounds
/// consistent.
#[derive(Debug)]
pub(crate) struct LessThan {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
    pub(crate) or_equal: bool,
}

impl Constraint for LessThan {
    fn name(&self) -> &'static str {
        if self.or_equal {
            "less_or_equals"
        } else {
            "less_than"
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bounds
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let slack = if self.or_equal { 0 } else { 1 };
        context.set_max(self.left, context.max(self.right) - slack)?;
        context.set_min(self.right, context.min(self.left) + slack)
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

/// `left == right`; value consistent, removals mirrored between the two
/// domains.
#[derive(Debug)]
pub(crate) struct Equals {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
}

impl Constraint for Equals {
    fn name(&self) -> &'static str {
        "equals"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        context.set_min(self.left, context.min(self.right))?;
        context.set_max(self.left, context.max(self.right))?;
        context.set_min(self.right, context.min(self.left))?;
        context.set_max(self.right, context.max(self.left))?;

        for (a, b) in [(self.left, self.right), (self.right, self.left)] {
            let unsupported: Vec<i32> = DomainValues::of(context, a)
                .filter(|&value| !context.contains(b, value))
                .collect();
            for value in unsupported {
                context.remove_value(a, value)?;
            }
        }
        Ok(())
    }

    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        variable: VariableId,
        change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        let other = if variable == self.left {
            self.right
        } else {
            self.left
        };
        match change {
            DomainChange::Removal(value) => context.remove_value(other, value),
            DomainChange::Bounds => self.initial_arc_cons(context),
        }
    }
}

/// `left != right`; prunes once either side becomes bound.
#[derive(Debug)]
pub(crate) struct NotEquals {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
}

impl Constraint for NotEquals {
    fn name(&self) -> &'static str {
        "not_equals"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        if context.is_bound(self.left) {
            context.remove_value(self.right, context.min(self.left))?;
        }
        if context.is_bound(self.right) {
            context.remove_value(self.left, context.min(self.right))?;
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

/// Iterator over the present values of a variable, read through a
/// propagation context.
pub(crate) struct DomainValues {
    values: std::vec::IntoIter<i32>,
}

impl DomainValues {
    /// Collects the domain eagerly so the context stays borrowable for
    /// mutation while iterating.
    pub(crate) fn of(context: &PropagationContext<'_>, variable: VariableId) -> DomainValues {
        let mut values = Vec::with_capacity(context.size(variable) as usize);
        let mut value = context.min(variable);
        let max = context.max(variable);
        while value <= max {
            values.push(value);
            value = context.next_value(variable, value);
        }
        DomainValues {
            values: values.into_iter(),
        }
    }
}

impl Iterator for DomainValues {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        self.values.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::propagation::tests::TestEngine;

    #[test]
    fn less_than_tightens_both_bounds() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 9);
        let y = engine.new_variable(0, 5);

        let constraint = LessThan {
            left: x,
            right: y,
            or_equal: false,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(x).max(), 4);
        assert_eq!(engine.vars.domain(y).min(), 1);
    }

    #[test]
    fn equals_mirrors_holes() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 5);
        let y = engine.new_variable(0, 5);
        engine.context().remove_value(y, 3).unwrap();
        engine.queue.clear(&mut engine.vars);

        let constraint = Equals { left: x, right: y };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert!(!engine.vars.domain(x).contains(3));
        assert_eq!(engine.vars.domain(x).size(), 5);
    }

    #[test]
    fn not_equals_fails_on_equal_constants() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(4, 4);
        let y = engine.new_variable(4, 4);

        let constraint = NotEquals { left: x, right: y };
        assert!(engine.post_and_fixpoint(&constraint).is_err());
    }
}
