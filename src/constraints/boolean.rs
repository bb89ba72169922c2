//! Boolean connectives and reified comparisons over 0/1 variables.

use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BoolOp {
    And,
    Or,
    Xor,
}

/// `result = left OP right` over 0/1 variables; posting clips all three
/// domains to `[0, 1]`.
#[derive(Debug)]
pub(crate) struct BoolConnective {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
    pub(crate) result: VariableId,
    pub(crate) op: BoolOp,
}

impl Constraint for BoolConnective {
    fn name(&self) -> &'static str {
        match self.op {
            BoolOp::And => "bool_and",
            BoolOp::Or => "bool_or",
            BoolOp::Xor => "bool_xor",
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bounds
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        for variable in [self.left, self.right, self.result] {
            context.set_min(variable, 0)?;
            context.set_max(variable, 1)?;
        }
        self.revise(context)
    }

    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        _variable: VariableId,
        _change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        self.revise(context)
    }
}

impl BoolConnective {
    fn revise(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let truth = |variable: VariableId| -> Option<bool> {
            context
                .is_bound(variable)
                .then(|| context.min(variable) == 1)
        };
        let left = truth(self.left);
        let right = truth(self.right);
        let result = truth(self.result);

        match self.op {
            BoolOp::And => {
                if left == Some(false) || right == Some(false) {
                    context.set(self.result, 0)?;
                } else if left == Some(true) && right == Some(true) {
                    context.set(self.result, 1)?;
                }
                if result == Some(true) {
                    context.set(self.left, 1)?;
                    context.set(self.right, 1)?;
                } else if result == Some(false) {
                    if left == Some(true) {
                        context.set(self.right, 0)?;
                    }
                    if right == Some(true) {
                        context.set(self.left, 0)?;
                    }
                }
            }
            BoolOp::Or => {
                if left == Some(true) || right == Some(true) {
                    context.set(self.result, 1)?;
                } else if left == Some(false) && right == Some(false) {
                    context.set(self.result, 0)?;
                }
                if result == Some(false) {
                    context.set(self.left, 0)?;
                    context.set(self.right, 0)?;
                } else if result == Some(true) {
                    if left == Some(false) {
                        context.set(self.right, 1)?;
                    }
                    if right == Some(false) {
                        context.set(self.left, 1)?;
                    }
                }
            }
            BoolOp::Xor => {
                // Two bound legs fix the third.
                if let (Some(a), Some(b)) = (left, right) {
                    context.set(self.result, i32::from(a != b))?;
                }
                if let (Some(a), Some(r)) = (left, result) {
                    context.set(self.right, i32::from(a != r))?;
                }
                if let (Some(b), Some(r)) = (right, result) {
                    context.set(self.left, i32::from(b != r))?;
                }
            }
        }
        Ok(())
    }
}

/// The comparison operators available in reified form against a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CompareOp {
    LessThan,
    LessOrEquals,
    Equals,
    NotEquals,
}

/// `result = (operand OP bound)` as a 0/1 variable.
#[derive(Debug)]
pub(crate) struct ReifiedComparison {
    pub(crate) operand: VariableId,
    pub(crate) bound: i32,
    pub(crate) result: VariableId,
    pub(crate) op: CompareOp,
}

impl Constraint for ReifiedComparison {
    fn name(&self) -> &'static str {
        match self.op {
            CompareOp::LessThan => "reify_less_than",
            CompareOp::LessOrEquals => "reify_less_or_equals",
            CompareOp::Equals => "reify_equals",
            CompareOp::NotEquals => "reify_not_equals",
        }
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.operand, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bounds
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        context.set_min(self.result, 0)?;
        context.set_max(self.result, 1)?;
        self.revise(context)
    }

    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        _variable: VariableId,
        _change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        self.revise(context)
    }
}

impl ReifiedComparison {
    fn revise(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let threshold = match self.op {
            // `x < c` and `x <= c` share their machinery up to this shift.
            CompareOp::LessThan => self.bound - 1,
            _ => self.bound,
        };
        match self.op {
            CompareOp::LessThan | CompareOp::LessOrEquals => {
                if context.max(self.operand) <= threshold {
                    context.set(self.result, 1)?;
                } else if context.min(self.operand) > threshold {
                    context.set(self.result, 0)?;
                } else if context.is_bound(self.result) {
                    if context.min(self.result) == 1 {
                        context.set_max(self.operand, threshold)?;
                    } else {
                        context.set_min(self.operand, threshold + 1)?;
                    }
                }
            }
            CompareOp::Equals => {
                if !context.contains(self.operand, self.bound) {
                    context.set(self.result, 0)?;
                } else if context.is_bound(self.operand) {
                    context.set(self.result, 1)?;
                } else if context.is_bound(self.result) {
                    if context.min(self.result) == 1 {
                        context.set(self.operand, self.bound)?;
                    } else {
                        context.remove_value(self.operand, self.bound)?;
                    }
                }
            }
            CompareOp::NotEquals => {
                if !context.contains(self.operand, self.bound) {
                    context.set(self.result, 1)?;
                } else if context.is_bound(self.operand) {
                    context.set(self.result, 0)?;
                } else if context.is_bound(self.result) {
                    if context.min(self.result) == 1 {
                        context.remove_value(self.operand, self.bound)?;
                    } else {
                        context.set(self.operand, self.bound)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::propagation::tests::TestEngine;

    #[test]
    fn and_backward_forces_both_operands() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 1);
        let y = engine.new_variable(0, 1);
        let z = engine.new_variable(1, 1);

        let constraint = BoolConnective {
            left: x,
            right: y,
            result: z,
            op: BoolOp::And,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(x).min(), 1);
        assert_eq!(engine.vars.domain(y).min(), 1);
    }

    #[test]
    fn xor_completes_the_third_leg() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(1, 1);
        let y = engine.new_variable(0, 1);
        let z = engine.new_variable(0, 0);

        let constraint = BoolConnective {
            left: x,
            right: y,
            result: z,
            op: BoolOp::Xor,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(y).min(), 1);
    }

    #[test]
    fn reified_less_than_decides_from_the_operand() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 4);
        let b = engine.new_variable(0, 1);

        let constraint = ReifiedComparison {
            operand: x,
            bound: 5,
            result: b,
            op: CompareOp::LessThan,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(b).min(), 1);
    }

    #[test]
    fn reified_equals_backward_binds_the_operand() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 9);
        let b = engine.new_variable(1, 1);

        let constraint = ReifiedComparison {
            operand: x,
            bound: 6,
            result: b,
            op: CompareOp::Equals,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert!(engine.vars.domain(x).is_bound());
        assert_eq!(engine.vars.domain(x).min(), 6);
    }
}
