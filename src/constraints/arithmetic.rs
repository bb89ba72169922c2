//! Channeling constraints of the expression algebra: `result` is an
//! arithmetic function of its operands. The unary channels (`Offset`,
//! `Scaled`) are value consistent, mirroring individual removals through the
//! bijection; the ternary ones reason over bounds and are bidirectional, so
//! the engine suppresses re-firing them on their own bound updates.

use super::clamp_bound;
use super::div_ceil;
use super::div_floor;
use super::DomainValues;
use crate::basic_types::EmptyDomain;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::variable::VariableId;

fn widen(value: i32) -> i64 {
    i64::from(value)
}

/// `result = operand + offset`; value consistent, holes mirrored through the
/// shift in both directions.
#[derive(Debug)]
pub(crate) struct Offset {
    pub(crate) operand: VariableId,
    pub(crate) result: VariableId,
    pub(crate) offset: i32,
}

impl Offset {
    /// The counterpart of `variable` and the shift mapping `variable`'s
    /// values onto it.
    fn mirror(&self, variable: VariableId) -> (VariableId, i64) {
        if variable == self.operand {
            (self.result, widen(self.offset))
        } else {
            (self.operand, -widen(self.offset))
        }
    }
}

impl Constraint for Offset {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.operand, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let offset = widen(self.offset);
        context.set_min(
            self.result,
            clamp_bound(widen(context.min(self.operand)) + offset),
        )?;
        context.set_max(
            self.result,
            clamp_bound(widen(context.max(self.operand)) + offset),
        )?;
        context.set_min(
            self.operand,
            clamp_bound(widen(context.min(self.result)) - offset),
        )?;
        context.set_max(
            self.operand,
            clamp_bound(widen(context.max(self.result)) - offset),
        )?;

        // After the bounds pass every shifted value lands inside the
        // counterpart's bounds, so interior holes are the only slack left.
        for variable in [self.operand, self.result] {
            let (other, shift) = self.mirror(variable);
            let unsupported: Vec<i32> = DomainValues::of(context, variable)
                .filter(|&value| !context.contains(other, (widen(value) + shift) as i32))
                .collect();
            for value in unsupported {
                context.remove_value(variable, value)?;
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
        match change {
            DomainChange::Removal(value) => {
                let (other, shift) = self.mirror(variable);
                let mirrored = widen(value) + shift;
                if mirrored >= widen(context.min(other)) && mirrored <= widen(context.max(other)) {
                    context.remove_value(other, mirrored as i32)?;
                }
                Ok(())
            }
            DomainChange::Bounds => self.initial_arc_cons(context),
        }
    }
}

/// `result = factor * operand`, `factor != 0`; value consistent, so the
/// result only ever holds multiples of the factor with a supported quotient.
#[derive(Debug)]
pub(crate) struct Scaled {
    pub(crate) operand: VariableId,
    pub(crate) result: VariableId,
    pub(crate) factor: i32,
}

impl Scaled {
    fn supported(&self, context: &PropagationContext<'_>, variable: VariableId, value: i32) -> bool {
        let factor = widen(self.factor);
        if variable == self.operand {
            let product = widen(value) * factor;
            product >= widen(context.min(self.result))
                && product <= widen(context.max(self.result))
                && context.contains(self.result, product as i32)
        } else {
            widen(value) % factor == 0 && context.contains(self.operand, (widen(value) / factor) as i32)
        }
    }
}

impl Constraint for Scaled {
    fn name(&self) -> &'static str {
        "scaled"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.operand, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Value
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let factor = widen(self.factor);
        let (low, high) = {
            let a = widen(context.min(self.operand)) * factor;
            let b = widen(context.max(self.operand)) * factor;
            (a.min(b), a.max(b))
        };
        context.set_min(self.result, clamp_bound(low))?;
        context.set_max(self.result, clamp_bound(high))?;

        // The operand bound is the result bound divided by the factor,
        // rounded towards the inside of the interval.
        let (low, high) = {
            let a = div_ceil(widen(context.min(self.result)), factor);
            let b = div_floor(widen(context.max(self.result)), factor);
            if factor > 0 { (a, b) } else { (b, a) }
        };
        context.set_min(self.operand, clamp_bound(low))?;
        context.set_max(self.operand, clamp_bound(high))?;

        for variable in [self.operand, self.result] {
            let unsupported: Vec<i32> = DomainValues::of(context, variable)
                .filter(|&value| !self.supported(context, variable, value))
                .collect();
            for value in unsupported {
                context.remove_value(variable, value)?;
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
        match change {
            DomainChange::Removal(value) => {
                let factor = widen(self.factor);
                if variable == self.operand {
                    let product = widen(value) * factor;
                    if product >= widen(context.min(self.result))
                        && product <= widen(context.max(self.result))
                    {
                        context.remove_value(self.result, product as i32)?;
                    }
                } else if widen(value) % factor == 0 {
                    context.remove_value(self.operand, (widen(value) / factor) as i32)?;
                }
                Ok(())
            }
            DomainChange::Bounds => self.initial_arc_cons(context),
        }
    }
}

/// `result = left + right`.
#[derive(Debug)]
pub(crate) struct Plus {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
    pub(crate) result: VariableId,
}

impl Constraint for Plus {
    fn name(&self) -> &'static str {
        "plus"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bidirectional
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        context.set_min(
            self.result,
            clamp_bound(widen(context.min(self.left)) + widen(context.min(self.right))),
        )?;
        context.set_max(
            self.result,
            clamp_bound(widen(context.max(self.left)) + widen(context.max(self.right))),
        )?;
        for (this, other) in [(self.left, self.right), (self.right, self.left)] {
            context.set_min(
                this,
                clamp_bound(widen(context.min(self.result)) - widen(context.max(other))),
            )?;
            context.set_max(
                this,
                clamp_bound(widen(context.max(self.result)) - widen(context.min(other))),
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

/// `result = left * right`.
///
/// Bounds consistent forwards; backwards only once the co-factor is bound,
/// which still guarantees failure detection under labeling.
#[derive(Debug)]
pub(crate) struct Times {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
    pub(crate) result: VariableId,
}

impl Constraint for Times {
    fn name(&self) -> &'static str {
        "times"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bidirectional
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        let products = [
            widen(context.min(self.left)) * widen(context.min(self.right)),
            widen(context.min(self.left)) * widen(context.max(self.right)),
            widen(context.max(self.left)) * widen(context.min(self.right)),
            widen(context.max(self.left)) * widen(context.max(self.right)),
        ];
        context.set_min(self.result, clamp_bound(products.iter().copied().min().unwrap()))?;
        context.set_max(self.result, clamp_bound(products.iter().copied().max().unwrap()))?;

        for (this, other) in [(self.left, self.right), (self.right, self.left)] {
            if !context.is_bound(other) {
                continue;
            }
            let factor = widen(context.min(other));
            if factor == 0 {
                // result is forced to zero by the forward pass; `this` is
                // unconstrained.
                continue;
            }
            let a = div_ceil(widen(context.min(self.result)), factor);
            let b = div_floor(widen(context.max(self.result)), factor);
            let (low, high) = if factor > 0 { (a, b) } else { (b, a) };
            context.set_min(this, clamp_bound(low))?;
            context.set_max(this, clamp_bound(high))?;
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

/// `result = left / right` with truncation towards zero; `right != 0`.
#[derive(Debug)]
pub(crate) struct Divided {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
    pub(crate) result: VariableId,
}

impl Constraint for Divided {
    fn name(&self) -> &'static str {
        "divided"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bidirectional
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        context.remove_value(self.right, 0)?;

        if context.is_bound(self.right) {
            let divisor = widen(context.min(self.right));
            // Truncated division is monotone in the dividend for a fixed
            // divisor.
            let a = widen(context.min(self.left)) / divisor;
            let b = widen(context.max(self.left)) / divisor;
            context.set_min(self.result, clamp_bound(a.min(b)))?;
            context.set_max(self.result, clamp_bound(a.max(b)))?;
        } else {
            // |result| <= |left| whenever |right| >= 1.
            let magnitude = widen(context.min(self.left))
                .abs()
                .max(widen(context.max(self.left)).abs());
            context.set_min(self.result, clamp_bound(-magnitude))?;
            context.set_max(self.result, clamp_bound(magnitude))?;
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

/// `result = left % right` with the sign of the dividend; `right != 0`.
#[derive(Debug)]
pub(crate) struct Modulo {
    pub(crate) left: VariableId,
    pub(crate) right: VariableId,
    pub(crate) result: VariableId,
}

impl Constraint for Modulo {
    fn name(&self) -> &'static str {
        "modulo"
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.left, self.right, self.result]
    }

    fn revision_type(&self) -> RevisionType {
        RevisionType::Bidirectional
    }

    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain> {
        context.remove_value(self.right, 0)?;

        if context.is_bound(self.left) && context.is_bound(self.right) {
            let value = widen(context.min(self.left)) % widen(context.min(self.right));
            context.set(self.result, clamp_bound(value))?;
            return Ok(());
        }

        // |result| < |right|, and the result carries the dividend's sign.
        let bound = widen(context.min(self.right))
            .abs()
            .max(widen(context.max(self.right)).abs())
            - 1;
        let low = if context.min(self.left) >= 0 { 0 } else { -bound };
        let high = if context.max(self.left) <= 0 { 0 } else { bound };
        context.set_min(self.result, clamp_bound(low))?;
        context.set_max(self.result, clamp_bound(high))
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
    fn offset_channels_both_directions() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 9);
        let y = engine.new_variable(5, 20);

        let constraint = Offset {
            operand: x,
            result: y,
            offset: 3,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(y).min(), 5);
        assert_eq!(engine.vars.domain(y).max(), 12);
        assert_eq!(engine.vars.domain(x).min(), 2);
    }

    #[test]
    fn scaled_by_negative_factor_flips_bounds() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(1, 4);
        let y = engine.new_variable(-100, 100);

        let constraint = Scaled {
            operand: x,
            result: y,
            factor: -3,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(y).min(), -12);
        assert_eq!(engine.vars.domain(y).max(), -3);
    }

    #[test]
    fn offset_mirrors_interior_holes() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 9);
        let y = engine.new_variable(-100, 100);

        let constraint = Offset {
            operand: x,
            result: y,
            offset: 5,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        engine.context().remove_value(x, 3).unwrap();
        engine.context().remove_value(y, 12).unwrap();
        engine.fixpoint(&constraint).unwrap();

        assert!(!engine.vars.domain(y).contains(8));
        assert!(!engine.vars.domain(x).contains(7));
        assert_eq!(engine.vars.domain(x).size(), 8);
        assert_eq!(engine.vars.domain(y).size(), 8);
    }

    #[test]
    fn scaled_strikes_non_multiples() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 4);
        let y = engine.new_variable(-100, 100);

        let constraint = Scaled {
            operand: x,
            result: y,
            factor: 3,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(y).size(), 5);
        for multiple in [0, 3, 6, 9, 12] {
            assert!(engine.vars.domain(y).contains(multiple));
        }
        assert!(!engine.vars.domain(y).contains(7));
    }

    #[test]
    fn plus_binds_the_last_open_operand() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(3, 3);
        let y = engine.new_variable(0, 10);
        let z = engine.new_variable(8, 8);

        let constraint = Plus {
            left: x,
            right: y,
            result: z,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(y).min(), 5);
        assert!(engine.vars.domain(y).is_bound());
    }

    #[test]
    fn times_with_bound_factor_divides_back() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 50);
        let y = engine.new_variable(3, 3);
        let z = engine.new_variable(10, 20);

        let constraint = Times {
            left: x,
            right: y,
            result: z,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(x).min(), 4);
        assert_eq!(engine.vars.domain(x).max(), 6);
    }

    #[test]
    fn divided_by_zero_only_domain_fails() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(1, 10);
        let y = engine.new_variable(0, 0);
        let z = engine.new_variable(-100, 100);

        let constraint = Divided {
            left: x,
            right: y,
            result: z,
        };
        assert!(engine.post_and_fixpoint(&constraint).is_err());
    }

    #[test]
    fn modulo_of_bound_operands_is_exact() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(-7, -7);
        let y = engine.new_variable(3, 3);
        let z = engine.new_variable(-10, 10);

        let constraint = Modulo {
            left: x,
            right: y,
            result: z,
        };
        engine.post_and_fixpoint(&constraint).unwrap();

        assert_eq!(engine.vars.domain(z).min(), -1);
        assert!(engine.vars.domain(z).is_bound());
    }
}
