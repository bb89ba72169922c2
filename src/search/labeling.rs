use log::warn;

use super::Goal;
use super::GoalContext;
use super::LeafGoal;
use crate::basic_types::EmptyDomain;
use crate::constraints::div_floor;
use crate::engine::bitset_domain::MINUS_INFINITY;
use crate::engine::bitset_domain::PLUS_INFINITY;
use crate::engine::variable::VariableId;

/// Which unbound variable a labeling strategy tries next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableOrder {
    /// The first unbound variable in the order the array was given.
    InputOrder,
    /// The unbound variable with the smallest domain (first-fail).
    #[default]
    MostConstrainedFirst,
}

/// Depth-first labeling: for the selected variable, try `value == v` before
/// `value != v`, minimum value first.
pub fn labeling(variables: &[VariableId], order: VariableOrder) -> Goal {
    if variables.is_empty() {
        warn!("labeling was given no variables; the goal succeeds trivially");
    }
    Goal::leaf(Labeling {
        variables: variables.to_vec(),
        order,
    })
}

/// Limited discrepancy labeling: at most `discrepancies` non-preferred value
/// choices are allowed along any path. Widen the bound across restarts to
/// recover completeness.
pub fn lds_labeling(variables: &[VariableId], discrepancies: u32) -> Goal {
    Goal::leaf(LdsLabeling {
        variables: variables.to_vec(),
        discrepancies,
    })
}

/// Credit-based labeling: each choice point passes half of its remaining
/// credit to the preferred branch; once the credit runs out the search
/// plunges deterministically without opening further choice points.
pub fn credit_labeling(variables: &[VariableId], credit: u64) -> Goal {
    Goal::leaf(CreditLabeling {
        variables: variables.to_vec(),
        credit,
    })
}

/// Randomized labeling: variable and value are drawn from the seeded random
/// generator of the search configuration.
pub fn random_labeling(variables: &[VariableId]) -> Goal {
    Goal::leaf(RandomLabeling {
        variables: variables.to_vec(),
    })
}

/// Domain-splitting labeling: instead of enumerating values, halve the
/// selected variable's domain around its midpoint until it is bound.
pub fn split_labeling(variables: &[VariableId], order: VariableOrder) -> Goal {
    Goal::leaf(SplitLabeling {
        variables: variables.to_vec(),
        order,
    })
}

/// Goal assigning a single value.
pub fn set_value(variable: VariableId, value: i32) -> Goal {
    Goal::leaf(SetValue { variable, value })
}

/// Goal removing a single value.
pub fn remove_value(variable: VariableId, value: i32) -> Goal {
    Goal::leaf(RemoveValue { variable, value })
}

fn select_variable(
    context: &GoalContext<'_, '_>,
    variables: &[VariableId],
    order: VariableOrder,
) -> Option<VariableId> {
    match order {
        VariableOrder::InputOrder => variables
            .iter()
            .copied()
            .find(|&variable| !context.is_bound(variable)),
        VariableOrder::MostConstrainedFirst => variables
            .iter()
            .copied()
            .filter(|&variable| !context.is_bound(variable))
            .min_by_key(|&variable| context.size(variable)),
    }
}

#[derive(Debug, Clone, Copy)]
struct SetValue {
    variable: VariableId,
    value: i32,
}

impl LeafGoal for SetValue {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        context.set(self.variable, self.value)?;
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy)]
struct RemoveValue {
    variable: VariableId,
    value: i32,
}

impl LeafGoal for RemoveValue {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        context.remove_value(self.variable, self.value)?;
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy)]
struct RemoveRange {
    variable: VariableId,
    lo: i32,
    hi: i32,
}

impl LeafGoal for RemoveRange {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        context.remove_range(self.variable, self.lo, self.hi)?;
        Ok(None)
    }
}

#[derive(Debug, Clone)]
struct Labeling {
    variables: Vec<VariableId>,
    order: VariableOrder,
}

impl LeafGoal for Labeling {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        let Some(variable) = select_variable(context, &self.variables, self.order) else {
            return Ok(None);
        };
        Ok(Some(Goal::and(
            Goal::leaf(InDomain { variable }),
            Goal::leaf(self.clone()),
        )))
    }
}

/// Value enumeration for one variable: try the minimum, or refuse it and
/// recurse.
#[derive(Debug, Clone, Copy)]
struct InDomain {
    variable: VariableId,
}

impl LeafGoal for InDomain {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        if context.is_bound(self.variable) {
            return Ok(None);
        }
        let value = context.min(self.variable);
        Ok(Some(Goal::or(
            set_value(self.variable, value),
            Goal::and(remove_value(self.variable, value), Goal::leaf(*self)),
        )))
    }
}

#[derive(Debug, Clone)]
struct LdsLabeling {
    variables: Vec<VariableId>,
    discrepancies: u32,
}

impl LeafGoal for LdsLabeling {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        let Some(variable) =
            select_variable(context, &self.variables, VariableOrder::InputOrder)
        else {
            return Ok(None);
        };
        let preferred = context.min(variable);

        let take_preferred = Goal::and(set_value(variable, preferred), Goal::leaf(self.clone()));
        if self.discrepancies == 0 {
            // No budget left: the preferred value is the only option, without
            // opening a choice point.
            return Ok(Some(take_preferred));
        }

        let deviate = Goal::and(
            remove_value(variable, preferred),
            Goal::leaf(LdsLabeling {
                variables: self.variables.clone(),
                discrepancies: self.discrepancies - 1,
            }),
        );
        Ok(Some(Goal::or(take_preferred, deviate)))
    }
}

#[derive(Debug, Clone)]
struct CreditLabeling {
    variables: Vec<VariableId>,
    credit: u64,
}

impl LeafGoal for CreditLabeling {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        let Some(variable) =
            select_variable(context, &self.variables, VariableOrder::MostConstrainedFirst)
        else {
            return Ok(None);
        };
        let value = context.min(variable);

        if self.credit <= 1 {
            // Out of credit: plunge without alternatives.
            return Ok(Some(Goal::and(
                set_value(variable, value),
                Goal::leaf(self.clone()),
            )));
        }

        let preferred_credit = self.credit.div_ceil(2);
        let preferred = Goal::and(
            set_value(variable, value),
            Goal::leaf(CreditLabeling {
                variables: self.variables.clone(),
                credit: preferred_credit,
            }),
        );
        let alternative = Goal::and(
            remove_value(variable, value),
            Goal::leaf(CreditLabeling {
                variables: self.variables.clone(),
                credit: self.credit - preferred_credit,
            }),
        );
        Ok(Some(Goal::or(preferred, alternative)))
    }
}

#[derive(Debug, Clone)]
struct RandomLabeling {
    variables: Vec<VariableId>,
}

impl LeafGoal for RandomLabeling {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        let unbound: Vec<VariableId> = self
            .variables
            .iter()
            .copied()
            .filter(|&variable| !context.is_bound(variable))
            .collect();
        if unbound.is_empty() {
            return Ok(None);
        }

        let variable = unbound[context
            .random()
            .generate_usize_in_range(0..unbound.len())];
        let domain_size = context.size(variable) as usize;
        let index = context.random().generate_usize_in_range(0..domain_size);
        let value = context.nth_value(variable, index);

        Ok(Some(Goal::or(
            Goal::and(set_value(variable, value), Goal::leaf(self.clone())),
            Goal::and(remove_value(variable, value), Goal::leaf(self.clone())),
        )))
    }
}

#[derive(Debug, Clone)]
struct SplitLabeling {
    variables: Vec<VariableId>,
    order: VariableOrder,
}

impl LeafGoal for SplitLabeling {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        let Some(variable) = select_variable(context, &self.variables, self.order) else {
            return Ok(None);
        };
        Ok(Some(Goal::and(
            Goal::leaf(DomainSplit { variable }),
            Goal::leaf(self.clone()),
        )))
    }
}

#[derive(Debug, Clone, Copy)]
struct DomainSplit {
    variable: VariableId,
}

impl LeafGoal for DomainSplit {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain> {
        if context.is_bound(self.variable) {
            return Ok(None);
        }
        // Midpoint computed in i64 to stay clear of overflow near the
        // sentinels; floored so that `min <= mid < max` also holds for
        // negative domains and both halves are non-empty.
        let mid = div_floor(
            i64::from(context.min(self.variable)) + i64::from(context.max(self.variable)),
            2,
        ) as i32;

        let lower_half = Goal::and(
            Goal::leaf(RemoveRange {
                variable: self.variable,
                lo: mid + 1,
                hi: PLUS_INFINITY,
            }),
            Goal::leaf(*self),
        );
        let upper_half = Goal::and(
            Goal::leaf(RemoveRange {
                variable: self.variable,
                lo: MINUS_INFINITY,
                hi: mid,
            }),
            Goal::leaf(*self),
        );
        Ok(Some(Goal::or(lower_half, upper_half)))
    }
}
