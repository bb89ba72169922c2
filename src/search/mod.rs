//! The goal engine: AND/OR goal trees representing search strategies.
//!
//! A [`Goal`] is either a leaf performing a problem mutation (assign a value,
//! remove a value, run one labeling step), an AND-combinator scheduling both
//! sub-goals on the current search frame, or an OR-combinator opening a
//! genuine choice point: a new search frame whose backtrack alternative is
//! the second sub-goal.
//!
//! Goals are immutable once built and reference counted, so cloning a goal
//! (or a whole agenda of them) is shallow. The search tree relies on this:
//! every choice point snapshots the pending agenda, and taking the
//! alternative branch restores it, so the continuation after the choice is
//! executed once per branch.

mod labeling;

use std::fmt::Debug;
use std::rc::Rc;

pub use labeling::*;

use crate::basic_types::EmptyDomain;
use crate::basic_types::Random;
use crate::engine::bitset_domain::PLUS_INFINITY;
use crate::engine::propagation::PropagationContext;
use crate::engine::variable::VariableId;

/// A node of a search-strategy tree.
#[derive(Clone, Debug)]
pub enum Goal {
    /// Satisfy both sub-goals, the first one next.
    And(Rc<Goal>, Rc<Goal>),
    /// A binary choice point: try the first sub-goal now; on backtrack, try
    /// the second.
    Or(Rc<Goal>, Rc<Goal>),
    /// An executable step of a search strategy.
    Leaf(Rc<dyn LeafGoal>),
}

impl Goal {
    pub fn and(first: Goal, second: Goal) -> Goal {
        Goal::And(Rc::new(first), Rc::new(second))
    }

    pub fn or(first: Goal, second: Goal) -> Goal {
        Goal::Or(Rc::new(first), Rc::new(second))
    }

    pub fn leaf(leaf: impl LeafGoal + 'static) -> Goal {
        Goal::Leaf(Rc::new(leaf))
    }
}

/// An executable leaf of a goal tree.
///
/// Executing a leaf mutates the problem through the [`GoalContext`] and/or
/// returns a successor goal to continue with; `Ok(None)` means the goal is
/// fully discharged. Strategies beyond the built-in ones can be added by
/// implementing this trait.
pub trait LeafGoal: Debug {
    fn execute(&self, context: &mut GoalContext<'_, '_>) -> Result<Option<Goal>, EmptyDomain>;
}

/// The view of the problem a [`LeafGoal`] executes against: domain
/// introspection, the single mutation primitive, and the seeded random
/// generator of the search configuration.
#[derive(Debug)]
pub struct GoalContext<'a, 'rng> {
    pub(crate) propagation: PropagationContext<'a>,
    pub(crate) rng: &'rng mut dyn Random,
}

impl GoalContext<'_, '_> {
    pub fn min(&self, variable: VariableId) -> i32 {
        self.propagation.min(variable)
    }

    pub fn max(&self, variable: VariableId) -> i32 {
        self.propagation.max(variable)
    }

    pub fn size(&self, variable: VariableId) -> u32 {
        self.propagation.size(variable)
    }

    pub fn is_bound(&self, variable: VariableId) -> bool {
        self.propagation.is_bound(variable)
    }

    pub fn contains(&self, variable: VariableId, value: i32) -> bool {
        self.propagation.contains(variable, value)
    }

    /// The `index`-th present value of the variable's domain, counting from
    /// the minimum. Panics when `index` is out of range.
    pub fn nth_value(&self, variable: VariableId, index: usize) -> i32 {
        let mut value = self.min(variable);
        for _ in 0..index {
            value = self.propagation.next_value(variable, value);
            assert!(
                value < PLUS_INFINITY,
                "nth_value index out of range for {variable}"
            );
        }
        value
    }

    /// Assigns `value` to the variable.
    pub fn set(&mut self, variable: VariableId, value: i32) -> Result<(), EmptyDomain> {
        self.propagation.set(variable, value)
    }

    /// Removes a single value from the variable's domain.
    pub fn remove_value(&mut self, variable: VariableId, value: i32) -> Result<(), EmptyDomain> {
        self.propagation.remove_range(variable, value, value)
    }

    /// Removes every value in `[lo, hi]` from the variable's domain.
    pub fn remove_range(
        &mut self,
        variable: VariableId,
        lo: i32,
        hi: i32,
    ) -> Result<(), EmptyDomain> {
        self.propagation.remove_range(variable, lo, hi)
    }

    /// The seeded random generator of the search configuration.
    pub fn random(&mut self) -> &mut dyn Random {
        self.rng
    }
}
