use std::fmt;

use crate::basic_types::EmptyDomain;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::bitset_domain::MINUS_INFINITY;
use crate::engine::bitset_domain::PLUS_INFINITY;
use crate::engine::queue::AcQueue;
use crate::engine::search_tree::SearchStack;
use crate::engine::variable::VariableId;
use crate::engine::variable::VariableStore;

/// Handle to a posted constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ConstraintId {
    id: u32,
}

impl StorageKey for ConstraintId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        ConstraintId { id: index as u32 }
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.id)
    }
}

/// How a constraint wants to be told about domain changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RevisionType {
    /// One revision call per removed value.
    Value,
    /// One revision call per queue item whose bounds moved.
    Bounds,
    /// Bounds-style revision, plus self-notification suppression: the
    /// revision is skipped when the constraint itself caused the change and
    /// no other check intervened.
    Bidirectional,
}

/// The domain change a revision reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DomainChange {
    /// A single value disappeared from the domain.
    Removal(i32),
    /// The minimum and/or maximum moved.
    Bounds,
}

/// A propagator enforcing (some approximation of) arc consistency for one
/// posted constraint.
///
/// Implementations are stateless with respect to the search: any scratch
/// state lives in transparent variables so that backtracking never has to
/// consult the constraint.
pub(crate) trait Constraint: fmt::Debug {
    fn name(&self) -> &'static str;

    /// The variables the constraint must be attached to.
    fn variables(&self) -> Vec<VariableId>;

    fn revision_type(&self) -> RevisionType;

    /// Establishes consistency from scratch; run once at posting time.
    fn initial_arc_cons(&self, context: &mut PropagationContext<'_>) -> Result<(), EmptyDomain>;

    /// Re-establishes consistency after `variable` changed as described.
    fn local_arc_cons(
        &self,
        context: &mut PropagationContext<'_>,
        variable: VariableId,
        change: DomainChange,
    ) -> Result<(), EmptyDomain>;
}

#[derive(Debug)]
pub(crate) struct ConstraintEntry {
    pub(crate) constraint: Box<dyn Constraint>,
    /// The constraint-check timestamp of this constraint's latest revision,
    /// consulted by the bidirectional self-notification suppression.
    pub(crate) last_check: u64,
}

pub(crate) type ConstraintStore = KeyedVec<ConstraintId, ConstraintEntry>;

/// Counters over the whole lifetime of a problem manager.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    /// Revisions performed, also serving as the logical clock for the
    /// bidirectional suppression.
    pub(crate) constraint_checks: u64,
    pub(crate) domain_changes: u64,
    pub(crate) failures: u64,
    pub(crate) backtracks: u64,
    pub(crate) solutions_found: u64,
    pub(crate) peak_depth: u64,
}

/// The mutable view of the engine handed to propagators and goals: domain
/// reads plus the single mutation primitive, which snapshots for
/// backtracking and feeds the event queue.
#[derive(Debug)]
pub(crate) struct PropagationContext<'a> {
    pub(crate) vars: &'a mut VariableStore,
    pub(crate) queue: &'a mut AcQueue,
    pub(crate) stack: &'a mut SearchStack,
    pub(crate) counters: &'a mut Counters,
    /// The constraint on whose behalf mutations are made; `None` for goals
    /// and for posting-time pruning.
    pub(crate) cause: Option<ConstraintId>,
}

impl PropagationContext<'_> {
    pub(crate) fn min(&self, variable: VariableId) -> i32 {
        self.vars.domain(variable).min()
    }

    pub(crate) fn max(&self, variable: VariableId) -> i32 {
        self.vars.domain(variable).max()
    }

    pub(crate) fn size(&self, variable: VariableId) -> u32 {
        self.vars.domain(variable).size()
    }

    pub(crate) fn is_bound(&self, variable: VariableId) -> bool {
        self.vars.domain(variable).is_bound()
    }

    pub(crate) fn contains(&self, variable: VariableId, value: i32) -> bool {
        self.vars.domain(variable).contains(value)
    }

    /// The smallest present value strictly greater than `value`, or the
    /// plus-infinity sentinel.
    pub(crate) fn next_value(&self, variable: VariableId, value: i32) -> i32 {
        self.vars.domain(variable).next(value)
    }

    /// The largest present value strictly less than `value`, or the
    /// minus-infinity sentinel.
    pub(crate) fn previous_value(&self, variable: VariableId, value: i32) -> i32 {
        self.vars.domain(variable).previous(value)
    }

    /// Removes `[lo, hi]` from the variable's domain. A change is recorded
    /// into the event queue attributed to this context's cause; emptying the
    /// domain leaves it untouched and reports [`EmptyDomain`].
    pub(crate) fn remove_range(
        &mut self,
        variable: VariableId,
        lo: i32,
        hi: i32,
    ) -> Result<(), EmptyDomain> {
        let applied = self.vars.remove_range(variable, lo, hi, self.stack)?;
        if applied.changed {
            self.counters.domain_changes += 1;
            self.queue.enqueue(
                self.vars,
                variable,
                applied.bounds_moved,
                applied.removed_values,
                self.cause,
                self.counters.constraint_checks,
            );
        }
        Ok(())
    }

    pub(crate) fn remove_value(
        &mut self,
        variable: VariableId,
        value: i32,
    ) -> Result<(), EmptyDomain> {
        self.remove_range(variable, value, value)
    }

    /// Tightens the lower bound to at least `lb`.
    pub(crate) fn set_min(&mut self, variable: VariableId, lb: i32) -> Result<(), EmptyDomain> {
        self.remove_range(variable, MINUS_INFINITY, lb - 1)
    }

    /// Tightens the upper bound to at most `ub`.
    pub(crate) fn set_max(&mut self, variable: VariableId, ub: i32) -> Result<(), EmptyDomain> {
        self.remove_range(variable, ub + 1, PLUS_INFINITY)
    }

    /// Binds the variable to `value`.
    pub(crate) fn set(&mut self, variable: VariableId, value: i32) -> Result<(), EmptyDomain> {
        self.set_min(variable, value)?;
        self.set_max(variable, value)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Bundles the engine state a propagation context borrows from, for
    /// constraint unit tests.
    #[derive(Debug, Default)]
    pub(crate) struct TestEngine {
        pub(crate) vars: VariableStore,
        pub(crate) queue: AcQueue,
        pub(crate) stack: SearchStack,
        pub(crate) counters: Counters,
    }

    impl TestEngine {
        pub(crate) fn new_variable(&mut self, min: i32, max: i32) -> VariableId {
            self.vars.grow(min, max, false)
        }

        pub(crate) fn context(&mut self) -> PropagationContext<'_> {
            PropagationContext {
                vars: &mut self.vars,
                queue: &mut self.queue,
                stack: &mut self.stack,
                counters: &mut self.counters,
                cause: None,
            }
        }

        /// Runs a constraint's initial revision and then drains the queue
        /// against that single constraint, as the engine would.
        pub(crate) fn post_and_fixpoint(
            &mut self,
            constraint: &dyn Constraint,
        ) -> Result<(), EmptyDomain> {
            for variable in constraint.variables() {
                if constraint.revision_type() == RevisionType::Value {
                    self.vars.entry_mut(variable).needs_removed_values = true;
                }
            }
            constraint.initial_arc_cons(&mut self.context())?;
            self.fixpoint(constraint)
        }

        pub(crate) fn fixpoint(&mut self, constraint: &dyn Constraint) -> Result<(), EmptyDomain> {
            while let Some(variable) = self.queue.begin_front(&mut self.vars) {
                let result = match constraint.revision_type() {
                    RevisionType::Value => {
                        let mut result = Ok(());
                        let mut index = 0;
                        while let Some(value) = self.queue.front_removed_value(index) {
                            result = constraint.local_arc_cons(
                                &mut self.context(),
                                variable,
                                DomainChange::Removal(value),
                            );
                            if result.is_err() {
                                break;
                            }
                            index += 1;
                        }
                        result
                    }
                    RevisionType::Bounds | RevisionType::Bidirectional => {
                        if self.queue.front_bound_event().is_some() {
                            constraint.local_arc_cons(
                                &mut self.context(),
                                variable,
                                DomainChange::Bounds,
                            )
                        } else {
                            Ok(())
                        }
                    }
                };
                if result.is_err() {
                    self.queue.clear(&mut self.vars);
                    return result;
                }
                self.queue.finish_front();
            }
            Ok(())
        }
    }

    #[test]
    fn set_binds_and_records_one_queue_item() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(0, 9);

        engine.context().set(x, 4).expect("4 is in the domain");
        assert!(engine.vars.domain(x).is_bound());
        assert_eq!(engine.vars.domain(x).min(), 4);

        assert_eq!(engine.queue.begin_front(&mut engine.vars), Some(x));
        assert!(engine.queue.front_bound_event().is_some());
        engine.queue.finish_front();
        assert!(engine.queue.begin_front(&mut engine.vars).is_none());
    }

    #[test]
    fn emptying_a_domain_reports_without_mutating() {
        let mut engine = TestEngine::default();
        let x = engine.new_variable(3, 5);

        let result = engine.context().remove_range(x, 0, 10);
        assert_eq!(result, Err(EmptyDomain));
        assert_eq!(engine.vars.domain(x).size(), 3);
        assert!(engine.queue.is_empty());
    }
}
