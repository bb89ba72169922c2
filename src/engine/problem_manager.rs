use std::fmt;
use std::io;
use std::io::Write;
use std::ops::Range;
use std::rc::Rc;
use std::time::Duration;

use log::debug;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::acorn_assert_simple;
use crate::basic_types::EmptyDomain;
use crate::basic_types::PostError;
use crate::basic_types::Random;
use crate::basic_types::SolveResult;
use crate::basic_types::Stopwatch;
use crate::constraints::clamp_bound;
use crate::constraints::AllDifferent;
use crate::constraints::AllDifferentCapacity;
use crate::constraints::BoolConnective;
use crate::constraints::BoolOp;
use crate::constraints::CompareOp;
use crate::constraints::Count;
use crate::constraints::Divided;
use crate::constraints::Element;
use crate::constraints::Equals;
use crate::constraints::Extremum;
use crate::constraints::ExtremumKind;
use crate::constraints::Inverse;
use crate::constraints::LessThan;
use crate::constraints::Modulo;
use crate::constraints::NotEquals;
use crate::constraints::Offset;
use crate::constraints::Plus;
use crate::constraints::ReifiedComparison;
use crate::constraints::Scaled;
use crate::constraints::Sum;
use crate::constraints::Table;
use crate::constraints::Times;
use crate::engine::bitset_domain::MINUS_INFINITY;
use crate::engine::bitset_domain::PLUS_INFINITY;
use crate::engine::graph_export;
use crate::engine::propagation::Constraint;
use crate::engine::propagation::ConstraintEntry;
use crate::engine::propagation::ConstraintId;
use crate::engine::propagation::ConstraintStore;
use crate::engine::propagation::Counters;
use crate::engine::propagation::DomainChange;
use crate::engine::propagation::PropagationContext;
use crate::engine::propagation::RevisionType;
use crate::engine::queue::AcQueue;
use crate::engine::search_tree::SearchStack;
use crate::engine::variable::ConstraintAttachment;
use crate::engine::variable::VariableId;
use crate::engine::variable::VariableStore;
use crate::search::Goal;
use crate::search::GoalContext;
use crate::statistics::log_statistic;
use crate::statistics::should_log_statistics;

/// One constraint-satisfaction problem: its variables, its constraints, and
/// the state of an optionally in-progress search over them.
///
/// Variable handles are only valid for the manager that created them; the
/// manager is single-threaded by construction.
pub struct ProblemManager {
    vars: VariableStore,
    constraints: ConstraintStore,
    queue: AcQueue,
    stack: SearchStack,
    counters: Counters,
    rng: Box<dyn Random>,
    stopwatch: Stopwatch,
    backtrack_stop: Option<u64>,
    /// Set when a posting-time wipeout proved the problem has no solution.
    infeasible: bool,
    /// The previous `next_solution` call stopped on a solution; the next one
    /// must leave it by backtracking before searching on.
    standing_on_solution: bool,
    objective: Option<VariableId>,
    objective_cap: Option<i32>,
    best_objective: Option<i32>,
    search_log: Option<Box<dyn Write>>,
}

impl fmt::Debug for ProblemManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemManager")
            .field("vars", &self.vars.len())
            .field("constraints", &self.constraints.len())
            .field("counters", &self.counters)
            .field("infeasible", &self.infeasible)
            .field("objective", &self.objective)
            .field("best_objective", &self.best_objective)
            .finish_non_exhaustive()
    }
}

impl Default for ProblemManager {
    fn default() -> Self {
        ProblemManager::new()
    }
}

impl ProblemManager {
    pub fn new() -> ProblemManager {
        ProblemManager {
            vars: VariableStore::default(),
            constraints: ConstraintStore::default(),
            queue: AcQueue::default(),
            stack: SearchStack::new(),
            counters: Counters::default(),
            rng: Box::new(SmallRng::seed_from_u64(42)),
            stopwatch: Stopwatch::new(None),
            backtrack_stop: None,
            infeasible: false,
            standing_on_solution: false,
            objective: None,
            objective_cap: None,
            best_objective: None,
            search_log: None,
        }
    }

    /// Reseeds the generator driving the randomized search strategies.
    pub fn random_seed(&mut self, seed: u64) {
        self.rng = Box::new(SmallRng::seed_from_u64(seed));
    }

    // ------------------------------------------------------------------
    // Variables

    pub fn new_variable(&mut self, min: i32, max: i32) -> Result<VariableId, PostError> {
        if min > max || min <= MINUS_INFINITY || max >= PLUS_INFINITY {
            return Err(PostError::InvalidBounds { min, max });
        }
        Ok(self.vars.grow(min, max, false))
    }

    pub fn new_variable_named(
        &mut self,
        min: i32,
        max: i32,
        name: impl Into<String>,
    ) -> Result<VariableId, PostError> {
        let variable = self.new_variable(min, max)?;
        self.vars.entry_mut(variable).name = Some(name.into());
        Ok(variable)
    }

    /// Scratch variable of a constraint decomposition: never snapshotted,
    /// never restored by backtracking.
    fn new_transparent(&mut self, min: i32, max: i32) -> VariableId {
        self.vars.grow(min, max, true)
    }

    fn check_variable(&self, variable: VariableId) -> Result<(), PostError> {
        if self.vars.contains(variable) {
            Ok(())
        } else {
            Err(PostError::UnknownVariable(variable.id()))
        }
    }

    fn check_variables(&self, variables: &[VariableId]) -> Result<(), PostError> {
        variables
            .iter()
            .try_for_each(|&variable| self.check_variable(variable))
    }

    // ------------------------------------------------------------------
    // Introspection

    pub fn min(&self, variable: VariableId) -> i32 {
        self.vars.domain(variable).min()
    }

    pub fn max(&self, variable: VariableId) -> i32 {
        self.vars.domain(variable).max()
    }

    pub fn size(&self, variable: VariableId) -> u32 {
        self.vars.domain(variable).size()
    }

    pub fn is_bound(&self, variable: VariableId) -> bool {
        self.vars.domain(variable).is_bound()
    }

    pub fn contains(&self, variable: VariableId, value: i32) -> bool {
        self.vars.domain(variable).contains(value)
    }

    /// The assigned value of a bound variable.
    ///
    /// # Panics
    ///
    /// Panics when the variable is not bound; querying the value of an
    /// unbound variable is a caller bug. Use
    /// [`ProblemManager::assigned_value`] for the fallible variant.
    pub fn value(&self, variable: VariableId) -> i32 {
        let domain = self.vars.domain(variable);
        if !domain.is_bound() {
            panic!(
                "{variable} is not bound: domain is [{}, {}] with {} values",
                domain.min(),
                domain.max(),
                domain.size()
            );
        }
        domain.min()
    }

    pub fn assigned_value(&self, variable: VariableId) -> Option<i32> {
        let domain = self.vars.domain(variable);
        domain.is_bound().then(|| domain.min())
    }

    /// The present values of a domain in increasing order.
    pub fn domain_values(&self, variable: VariableId) -> impl Iterator<Item = i32> + '_ {
        self.vars.domain(variable).iter()
    }

    /// The absent values strictly between the domain's bounds, in increasing
    /// order.
    pub fn domain_gaps(&self, variable: VariableId) -> impl Iterator<Item = i32> + '_ {
        let domain = self.vars.domain(variable);
        let mut cursor = domain.min();
        std::iter::from_fn(move || {
            cursor = domain.next_gap(cursor);
            (cursor < domain.max()).then_some(cursor)
        })
    }

    /// Whether posting has already proven the problem unsatisfiable.
    pub fn is_infeasible(&self) -> bool {
        self.infeasible
    }

    // ------------------------------------------------------------------
    // Expression algebra: derived variables

    /// `result = x + offset`.
    pub fn offset(&mut self, x: VariableId, offset: i32) -> Result<VariableId, PostError> {
        self.check_variable(x)?;
        let result = self.derived(
            i64::from(self.min(x)) + i64::from(offset),
            i64::from(self.max(x)) + i64::from(offset),
        );
        self.post(Offset {
            operand: x,
            result,
            offset,
        })?;
        Ok(result)
    }

    /// `result = factor * x`.
    pub fn scaled(&mut self, factor: i32, x: VariableId) -> Result<VariableId, PostError> {
        self.check_variable(x)?;
        if factor == 0 {
            return Ok(self.new_transparent(0, 0));
        }
        let a = i64::from(factor) * i64::from(self.min(x));
        let b = i64::from(factor) * i64::from(self.max(x));
        let result = self.derived(a.min(b), a.max(b));
        self.post(Scaled {
            operand: x,
            result,
            factor,
        })?;
        Ok(result)
    }

    /// `result = x + y`.
    pub fn plus(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.check_variables(&[x, y])?;
        let result = self.derived(
            i64::from(self.min(x)) + i64::from(self.min(y)),
            i64::from(self.max(x)) + i64::from(self.max(y)),
        );
        self.post(Plus {
            left: x,
            right: y,
            result,
        })?;
        Ok(result)
    }

    /// `result = x * y`.
    pub fn times(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.check_variables(&[x, y])?;
        let products = [
            i64::from(self.min(x)) * i64::from(self.min(y)),
            i64::from(self.min(x)) * i64::from(self.max(y)),
            i64::from(self.max(x)) * i64::from(self.min(y)),
            i64::from(self.max(x)) * i64::from(self.max(y)),
        ];
        let result = self.derived(
            products.iter().copied().min().unwrap(),
            products.iter().copied().max().unwrap(),
        );
        self.post(Times {
            left: x,
            right: y,
            result,
        })?;
        Ok(result)
    }

    /// `result = x / y`, truncating towards zero; `y` may not be fixed to
    /// zero.
    pub fn divided(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.check_variables(&[x, y])?;
        if self.min(y) == 0 && self.max(y) == 0 {
            return Err(PostError::ZeroDivisor("divided"));
        }
        let magnitude = i64::from(self.min(x))
            .abs()
            .max(i64::from(self.max(x)).abs());
        let result = self.derived(-magnitude, magnitude);
        self.post(Divided {
            left: x,
            right: y,
            result,
        })?;
        Ok(result)
    }

    /// `result = x % y` with the sign of `x`; `y` may not be fixed to zero.
    pub fn modulo(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.check_variables(&[x, y])?;
        if self.min(y) == 0 && self.max(y) == 0 {
            return Err(PostError::ZeroDivisor("modulo"));
        }
        let bound = i64::from(self.min(y))
            .abs()
            .max(i64::from(self.max(y)).abs())
            - 1;
        let result = self.derived(-bound, bound);
        self.post(Modulo {
            left: x,
            right: y,
            result,
        })?;
        Ok(result)
    }

    /// `result = terms[0] + ... + terms[n-1]`.
    pub fn sum(&mut self, terms: &[VariableId]) -> Result<VariableId, PostError> {
        if terms.is_empty() {
            return Err(PostError::EmptyArray("sum"));
        }
        self.check_variables(terms)?;
        let low: i64 = terms.iter().map(|&t| i64::from(self.min(t))).sum();
        let high: i64 = terms.iter().map(|&t| i64::from(self.max(t))).sum();
        let result = self.derived(low, high);
        self.post(Sum {
            terms: terms.to_vec(),
            total: result,
        })?;
        Ok(result)
    }

    /// `result = min(terms)`.
    pub fn minimum(&mut self, terms: &[VariableId]) -> Result<VariableId, PostError> {
        self.extremum(terms, ExtremumKind::Minimum)
    }

    /// `result = max(terms)`.
    pub fn maximum(&mut self, terms: &[VariableId]) -> Result<VariableId, PostError> {
        self.extremum(terms, ExtremumKind::Maximum)
    }

    fn extremum(
        &mut self,
        terms: &[VariableId],
        kind: ExtremumKind,
    ) -> Result<VariableId, PostError> {
        if terms.is_empty() {
            return Err(PostError::EmptyArray(match kind {
                ExtremumKind::Minimum => "minimum",
                ExtremumKind::Maximum => "maximum",
            }));
        }
        self.check_variables(terms)?;
        let (low, high) = match kind {
            ExtremumKind::Minimum => (
                terms.iter().map(|&t| self.min(t)).min().unwrap(),
                terms.iter().map(|&t| self.max(t)).min().unwrap(),
            ),
            ExtremumKind::Maximum => (
                terms.iter().map(|&t| self.min(t)).max().unwrap(),
                terms.iter().map(|&t| self.max(t)).max().unwrap(),
            ),
        };
        let result = self.derived(i64::from(low), i64::from(high));
        self.post(Extremum {
            terms: terms.to_vec(),
            result,
            kind,
        })?;
        Ok(result)
    }

    /// `result` = number of terms equal to `value`.
    pub fn count(&mut self, terms: &[VariableId], value: i32) -> Result<VariableId, PostError> {
        if terms.is_empty() {
            return Err(PostError::EmptyArray("count"));
        }
        self.check_variables(terms)?;
        let result = self.derived(0, terms.len() as i64);
        self.post(Count {
            terms: terms.to_vec(),
            value,
            result,
        })?;
        Ok(result)
    }

    /// `result = array[index]` for a constant array.
    pub fn element(&mut self, index: VariableId, array: &[i32]) -> Result<VariableId, PostError> {
        if array.is_empty() {
            return Err(PostError::EmptyArray("element"));
        }
        self.check_variable(index)?;
        let result = self.derived(
            i64::from(*array.iter().min().unwrap()),
            i64::from(*array.iter().max().unwrap()),
        );
        self.post(Element {
            index,
            array: array.to_vec(),
            result,
        })?;
        Ok(result)
    }

    pub fn bool_and(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.bool_connective(x, y, BoolOp::And)
    }

    pub fn bool_or(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.bool_connective(x, y, BoolOp::Or)
    }

    pub fn bool_xor(&mut self, x: VariableId, y: VariableId) -> Result<VariableId, PostError> {
        self.bool_connective(x, y, BoolOp::Xor)
    }

    fn bool_connective(
        &mut self,
        x: VariableId,
        y: VariableId,
        op: BoolOp,
    ) -> Result<VariableId, PostError> {
        self.check_variables(&[x, y])?;
        let result = self.derived(0, 1);
        self.post(BoolConnective {
            left: x,
            right: y,
            result,
            op,
        })?;
        Ok(result)
    }

    /// `result = (x < bound)` as a 0/1 variable.
    pub fn reify_less_than(&mut self, x: VariableId, bound: i32) -> Result<VariableId, PostError> {
        self.reify(x, bound, CompareOp::LessThan)
    }

    /// `result = (x <= bound)` as a 0/1 variable.
    pub fn reify_less_or_equals(
        &mut self,
        x: VariableId,
        bound: i32,
    ) -> Result<VariableId, PostError> {
        self.reify(x, bound, CompareOp::LessOrEquals)
    }

    /// `result = (x == bound)` as a 0/1 variable.
    pub fn reify_equals(&mut self, x: VariableId, bound: i32) -> Result<VariableId, PostError> {
        self.reify(x, bound, CompareOp::Equals)
    }

    /// `result = (x != bound)` as a 0/1 variable.
    pub fn reify_not_equals(&mut self, x: VariableId, bound: i32) -> Result<VariableId, PostError> {
        self.reify(x, bound, CompareOp::NotEquals)
    }

    fn reify(
        &mut self,
        x: VariableId,
        bound: i32,
        op: CompareOp,
    ) -> Result<VariableId, PostError> {
        self.check_variable(x)?;
        let result = self.derived(0, 1);
        self.post(ReifiedComparison {
            operand: x,
            bound,
            result,
            op,
        })?;
        Ok(result)
    }

    /// A fresh variable holding a derived expression, clamped into the
    /// representable range.
    fn derived(&mut self, low: i64, high: i64) -> VariableId {
        self.vars.grow(clamp_bound(low), clamp_bound(high), false)
    }

    // ------------------------------------------------------------------
    // Pure constraints

    pub fn less_than(&mut self, x: VariableId, y: VariableId) -> Result<(), PostError> {
        self.check_variables(&[x, y])?;
        self.post(LessThan {
            left: x,
            right: y,
            or_equal: false,
        })
    }

    pub fn less_or_equals(&mut self, x: VariableId, y: VariableId) -> Result<(), PostError> {
        self.check_variables(&[x, y])?;
        self.post(LessThan {
            left: x,
            right: y,
            or_equal: true,
        })
    }

    pub fn equals(&mut self, x: VariableId, y: VariableId) -> Result<(), PostError> {
        self.check_variables(&[x, y])?;
        self.post(Equals { left: x, right: y })
    }

    pub fn not_equals(&mut self, x: VariableId, y: VariableId) -> Result<(), PostError> {
        self.check_variables(&[x, y])?;
        if x == y {
            return Err(PostError::DuplicateVariable("not_equals"));
        }
        self.post(NotEquals { left: x, right: y })
    }

    pub fn all_different(&mut self, variables: &[VariableId]) -> Result<(), PostError> {
        if variables.is_empty() {
            return Err(PostError::EmptyArray("all_different"));
        }
        self.check_variables(variables)?;
        if has_duplicates(variables) {
            return Err(PostError::DuplicateVariable("all_different"));
        }
        self.post(AllDifferent {
            variables: variables.to_vec(),
        })
    }

    /// Every value taken by at most `capacity` of the variables.
    pub fn all_different_with_capacity(
        &mut self,
        variables: &[VariableId],
        capacity: usize,
    ) -> Result<(), PostError> {
        if variables.is_empty() {
            return Err(PostError::EmptyArray("all_different_with_capacity"));
        }
        self.check_variables(variables)?;
        if has_duplicates(variables) {
            return Err(PostError::DuplicateVariable("all_different_with_capacity"));
        }
        self.post(AllDifferentCapacity {
            variables: variables.to_vec(),
            capacity,
        })
    }

    /// `forward[i] = j` iff `backward[j] = i`.
    pub fn inverse(
        &mut self,
        forward: &[VariableId],
        backward: &[VariableId],
    ) -> Result<(), PostError> {
        if forward.is_empty() {
            return Err(PostError::EmptyArray("inverse"));
        }
        if forward.len() != backward.len() {
            return Err(PostError::MismatchedLengths {
                constraint: "inverse",
                left: forward.len(),
                right: backward.len(),
            });
        }
        self.check_variables(forward)?;
        self.check_variables(backward)?;
        self.post(Inverse {
            forward: forward.to_vec(),
            backward: backward.to_vec(),
        })
    }

    /// The variables jointly take one of the rows.
    pub fn table(
        &mut self,
        variables: &[VariableId],
        rows: Vec<Vec<i32>>,
    ) -> Result<(), PostError> {
        if variables.is_empty() {
            return Err(PostError::EmptyArray("table"));
        }
        self.check_variables(variables)?;
        if let Some(row) = rows.iter().find(|row| row.len() != variables.len()) {
            return Err(PostError::MismatchedLengths {
                constraint: "table",
                left: variables.len(),
                right: row.len(),
            });
        }
        self.post(Table {
            variables: variables.to_vec(),
            rows,
        })
    }

    /// Fixes `x` to `value`. A value outside the domain makes the problem
    /// infeasible rather than erroring.
    pub fn fix(&mut self, x: VariableId, value: i32) -> Result<(), PostError> {
        self.check_variable(x)?;
        let result = self.root_context().set(x, value);
        if result.is_err() {
            self.mark_infeasible();
        } else if !self.propagate() {
            self.infeasible = true;
        }
        Ok(())
    }

    /// Removes `value` from the domain of `x`. Emptying the domain makes the
    /// problem infeasible rather than erroring.
    pub fn remove(&mut self, x: VariableId, value: i32) -> Result<(), PostError> {
        self.check_variable(x)?;
        let result = self.root_context().remove_value(x, value);
        if result.is_err() {
            self.mark_infeasible();
        } else if !self.propagate() {
            self.infeasible = true;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Posting machinery

    fn post(&mut self, constraint: impl Constraint + 'static) -> Result<(), PostError> {
        acorn_assert_simple!(
            self.stack.at_root(),
            "constraints are posted before searching (or after a restart)"
        );

        let needs_values = constraint.revision_type() == RevisionType::Value;
        let id = self.constraints.push(ConstraintEntry {
            constraint: Box::new(constraint),
            last_check: 0,
        });
        for variable in self.constraints[id].constraint.variables() {
            let entry = self.vars.entry_mut(variable);
            entry.constraints.push(ConstraintAttachment {
                constraint: id,
                failures: 0,
            });
            if needs_values {
                entry.needs_removed_values = true;
            }
        }

        match self.run_initial(id) {
            Ok(()) => {
                if !self.propagate() {
                    self.infeasible = true;
                }
            }
            Err(EmptyDomain) => self.mark_infeasible(),
        }
        Ok(())
    }

    fn run_initial(&mut self, id: ConstraintId) -> Result<(), EmptyDomain> {
        self.counters.constraint_checks += 1;
        let Self {
            vars,
            constraints,
            queue,
            stack,
            counters,
            ..
        } = self;
        let entry = &mut constraints[id];
        entry.last_check = counters.constraint_checks;
        let mut context = PropagationContext {
            vars,
            queue,
            stack,
            counters,
            cause: Some(id),
        };
        entry.constraint.initial_arc_cons(&mut context)
    }

    fn mark_infeasible(&mut self) {
        self.queue.clear(&mut self.vars);
        self.counters.failures += 1;
        self.infeasible = true;
    }

    fn root_context(&mut self) -> PropagationContext<'_> {
        let Self {
            vars,
            queue,
            stack,
            counters,
            ..
        } = self;
        PropagationContext {
            vars,
            queue,
            stack,
            counters,
            cause: None,
        }
    }

    // ------------------------------------------------------------------
    // Propagation fixpoint

    /// Drains the event queue to the arc-consistency fixpoint. Returns
    /// `false` on inconsistency, with the queue fully cleared.
    fn propagate(&mut self) -> bool {
        while let Some(variable) = self.queue.begin_front(&mut self.vars) {
            loop {
                let index = self.queue.front_cursor();
                let Some(attachment) = self
                    .vars
                    .entry(variable)
                    .constraints
                    .get(index)
                    .copied()
                else {
                    break;
                };

                let changes_before = self.counters.domain_changes;
                let result = self.revise(attachment.constraint, variable);
                let acted = result.is_err() || self.counters.domain_changes > changes_before;

                if acted {
                    // Adaptive ordering: constraints that act often drift
                    // towards the front of the variable's list.
                    let attachments = &mut self.vars.entry_mut(variable).constraints;
                    attachments[index].failures += 1;
                    if index > 0 {
                        attachments.swap(index - 1, index);
                    }
                }

                if result.is_err() {
                    self.queue.clear(&mut self.vars);
                    self.counters.failures += 1;
                    return false;
                }
                self.queue.advance_front();
            }
            self.queue.finish_front();
        }
        true
    }

    fn revise(&mut self, id: ConstraintId, variable: VariableId) -> Result<(), EmptyDomain> {
        match self.constraints[id].constraint.revision_type() {
            RevisionType::Value => {
                let mut index = 0;
                while let Some(value) = self.queue.front_removed_value(index) {
                    self.invoke(id, variable, DomainChange::Removal(value))?;
                    index += 1;
                }
                Ok(())
            }
            RevisionType::Bounds => match self.queue.front_bound_event() {
                Some(_) => self.invoke(id, variable, DomainChange::Bounds),
                None => Ok(()),
            },
            RevisionType::Bidirectional => match self.queue.front_bound_event() {
                Some(event) => {
                    // Skip the constraint that itself caused the bound move,
                    // unless some other revision has run it since.
                    let self_inflicted = event.cause == Some(id)
                        && event.check_time == self.constraints[id].last_check;
                    if self_inflicted {
                        Ok(())
                    } else {
                        self.invoke(id, variable, DomainChange::Bounds)
                    }
                }
                None => Ok(()),
            },
        }
    }

    fn invoke(
        &mut self,
        id: ConstraintId,
        variable: VariableId,
        change: DomainChange,
    ) -> Result<(), EmptyDomain> {
        self.counters.constraint_checks += 1;
        let Self {
            vars,
            constraints,
            queue,
            stack,
            counters,
            ..
        } = self;
        let entry = &mut constraints[id];
        entry.last_check = counters.constraint_checks;
        let mut context = PropagationContext {
            vars,
            queue,
            stack,
            counters,
            cause: Some(id),
        };
        entry.constraint.local_arc_cons(&mut context, variable, change)
    }

    // ------------------------------------------------------------------
    // Search

    /// Schedules a goal; goals added at the root survive until a restart.
    pub fn add_goal(&mut self, goal: Goal) {
        self.stack.push_goal(goal);
    }

    /// Turns the search into branch and bound on `objective`: each solution
    /// must strictly improve on the previous one.
    pub fn minimize(&mut self, objective: VariableId) -> Result<(), PostError> {
        self.check_variable(objective)?;
        self.objective = Some(objective);
        Ok(())
    }

    /// Static upper bound on the objective, applied alongside the
    /// branch-and-bound tightening.
    pub fn objective_upper_limit(&mut self, bound: i32) {
        self.objective_cap = Some(bound);
    }

    /// The objective value of the best solution found so far.
    pub fn best_objective(&self) -> Option<i32> {
        self.best_objective
    }

    /// Wall-clock budget for subsequent `next_solution` calls; `None` removes
    /// the limit. The clock starts now.
    pub fn real_time_limit(&mut self, limit: Option<Duration>) {
        self.stopwatch.reset(limit);
    }

    /// Backtrack budget for subsequent `next_solution` calls, counted from
    /// the current total; `None` removes the limit.
    pub fn backtrack_limit(&mut self, limit: Option<u64>) {
        self.backtrack_stop = limit.map(|limit| self.counters.backtracks + limit);
    }

    /// Restricts exploration to the choice points whose ordinal falls in
    /// `window`, counted over the whole solve.
    pub fn choice_window(&mut self, window: Option<Range<u64>>) {
        self.stack.set_window(window);
    }

    /// Enables stochastic sub-tree elision: once a depth has enough closed
    /// frames for its statistics, alternatives at that depth are kept only
    /// with probability `1 - ratio`. Makes the search incomplete.
    pub fn simulation_ratio(&mut self, ratio: Option<f64>) {
        self.stack.set_simulation_ratio(ratio);
    }

    /// Streams one line per solution and backtrack into `writer`, for
    /// offline inspection of the search tree. Purely observational.
    pub fn search_log(&mut self, writer: Box<dyn Write>) {
        self.search_log = Some(writer);
    }

    /// Runs the search to the next solution.
    ///
    /// [`SolveResult::LimitReached`] leaves the search tree intact: a later
    /// call (typically after raising the budgets) resumes where this one
    /// stopped. After [`SolveResult::Solution`], domains stay bound to the
    /// solution until the next call.
    pub fn next_solution(&mut self) -> SolveResult {
        if self.infeasible {
            return SolveResult::Exhausted;
        }
        if self.standing_on_solution {
            self.standing_on_solution = false;
            if !self.backtrack() {
                return SolveResult::Exhausted;
            }
        }

        loop {
            if self.budget_exhausted() {
                return SolveResult::LimitReached;
            }

            // Branch and bound: the bound is re-applied every iteration
            // because backtracking restores the domains it pruned.
            if !self.apply_objective_bound() || !self.propagate() {
                if !self.backtrack() {
                    return SolveResult::Exhausted;
                }
                continue;
            }

            let Some(goal) = self.stack.next_goal() else {
                return self.accept_solution();
            };
            if !self.execute_goal(goal) && !self.backtrack() {
                return SolveResult::Exhausted;
            }
        }
    }

    /// Abandons the current search tree: every frame above the root is
    /// undone and the root agenda is cleared. Constraints, posting-time
    /// prunings and the best objective so far are kept.
    pub fn restart(&mut self) {
        self.queue.clear(&mut self.vars);
        self.stack.restore_root(&mut self.vars);
        self.standing_on_solution = false;
        debug!("search restarted after {} backtracks", self.counters.backtracks);
    }

    fn budget_exhausted(&self) -> bool {
        self.stopwatch.budget_exhausted()
            || self
                .backtrack_stop
                .is_some_and(|stop| self.counters.backtracks >= stop)
    }

    fn apply_objective_bound(&mut self) -> bool {
        let Some(objective) = self.objective else {
            return true;
        };
        let from_best = self.best_objective.map(|best| best - 1);
        let limit = match (from_best, self.objective_cap) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => return true,
        };
        self.root_context().set_max(objective, limit).is_ok()
    }

    fn accept_solution(&mut self) -> SolveResult {
        self.counters.solutions_found += 1;
        self.standing_on_solution = true;
        if let Some(objective) = self.objective {
            self.best_objective = Some(self.min(objective));
        }
        if let Some(writer) = &mut self.search_log {
            let _ = writeln!(
                writer,
                "solution {} at depth {} ({} backtracks)",
                self.counters.solutions_found,
                self.stack.depth() - 1,
                self.counters.backtracks
            );
        }
        SolveResult::Solution
    }

    /// Executes one step of the goal agenda. Returns `false` when the step
    /// failed and the search must backtrack.
    fn execute_goal(&mut self, goal: Goal) -> bool {
        match goal {
            Goal::And(first, second) => {
                // LIFO agenda: the first sub-goal runs next.
                self.stack.push_goal(Rc::unwrap_or_clone(second));
                self.stack.push_goal(Rc::unwrap_or_clone(first));
                true
            }
            Goal::Or(first, second) => {
                // The choice point snapshots the agenda before the first
                // branch is scheduled, so the continuation is reinstated for
                // the alternative.
                if !self.stack.push_choice(Rc::unwrap_or_clone(second), self.rng.as_mut()) {
                    return false;
                }
                self.counters.peak_depth = self.counters.peak_depth.max(self.stack.depth() as u64 - 1);
                self.stack.push_goal(Rc::unwrap_or_clone(first));
                true
            }
            Goal::Leaf(leaf) => {
                let Self {
                    vars,
                    queue,
                    stack,
                    counters,
                    rng,
                    ..
                } = self;
                let mut context = GoalContext {
                    propagation: PropagationContext {
                        vars,
                        queue,
                        stack,
                        counters,
                        cause: None,
                    },
                    rng: rng.as_mut(),
                };
                match leaf.execute(&mut context) {
                    Ok(Some(successor)) => {
                        self.stack.push_goal(successor);
                        true
                    }
                    Ok(None) => true,
                    Err(EmptyDomain) => {
                        self.queue.clear(&mut self.vars);
                        self.counters.failures += 1;
                        false
                    }
                }
            }
        }
    }

    /// Pops frames until one still has an unexplored alternative, which
    /// becomes the next goal. Returns `false` when the tree is exhausted.
    fn backtrack(&mut self) -> bool {
        self.counters.backtracks += 1;
        self.queue.clear(&mut self.vars);
        if let Some(writer) = &mut self.search_log {
            let _ = writeln!(
                writer,
                "backtrack {} from depth {}",
                self.counters.backtracks,
                self.stack.depth() - 1
            );
        }
        while !self.stack.at_root() {
            if let Some(alternative) = self.stack.pop_restore(&mut self.vars) {
                self.stack.push_goal(alternative);
                return true;
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Diagnostics

    /// Writes the variable/constraint bipartite graph in graphviz format.
    pub fn write_constraint_network(&self, writer: &mut dyn Write) -> io::Result<()> {
        graph_export::write_constraint_network(&self.vars, &self.constraints, writer)
    }

    /// Emits the solver counters through the statistics sink, if one has
    /// been configured.
    pub fn log_statistics(&self) {
        if !should_log_statistics() {
            return;
        }
        log_statistic("variables", self.vars.len());
        log_statistic("constraints", self.constraints.len());
        log_statistic("constraint_checks", self.counters.constraint_checks);
        log_statistic("domain_changes", self.counters.domain_changes);
        log_statistic("failures", self.counters.failures);
        log_statistic("backtracks", self.counters.backtracks);
        log_statistic("solutions_found", self.counters.solutions_found);
        log_statistic("choice_points", self.stack.choice_points());
        log_statistic("peak_depth", self.counters.peak_depth);
        log_statistic("elapsed_seconds", self.stopwatch.elapsed().as_secs_f64());
    }
}

fn has_duplicates(variables: &[VariableId]) -> bool {
    let mut seen: Vec<VariableId> = variables.to_vec();
    seen.sort_unstable();
    seen.windows(2).any(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::labeling;
    use crate::search::VariableOrder;

    #[test]
    fn posting_an_infeasible_fix_is_sticky() {
        let mut manager = ProblemManager::new();
        let x = manager.new_variable(0, 5).unwrap();
        manager.fix(x, 9).unwrap();

        assert!(manager.is_infeasible());
        assert_eq!(manager.next_solution(), SolveResult::Exhausted);
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let mut manager = ProblemManager::new();
        assert!(matches!(
            manager.new_variable(5, 2),
            Err(PostError::InvalidBounds { .. })
        ));
        assert!(manager.new_variable(i32::MIN, 0).is_err());
    }

    #[test]
    fn foreign_variable_is_detected() {
        let mut manager_a = ProblemManager::new();
        let mut manager_b = ProblemManager::new();
        let _ = manager_a.new_variable(0, 5).unwrap();
        let x = manager_a.new_variable(0, 5).unwrap();

        assert!(matches!(
            manager_b.minimize(x),
            Err(PostError::UnknownVariable(_))
        ));
    }

    #[test]
    fn enumerates_all_assignments_without_constraints() {
        let mut manager = ProblemManager::new();
        let x = manager.new_variable(0, 1).unwrap();
        let y = manager.new_variable(0, 1).unwrap();
        manager.add_goal(labeling(&[x, y], VariableOrder::InputOrder));

        let mut solutions = Vec::new();
        while manager.next_solution() == SolveResult::Solution {
            solutions.push((manager.value(x), manager.value(y)));
        }
        assert_eq!(solutions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn restart_recovers_the_full_domains() {
        let mut manager = ProblemManager::new();
        let x = manager.new_variable(0, 3).unwrap();
        manager.add_goal(labeling(&[x], VariableOrder::InputOrder));

        assert_eq!(manager.next_solution(), SolveResult::Solution);
        assert_eq!(manager.value(x), 0);

        manager.restart();
        assert_eq!(manager.size(x), 4);

        manager.add_goal(labeling(&[x], VariableOrder::InputOrder));
        assert_eq!(manager.next_solution(), SolveResult::Solution);
        assert_eq!(manager.value(x), 0);
    }

    #[test]
    fn backtrack_budget_is_resumable() {
        let mut manager = ProblemManager::new();
        let vars: Vec<_> = (0..4)
            .map(|_| manager.new_variable(0, 3).unwrap())
            .collect();
        manager.all_different(&vars).unwrap();
        manager.add_goal(labeling(&vars, VariableOrder::InputOrder));

        manager.backtrack_limit(Some(0));
        let mut count = 0;
        loop {
            match manager.next_solution() {
                SolveResult::Solution => count += 1,
                SolveResult::LimitReached => manager.backtrack_limit(Some(1)),
                SolveResult::Exhausted => break,
            }
        }
        // 4 variables over 4 values: every permutation shows up despite the
        // piecemeal budget.
        assert_eq!(count, 24);
    }
}
