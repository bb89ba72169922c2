use crate::acorn_assert_moderate;
use crate::engine::propagation::ConstraintId;
use crate::engine::variable::VariableId;
use crate::engine::variable::VariableStore;

/// A pending "this variable's domain changed" event.
///
/// At most one item is pending per variable: further changes to a variable
/// with a pending item are coalesced into it through the variable's
/// `queue_slot`. This invariant is what makes the coarse-grained propagation
/// sound — a constraint re-examining the variable sees the union of
/// everything that happened since the last drain. Once an item's scan begins
/// it gives up the slot, so changes made during the scan open a fresh item
/// with a fresh cursor.
#[derive(Debug)]
struct QueueItem {
    variable: VariableId,
    /// Cursor into the variable's constraint list: the scan resumes here
    /// rather than restarting from zero.
    current_constraint: usize,
    /// Set when the bounds moved; carries the triggering constraint and the
    /// constraint-check timestamp at which it fired.
    bound_event: Option<BoundEvent>,
    /// The individual values removed, recorded only when some constraint on
    /// the variable requires value-level consistency.
    removed_values: Vec<i32>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct BoundEvent {
    pub(crate) cause: Option<ConstraintId>,
    pub(crate) check_time: u64,
}

/// The arc-consistency event queue, drained to a fixpoint by the manager.
///
/// Draining an item is a small state machine: `begin_front` opens a scan over
/// the front variable's constraint list, `advance_front` moves its cursor
/// past a revised constraint, and `finish_front` retires the item once the
/// list is exhausted.
#[derive(Debug, Default)]
pub(crate) struct AcQueue {
    items: Vec<QueueItem>,
    head: usize,
}

impl AcQueue {
    pub(crate) fn is_empty(&self) -> bool {
        self.head >= self.items.len()
    }

    /// Records a domain change for `variable`, updating the existing pending
    /// item when there is one.
    pub(crate) fn enqueue(
        &mut self,
        vars: &mut VariableStore,
        variable: VariableId,
        bounds_moved: bool,
        removed_values: Vec<i32>,
        cause: Option<ConstraintId>,
        check_time: u64,
    ) {
        let entry = vars.entry_mut(variable);

        if let Some(slot) = entry.queue_slot {
            acorn_assert_moderate!(self.items[slot].variable == variable);
            let item = &mut self.items[slot];
            if bounds_moved {
                // The latest firing wins; the de-duplication in the engine
                // only ever needs the most recent cause.
                item.bound_event = Some(BoundEvent { cause, check_time });
            }
            item.removed_values.extend(removed_values);
            return;
        }

        let slot = self.items.len();
        self.items.push(QueueItem {
            variable,
            current_constraint: 0,
            bound_event: bounds_moved.then_some(BoundEvent { cause, check_time }),
            removed_values,
        });
        entry.queue_slot = Some(slot);
    }

    /// Opens the scan of the front item and returns its variable, or `None`
    /// once the queue is drained. Releases the variable's queue slot so that
    /// changes made during the scan produce a fresh item.
    pub(crate) fn begin_front(&mut self, vars: &mut VariableStore) -> Option<VariableId> {
        if self.head >= self.items.len() {
            // Reclaim the storage once the queue fully drains.
            self.items.clear();
            self.head = 0;
            return None;
        }
        let variable = self.items[self.head].variable;
        vars.entry_mut(variable).queue_slot = None;
        Some(variable)
    }

    /// The front item's position in its variable's constraint list.
    pub(crate) fn front_cursor(&self) -> usize {
        self.items[self.head].current_constraint
    }

    /// Moves the front item's cursor past the constraint just revised.
    pub(crate) fn advance_front(&mut self) {
        self.items[self.head].current_constraint += 1;
    }

    pub(crate) fn front_bound_event(&self) -> Option<BoundEvent> {
        self.items[self.head].bound_event
    }

    /// The `index`-th recorded removal of the front item, if any.
    pub(crate) fn front_removed_value(&self, index: usize) -> Option<i32> {
        self.items[self.head].removed_values.get(index).copied()
    }

    /// Retires the front item after its constraint list has been exhausted.
    pub(crate) fn finish_front(&mut self) {
        self.items[self.head].removed_values = Vec::new();
        self.head += 1;
    }

    /// Empties the queue, releasing every pending variable's slot. Called on
    /// inconsistency: the fixpoint is abandoned wholesale.
    pub(crate) fn clear(&mut self, vars: &mut VariableStore) {
        for item in self.items.drain(..).skip(self.head) {
            vars.entry_mut(item.variable).queue_slot = None;
        }
        self.head = 0;
    }
}
