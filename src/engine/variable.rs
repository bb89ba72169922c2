use std::fmt;

use crate::basic_types::EmptyDomain;
use crate::engine::propagation::ConstraintId;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::engine::bitset_domain::BitsetDomain;
use crate::engine::search_tree::SearchStack;

/// Handle to a constrained variable, valid only for the manager that created
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    id: u32,
}

impl VariableId {
    pub(crate) fn new(id: u32) -> VariableId {
        VariableId { id }
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }
}

impl StorageKey for VariableId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        VariableId { id: index as u32 }
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.id)
    }
}

/// A constraint's attachment to a variable, with the failure count driving the
/// adaptive propagation-order heuristic.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConstraintAttachment {
    pub(crate) constraint: ConstraintId,
    pub(crate) failures: u32,
}

#[derive(Debug)]
pub(crate) struct VariableEntry {
    pub(crate) domain: BitsetDomain,
    /// Attached constraints in propagation order; mutated by the adaptive
    /// reordering heuristic.
    pub(crate) constraints: Vec<ConstraintAttachment>,
    /// Index of the live queue item for this variable, if one is pending.
    /// At most one queue item exists per variable at any time.
    pub(crate) queue_slot: Option<usize>,
    /// Transparent variables are scratch state of constraint internals;
    /// backtracking does not restore them.
    pub(crate) transparent: bool,
    /// Set when some attached constraint requires value-level consistency, in
    /// which case every removed value is recorded on the queue item.
    pub(crate) needs_removed_values: bool,
    pub(crate) name: Option<String>,
}

/// Arena of all variables owned by one problem manager.
#[derive(Debug, Default)]
pub(crate) struct VariableStore {
    entries: KeyedVec<VariableId, VariableEntry>,
}

impl VariableStore {
    pub(crate) fn grow(&mut self, min: i32, max: i32, transparent: bool) -> VariableId {
        self.entries.push(VariableEntry {
            domain: BitsetDomain::new(min, max),
            constraints: Vec::new(),
            queue_slot: None,
            transparent,
            needs_removed_values: false,
            name: None,
        })
    }

    pub(crate) fn contains(&self, variable: VariableId) -> bool {
        self.entries.contains_key(variable)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = VariableId> {
        self.entries.keys()
    }

    pub(crate) fn entry(&self, variable: VariableId) -> &VariableEntry {
        &self.entries[variable]
    }

    pub(crate) fn entry_mut(&mut self, variable: VariableId) -> &mut VariableEntry {
        &mut self.entries[variable]
    }

    pub(crate) fn domain(&self, variable: VariableId) -> &BitsetDomain {
        &self.entries[variable].domain
    }

    /// Applies `remove_range` to the variable's domain, snapshotting the
    /// domain into the current search frame first (at most once per frame
    /// generation, and never for transparent variables).
    ///
    /// Returns whether the bounds moved and which values were removed (the
    /// latter only when some attached constraint tracks removals). On
    /// [`EmptyDomain`] the domain is left untouched.
    pub(crate) fn remove_range(
        &mut self,
        variable: VariableId,
        lo: i32,
        hi: i32,
        stack: &mut SearchStack,
    ) -> Result<AppliedRemoval, EmptyDomain> {
        let entry = &mut self.entries[variable];

        let old_min = entry.domain.min();
        let old_max = entry.domain.max();

        // Redundant removals must stay silent: no snapshot, no queue event.
        if hi < lo || !entry.domain.contains_range_any(lo, hi) {
            return Ok(AppliedRemoval::default());
        }

        if !entry.transparent {
            let top = stack.top_id();
            if entry.domain.last_save_id != top {
                let snapshot = entry.domain.clone();
                entry.domain.last_save_id = top;
                stack.record_snapshot(variable, snapshot);
            }
        }

        let removed_values = if entry.needs_removed_values {
            let mut values = Vec::new();
            let mut value = entry.domain.next(lo - 1);
            while value <= hi && value <= old_max {
                values.push(value);
                value = entry.domain.next(value);
            }
            values
        } else {
            Vec::new()
        };

        if !entry.domain.remove_range(lo, hi) {
            return Err(EmptyDomain);
        }

        Ok(AppliedRemoval {
            changed: true,
            bounds_moved: entry.domain.min() != old_min || entry.domain.max() != old_max,
            removed_values,
        })
    }

    /// Restores a snapshot taken by [`VariableStore::remove_range`]; the sole
    /// backtracking primitive.
    pub(crate) fn restore_snapshot(&mut self, variable: VariableId, snapshot: BitsetDomain) {
        self.entries[variable].domain = snapshot;
    }
}

/// The effect of one `remove_range` call, used to decide what to enqueue.
#[derive(Debug, Default)]
pub(crate) struct AppliedRemoval {
    pub(crate) changed: bool,
    pub(crate) bounds_moved: bool,
    pub(crate) removed_values: Vec<i32>,
}

impl BitsetDomain {
    /// Whether any present value lies in `[lo, hi]`.
    pub(crate) fn contains_range_any(&self, lo: i32, hi: i32) -> bool {
        self.next(lo - 1) <= hi
    }
}
