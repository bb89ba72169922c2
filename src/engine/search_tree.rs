use std::ops::Range;
use std::time::Instant;

use crate::acorn_assert_moderate;
use crate::acorn_assert_simple;
use crate::basic_types::CumulativeMovingAverage;
use crate::basic_types::Random;
use crate::engine::bitset_domain::BitsetDomain;
use crate::engine::variable::VariableId;
use crate::engine::variable::VariableStore;
use crate::search::Goal;

/// Identity of a search frame, used by domains to detect whether they were
/// already snapshotted into the current frame.
///
/// The generation is globally monotone, so an id is never reused even when the
/// tree revisits the same depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct HistoryId {
    pub(crate) level: u32,
    pub(crate) generation: u32,
}

impl HistoryId {
    /// Matches no live frame; the initial `last_save_id` of every domain.
    pub(crate) const NONE: HistoryId = HistoryId {
        level: u32::MAX,
        generation: 0,
    };
}

/// One frame of the backtracking stack.
///
/// A frame is opened per choice point. It owns the domain snapshots taken
/// since it was entered, the agenda as it stood when the choice was opened,
/// and the unexplored alternative of the choice.
#[derive(Debug)]
struct Frame {
    id: HistoryId,
    /// The right branch of the disjunction that opened this frame; taken over
    /// on backtracking. `None` once consumed (or elided).
    next_choice: Option<Goal>,
    /// The pending agenda at the moment the choice point opened. The first
    /// branch consumes the live agenda; taking the alternative reinstates
    /// this snapshot so the continuation runs again on the other side.
    resume_agenda: Vec<Goal>,
    /// Domain snapshots to restore when this frame is popped, in save order.
    saved: Vec<(VariableId, BitsetDomain)>,
    entered: Instant,
    /// Frames opened anywhere below this one, accumulated as children close.
    descendants: u64,
}

impl Frame {
    fn new(id: HistoryId, next_choice: Option<Goal>, resume_agenda: Vec<Goal>) -> Frame {
        Frame {
            id,
            next_choice,
            resume_agenda,
            saved: Vec::new(),
            entered: Instant::now(),
            descendants: 0,
        }
    }
}

/// Per-depth averages over closed frames, feeding the stochastic elision
/// heuristic and the search statistics.
#[derive(Debug, Default)]
pub(crate) struct DepthStats {
    pub(crate) descendants: CumulativeMovingAverage,
    pub(crate) micros: CumulativeMovingAverage,
}

/// The backtracking search tree: a stack of frames over the variable store.
///
/// The root frame is created on construction and never popped; state mutated
/// while the root is the top frame is permanent (initial propagation, posted
/// constraints' prunings).
#[derive(Debug)]
pub(crate) struct SearchStack {
    frames: Vec<Frame>,
    /// The pending goals, top of the agenda last. Shared across frames: each
    /// choice point snapshots it into its frame for the alternative branch.
    agenda: Vec<Goal>,
    next_generation: u32,
    depth_stats: Vec<DepthStats>,
    /// Restricts exploration to choice points whose ordinal falls inside the
    /// window. Choice points outside it are refused.
    window: Option<Range<u64>>,
    /// Ordinal of the next choice point, counted over the whole solve.
    choice_points: u64,
    /// When set, a matured choice point keeps its alternative only with this
    /// probability; the tree becomes incomplete.
    simulation_ratio: Option<f64>,
}

/// Number of closed frames a depth must have seen before stochastic elision
/// trusts its statistics.
const ELISION_WARMUP_SAMPLES: u64 = 32;

impl Default for SearchStack {
    fn default() -> Self {
        SearchStack::new()
    }
}

impl SearchStack {
    pub(crate) fn new() -> SearchStack {
        SearchStack {
            frames: vec![Frame::new(
                HistoryId {
                    level: 0,
                    generation: 0,
                },
                None,
                Vec::new(),
            )],
            agenda: Vec::new(),
            next_generation: 1,
            depth_stats: Vec::new(),
            window: None,
            choice_points: 0,
            simulation_ratio: None,
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn at_root(&self) -> bool {
        self.frames.len() == 1
    }

    pub(crate) fn top_id(&self) -> HistoryId {
        self.frames.last().expect("the root frame is never popped").id
    }

    pub(crate) fn choice_points(&self) -> u64 {
        self.choice_points
    }

    pub(crate) fn set_window(&mut self, window: Option<Range<u64>>) {
        self.window = window;
    }

    pub(crate) fn set_simulation_ratio(&mut self, ratio: Option<f64>) {
        if let Some(ratio) = ratio {
            acorn_assert_simple!(
                (0.0..=1.0).contains(&ratio),
                "a simulation ratio is a probability"
            );
        }
        self.simulation_ratio = ratio;
    }

    pub(crate) fn depth_stats(&self) -> &[DepthStats] {
        &self.depth_stats
    }

    /// Records a domain snapshot into the top frame. Called by the variable
    /// store on the first mutation of a domain within the frame.
    pub(crate) fn record_snapshot(&mut self, variable: VariableId, snapshot: BitsetDomain) {
        acorn_assert_moderate!(
            self.frames
                .last()
                .unwrap()
                .saved
                .iter()
                .all(|(saved, _)| *saved != variable),
            "a domain is snapshotted at most once per frame"
        );
        self.frames.last_mut().unwrap().saved.push((variable, snapshot));
    }

    pub(crate) fn top_snapshot_count(&self) -> usize {
        self.frames.last().unwrap().saved.len()
    }

    /// Opens a choice point whose unexplored branch is `alternative`.
    ///
    /// Returns `false` when the choice point falls outside the search window,
    /// in which case no frame is opened and the caller must treat the
    /// disjunction as failed. When stochastic elision fires, the frame is
    /// opened but the alternative is dropped.
    pub(crate) fn push_choice(&mut self, alternative: Goal, rng: &mut dyn Random) -> bool {
        let ordinal = self.choice_points;
        self.choice_points += 1;

        if let Some(window) = &self.window {
            if !window.contains(&ordinal) {
                return false;
            }
        }

        let level = self.frames.len() as u32;
        let next_choice = if self.elide_alternative(level as usize, rng) {
            None
        } else {
            Some(alternative)
        };

        let id = HistoryId {
            level,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        // Shallow: goals are reference counted.
        let resume_agenda = self.agenda.clone();
        self.frames.push(Frame::new(id, next_choice, resume_agenda));
        true
    }

    fn elide_alternative(&mut self, level: usize, rng: &mut dyn Random) -> bool {
        let Some(ratio) = self.simulation_ratio else {
            return false;
        };
        let matured = self
            .depth_stats
            .get(level)
            .is_some_and(|stats| stats.descendants.num_terms() >= ELISION_WARMUP_SAMPLES);
        matured && rng.generate_bool(ratio)
    }

    /// Pushes a pending goal onto the agenda.
    pub(crate) fn push_goal(&mut self, goal: Goal) {
        self.agenda.push(goal);
    }

    /// Pops the next pending goal. `None` means the agenda is empty: the
    /// current assignment is a solution of the goal stack.
    pub(crate) fn next_goal(&mut self) -> Option<Goal> {
        self.agenda.pop()
    }

    /// Pops the top frame, restoring every domain it snapshotted and the
    /// agenda as it stood when the frame's choice point opened, and returns
    /// the unexplored alternative of that choice.
    ///
    /// Must not be called at the root.
    pub(crate) fn pop_restore(&mut self, vars: &mut VariableStore) -> Option<Goal> {
        acorn_assert_simple!(!self.at_root(), "the root frame is never popped");
        let frame = self.frames.pop().unwrap();
        for (variable, snapshot) in frame.saved.into_iter().rev() {
            vars.restore_snapshot(variable, snapshot);
        }
        self.agenda = frame.resume_agenda;

        let level = frame.id.level as usize;
        if self.depth_stats.len() <= level {
            self.depth_stats.resize_with(level + 1, DepthStats::default);
        }
        self.depth_stats[level]
            .descendants
            .add_term(frame.descendants);
        self.depth_stats[level]
            .micros
            .add_term(frame.entered.elapsed().as_micros() as u64);

        self.frames.last_mut().unwrap().descendants += frame.descendants + 1;

        frame.next_choice
    }

    /// Pops every frame above the root, restoring domains, and clears the
    /// root agenda. Prunings made at the root itself are kept.
    pub(crate) fn restore_root(&mut self, vars: &mut VariableStore) {
        while !self.at_root() {
            let _ = self.pop_restore(vars);
        }
        self.agenda.clear();
        let root = self.frames.last_mut().unwrap();
        root.saved.clear();
        // A fresh generation so that post-restart root mutations snapshot
        // again (harmlessly, into the cleared vector).
        root.id.generation = self.next_generation;
        self.next_generation += 1;
    }

    #[cfg(test)]
    pub(crate) fn push_frame_for_test(&mut self) {
        let id = HistoryId {
            level: self.frames.len() as u32,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.frames.push(Frame::new(id, None, Vec::new()));
    }

    #[cfg(test)]
    pub(crate) fn pop_for_test(&mut self) -> Vec<(VariableId, BitsetDomain)> {
        let mut saved = self.frames.pop().unwrap().saved;
        saved.reverse();
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::set_value;

    fn dummy_goal() -> Goal {
        set_value(VariableId::new(0), 0)
    }

    #[test]
    fn window_refuses_out_of_range_choice_points() {
        let mut stack = SearchStack::new();
        let mut rng = crate::basic_types::TestRandom::default();
        stack.set_window(Some(0..1));

        assert!(stack.push_choice(dummy_goal(), &mut rng));
        assert!(!stack.push_choice(dummy_goal(), &mut rng));
        // The refused choice point still consumed an ordinal.
        assert_eq!(stack.choice_points(), 2);
    }

    #[test]
    fn pop_returns_the_alternative_and_accumulates_descendants() {
        let mut stack = SearchStack::new();
        let mut rng = crate::basic_types::TestRandom::default();

        assert!(stack.push_choice(dummy_goal(), &mut rng));
        assert!(stack.push_choice(dummy_goal(), &mut rng));

        let mut vars = VariableStore::default();
        assert!(stack.pop_restore(&mut vars).is_some());
        assert!(stack.pop_restore(&mut vars).is_some());
        assert!(stack.at_root());

        // Both closed frames count as descendants of the root.
        assert_eq!(stack.frames[0].descendants, 2);
        assert_eq!(stack.depth_stats()[1].descendants.num_terms(), 1);
    }

    #[test]
    fn goals_are_drained_last_in_first_out() {
        let mut stack = SearchStack::new();
        let mut rng = crate::basic_types::TestRandom::default();

        stack.push_goal(set_value(VariableId::new(0), 1));
        assert!(stack.push_choice(dummy_goal(), &mut rng));
        stack.push_goal(set_value(VariableId::new(0), 2));

        assert!(stack.next_goal().is_some());
        assert!(stack.next_goal().is_some());
        assert!(stack.next_goal().is_none());
    }

    #[test]
    fn taking_the_alternative_reinstates_the_pending_agenda() {
        let mut stack = SearchStack::new();
        let mut rng = crate::basic_types::TestRandom::default();
        let mut vars = VariableStore::default();

        // A continuation is pending when the choice point opens.
        stack.push_goal(set_value(VariableId::new(0), 7));
        assert!(stack.push_choice(dummy_goal(), &mut rng));

        // The first branch consumes it.
        assert!(stack.next_goal().is_some());
        assert!(stack.next_goal().is_none());

        // Backtracking into the alternative brings it back, so the
        // continuation also runs on the other side of the choice.
        assert!(stack.pop_restore(&mut vars).is_some());
        assert!(stack.next_goal().is_some());
        assert!(stack.next_goal().is_none());
    }

    #[test]
    fn restore_root_rewinds_domains_but_keeps_root_prunings() {
        let mut stack = SearchStack::new();
        let mut rng = crate::basic_types::TestRandom::default();
        let mut vars = VariableStore::default();
        let x = vars.grow(0, 9, false);

        // Root-level pruning is permanent.
        let _ = vars.remove_range(x, 0, 2, &mut stack).unwrap();

        assert!(stack.push_choice(dummy_goal(), &mut rng));
        let _ = vars.remove_range(x, 3, 5, &mut stack).unwrap();

        stack.restore_root(&mut vars);
        assert_eq!(vars.domain(x).min(), 3);
        assert_eq!(vars.domain(x).max(), 9);
    }
}
