//! Arc consistency observed through the public API, without labeling.

use acorn_solver::ProblemManager;
use acorn_solver::SolveResult;

#[test]
fn equality_chains_channel_holes_both_ways() {
    let mut manager = ProblemManager::new();
    let x = manager.new_variable(0, 9).unwrap();
    let y = manager.offset(x, 5).unwrap();

    manager.remove(x, 3).unwrap();
    manager.remove(y, 12).unwrap();

    // No goals: the first call only runs propagation to a fixpoint.
    assert_eq!(manager.next_solution(), SolveResult::Solution);
    assert_eq!(manager.min(y), 5);
    assert_eq!(manager.max(y), 14);
    let x_values: Vec<_> = manager.domain_values(x).collect();
    assert!(!x_values.contains(&3));
    assert!(!x_values.contains(&7));
    assert_eq!(x_values.len(), 8);
}

#[test]
fn scaled_variables_only_hold_multiples() {
    let mut manager = ProblemManager::new();
    let x = manager.new_variable(0, 4).unwrap();
    let y = manager.scaled(3, x).unwrap();

    assert_eq!(manager.next_solution(), SolveResult::Solution);
    let values: Vec<_> = manager.domain_values(y).collect();
    assert_eq!(values, vec![0, 3, 6, 9, 12]);
}

#[test]
fn bounds_reasoning_composes_across_constraints() {
    let mut manager = ProblemManager::new();
    let x = manager.new_variable(0, 100).unwrap();
    let y = manager.new_variable(0, 100).unwrap();
    let z = manager.plus(x, y).unwrap();

    let cap = manager.new_variable(10, 10).unwrap();
    let four = manager.new_variable(4, 4).unwrap();
    manager.less_or_equals(z, cap).unwrap();
    manager.less_or_equals(four, x).unwrap();

    assert_eq!(manager.next_solution(), SolveResult::Solution);
    assert_eq!(manager.max(y), 6);
    assert_eq!(manager.max(x), 10);
    assert_eq!(manager.min(z), 4);
}

#[test]
fn propagation_is_idempotent_at_the_fixpoint() {
    let mut manager = ProblemManager::new();
    let vars: Vec<_> = (0..3)
        .map(|_| manager.new_variable(0, 2).unwrap())
        .collect();
    manager.all_different(&vars).unwrap();
    manager.fix(vars[0], 1).unwrap();

    assert_eq!(manager.next_solution(), SolveResult::Solution);
    // Re-entering the solver from a standing solution with no goals reports
    // exhaustion and leaves every domain as the fixpoint left it.
    assert_eq!(manager.next_solution(), SolveResult::Exhausted);

    let a: Vec<_> = manager.domain_values(vars[1]).collect();
    let b: Vec<_> = manager.domain_values(vars[2]).collect();
    assert_eq!(a, vec![0, 2]);
    assert_eq!(b, vec![0, 2]);
}

#[test]
fn wipeout_during_posting_makes_the_problem_infeasible() {
    let mut manager = ProblemManager::new();
    let x = manager.new_variable(0, 5).unwrap();
    let y = manager.new_variable(6, 9).unwrap();
    manager.equals(x, y).unwrap();

    assert_eq!(manager.next_solution(), SolveResult::Exhausted);
}
