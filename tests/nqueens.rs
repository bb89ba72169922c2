//! End-to-end N-queens: one queen per column, attacking placements excluded
//! through three `all_different` constraints over the rows and both
//! diagonals.

use acorn_solver::search::labeling;
use acorn_solver::search::VariableOrder;
use acorn_solver::ProblemManager;
use acorn_solver::SolveResult;
use acorn_solver::VariableId;

fn post_queens(manager: &mut ProblemManager, n: i32) -> Vec<VariableId> {
    let queens: Vec<_> = (0..n)
        .map(|_| manager.new_variable(0, n - 1).unwrap())
        .collect();

    let up_diagonals: Vec<_> = queens
        .iter()
        .enumerate()
        .map(|(column, &queen)| manager.offset(queen, column as i32).unwrap())
        .collect();
    let down_diagonals: Vec<_> = queens
        .iter()
        .enumerate()
        .map(|(column, &queen)| manager.offset(queen, -(column as i32)).unwrap())
        .collect();

    manager.all_different(&queens).unwrap();
    manager.all_different(&up_diagonals).unwrap();
    manager.all_different(&down_diagonals).unwrap();

    queens
}

fn count_solutions(n: i32) -> (usize, Vec<Vec<i32>>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut manager = ProblemManager::new();
    let queens = post_queens(&mut manager, n);
    manager.add_goal(labeling(&queens, VariableOrder::MostConstrainedFirst));

    let mut solutions = Vec::new();
    while manager.next_solution() == SolveResult::Solution {
        solutions.push(queens.iter().map(|&q| manager.value(q)).collect());
    }
    (solutions.len(), solutions)
}

#[test]
fn four_queens_has_exactly_two_solutions() {
    let (count, solutions) = count_solutions(4);
    assert_eq!(count, 2);
    assert!(solutions.contains(&vec![1, 3, 0, 2]));
    assert!(solutions.contains(&vec![2, 0, 3, 1]));
}

#[test]
fn six_queens_has_exactly_four_solutions() {
    let (count, solutions) = count_solutions(6);
    assert_eq!(count, 4);

    for solution in &solutions {
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_ne!(solution[i], solution[j]);
                assert_ne!(
                    (solution[i] - solution[j]).abs(),
                    (j as i32 - i as i32).abs()
                );
            }
        }
    }
}

#[test]
fn three_queens_is_unsatisfiable() {
    let mut manager = ProblemManager::new();
    let queens = post_queens(&mut manager, 3);
    manager.add_goal(labeling(&queens, VariableOrder::InputOrder));
    assert_eq!(manager.next_solution(), SolveResult::Exhausted);
}
