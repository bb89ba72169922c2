//! The SEND + MORE = MONEY alphametic, built from scaled digits, sums and
//! `all_different`. It has exactly one solution.

use acorn_solver::search::labeling;
use acorn_solver::search::VariableOrder;
use acorn_solver::ProblemManager;
use acorn_solver::SolveResult;

#[test]
fn send_more_money_has_the_unique_known_solution() {
    let mut manager = ProblemManager::new();

    // Leading letters may not be zero.
    let s = manager.new_variable_named(1, 9, "S").unwrap();
    let e = manager.new_variable_named(0, 9, "E").unwrap();
    let n = manager.new_variable_named(0, 9, "N").unwrap();
    let d = manager.new_variable_named(0, 9, "D").unwrap();
    let m = manager.new_variable_named(1, 9, "M").unwrap();
    let o = manager.new_variable_named(0, 9, "O").unwrap();
    let r = manager.new_variable_named(0, 9, "R").unwrap();
    let y = manager.new_variable_named(0, 9, "Y").unwrap();
    let letters = [s, e, n, d, m, o, r, y];

    manager.all_different(&letters).unwrap();

    let send = {
        let terms = [
            manager.scaled(1000, s).unwrap(),
            manager.scaled(100, e).unwrap(),
            manager.scaled(10, n).unwrap(),
            d,
        ];
        manager.sum(&terms).unwrap()
    };
    let more = {
        let terms = [
            manager.scaled(1000, m).unwrap(),
            manager.scaled(100, o).unwrap(),
            manager.scaled(10, r).unwrap(),
            e,
        ];
        manager.sum(&terms).unwrap()
    };
    let money = {
        let terms = [
            manager.scaled(10000, m).unwrap(),
            manager.scaled(1000, o).unwrap(),
            manager.scaled(100, n).unwrap(),
            manager.scaled(10, e).unwrap(),
            y,
        ];
        manager.sum(&terms).unwrap()
    };
    let left = manager.plus(send, more).unwrap();
    manager.equals(left, money).unwrap();

    manager.add_goal(labeling(&letters, VariableOrder::MostConstrainedFirst));

    assert_eq!(manager.next_solution(), SolveResult::Solution);
    assert_eq!(manager.value(s), 9);
    assert_eq!(manager.value(e), 5);
    assert_eq!(manager.value(n), 6);
    assert_eq!(manager.value(d), 7);
    assert_eq!(manager.value(m), 1);
    assert_eq!(manager.value(o), 0);
    assert_eq!(manager.value(r), 8);
    assert_eq!(manager.value(y), 2);

    assert_eq!(manager.next_solution(), SolveResult::Exhausted);
}
