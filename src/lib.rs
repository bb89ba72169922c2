//! A finite-domain constraint-satisfaction solver.
//!
//! Problems are stated against a [`ProblemManager`]: create integer
//! variables, constrain them through the expression algebra and the global
//! constraints, schedule a search strategy as a [`Goal`](search::Goal), and
//! enumerate solutions with [`ProblemManager::next_solution`].
//!
//! ```
//! use acorn_solver::search::{labeling, VariableOrder};
//! use acorn_solver::{ProblemManager, SolveResult};
//!
//! let mut manager = ProblemManager::new();
//! let x = manager.new_variable(0, 3).unwrap();
//! let y = manager.new_variable(0, 3).unwrap();
//! manager.less_than(x, y).unwrap();
//! manager.add_goal(labeling(&[x, y], VariableOrder::InputOrder));
//!
//! assert_eq!(manager.next_solution(), SolveResult::Solution);
//! assert!(manager.value(x) < manager.value(y));
//! ```
//!
//! Domains are bit-set backed, propagation runs a variable-oriented
//! arc-consistency queue to a fixpoint, and the search is a backtracking
//! AND/OR goal tree with snapshot-based undo. Everything is single-threaded;
//! variable handles are only meaningful for the manager that created them.

pub(crate) mod asserts;
pub(crate) mod basic_types;
pub(crate) mod constraints;
pub mod containers;
pub(crate) mod engine;
pub mod search;
pub mod statistics;

pub use convert_case;
pub use rand;

pub use crate::basic_types::EmptyDomain;
pub use crate::basic_types::PostError;
pub use crate::basic_types::Random;
pub use crate::basic_types::SolveResult;
pub use crate::engine::ProblemManager;
pub use crate::engine::VariableId;
