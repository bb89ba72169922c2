pub(crate) mod bitset_domain;
mod graph_export;
mod problem_manager;
pub(crate) mod propagation;
pub(crate) mod queue;
pub(crate) mod search_tree;
pub(crate) mod variable;

pub use problem_manager::*;
pub use variable::VariableId;
