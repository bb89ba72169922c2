#[cfg(doc)]
use crate::ProblemManager;

/// The outcome of a single [`ProblemManager::next_solution`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveResult {
    /// A (next) solution has been found; the variables are bound and can be
    /// inspected through the manager.
    Solution,
    /// The search space has been exhausted: no further solution exists.
    Exhausted,
    /// A time or backtrack budget was hit before the search could conclude.
    /// The search tree is left intact, so a subsequent call with a relaxed
    /// budget resumes from exactly this point.
    LimitReached,
}

impl SolveResult {
    /// Convenience check for "a solution was found".
    pub fn is_solution(self) -> bool {
        matches!(self, SolveResult::Solution)
    }
}
