use thiserror::Error;

#[cfg(doc)]
use crate::ProblemManager;

/// Errors raised when posting variables or constraints to the
/// [`ProblemManager`].
///
/// These indicate a caller bug; they are never produced by the search itself.
/// Domain wipe-outs during propagation are *not* errors — they are signalled
/// through [`EmptyDomain`] and consumed by the search loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    /// A global constraint was given an empty array of variables.
    #[error("the constraint `{0}` requires a non-empty array of variables")]
    EmptyArray(&'static str),
    /// A constraint requiring pairwise-distinct variables was given a
    /// duplicate.
    #[error("the constraint `{0}` requires pairwise-distinct variables")]
    DuplicateVariable(&'static str),
    /// Two arrays which must have equal lengths did not.
    #[error("the constraint `{constraint}` requires arrays of equal length, got {left} and {right}")]
    MismatchedLengths {
        constraint: &'static str,
        left: usize,
        right: usize,
    },
    /// A variable handle does not belong to this manager.
    #[error("unknown variable handle {0}; was it created through this manager?")]
    UnknownVariable(u32),
    /// Variable bounds must lie strictly within the sentinel range.
    #[error("the bounds [{min}, {max}] are empty or outside the representable range")]
    InvalidBounds { min: i32, max: i32 },
    /// The divisor domain of a division/modulo constraint contains only zero.
    #[error("the divisor of `{0}` is fixed to zero")]
    ZeroDivisor(&'static str),
}

/// Signal that a domain mutation would leave a variable with no values.
///
/// This is an expected, frequent control-flow outcome: the arc-consistency
/// loop aborts the fixpoint on it and the search loop turns it into
/// backtracking. It never escapes the solver as a panic or a [`PostError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyDomain;
