mod error;
mod moving_averages;
mod random;
mod solve_result;
mod stopwatch;

pub use error::*;
pub(crate) use moving_averages::*;
pub use random::*;
#[cfg(test)]
pub(crate) use random::tests::TestRandom;
pub use solve_result::*;
pub(crate) use stopwatch::*;
