use std::fmt::Debug;
use std::ops::Range;

use rand::Rng;
use rand::SeedableRng;

use crate::acorn_assert_moderate;

/// Abstraction over a source of randomness, so that randomized search
/// strategies can be driven either by a real seeded generator or by a
/// deterministic test double.
///
/// Any type implementing [`SeedableRng`] + [`Rng`] (such as
/// `rand::rngs::SmallRng`) implements this trait through the blanket
/// implementation below.
pub trait Random: Debug {
    /// Generates a bool with probability `probability` of being true. It must
    /// hold that `probability ∈ [0, 1]`; this method panics otherwise.
    fn generate_bool(&mut self, probability: f64) -> bool;

    /// Generates a random usize sampled uniformly from
    /// `[range.start, range.end)`.
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize;

    /// Generates a random i32 sampled uniformly from `[lb, ub]`.
    fn generate_i32_in_range(&mut self, lb: i32, ub: i32) -> i32;
}

impl<T> Random for T
where
    T: SeedableRng + Rng + Debug,
{
    fn generate_bool(&mut self, probability: f64) -> bool {
        acorn_assert_moderate!(
            (0.0..=1.0).contains(&probability),
            "It should hold that 0.0 <= {probability} <= 1.0"
        );

        self.gen_bool(probability)
    }

    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
        self.gen_range(range)
    }

    fn generate_i32_in_range(&mut self, lb: i32, ub: i32) -> i32 {
        self.gen_range(lb..=ub)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::ops::Range;

    use super::Random;
    use crate::acorn_assert_simple;

    /// A test "random" generator which takes as input a list of elements of
    /// [`usize`], [`i32`] and [`bool`] and returns them in order. Attempting
    /// to generate more values than were provided results in a panic.
    #[derive(Debug, Default)]
    pub(crate) struct TestRandom {
        pub(crate) usizes: Vec<usize>,
        pub(crate) integers: Vec<i32>,
        pub(crate) bools: Vec<bool>,
    }

    impl Random for TestRandom {
        fn generate_bool(&mut self, _probability: f64) -> bool {
            self.bools.remove(0)
        }

        fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
            let selected = self.usizes.remove(0);
            acorn_assert_simple!(
                range.contains(&selected),
                "The element selected by `TestRandom` ({selected}) is not in the provided range ({range:?})"
            );
            selected
        }

        fn generate_i32_in_range(&mut self, lb: i32, ub: i32) -> i32 {
            let selected = self.integers.remove(0);
            acorn_assert_simple!(
                (lb..=ub).contains(&selected),
                "The element selected by `TestRandom` ({selected}) is not in the provided range ({lb}..={ub})"
            );
            selected
        }
    }
}
