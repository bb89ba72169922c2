//! The built-in constraint library.
//!
//! Each constraint is a propagator implementing
//! [`Constraint`](crate::engine::propagation::Constraint); posting and the
//! derived-variable algebra live on the problem manager.

mod all_different;
mod arithmetic;
mod boolean;
mod count;
mod element;
mod inverse;
mod minmax;
mod order;
mod sum;
mod table;

pub(crate) use all_different::*;
pub(crate) use arithmetic::*;
pub(crate) use boolean::*;
pub(crate) use count::*;
pub(crate) use element::*;
pub(crate) use inverse::*;
pub(crate) use minmax::*;
pub(crate) use order::*;
pub(crate) use sum::*;
pub(crate) use table::*;

use crate::engine::bitset_domain::MINUS_INFINITY;
use crate::engine::bitset_domain::PLUS_INFINITY;

/// Clamps a bound computed in `i64` back into the representable range.
///
/// Derived bounds may arithmetically overflow the sentinels; clamping is
/// sound because every actual domain lies strictly inside them.
pub(crate) fn clamp_bound(value: i64) -> i32 {
    value.clamp(i64::from(MINUS_INFINITY), i64::from(PLUS_INFINITY)) as i32
}

/// Floor division on `i64`, rounding towards minus infinity.
pub(crate) fn div_floor(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Ceiling division on `i64`, rounding towards plus infinity.
pub(crate) fn div_ceil(a: i64, b: i64) -> i64 {
    let q = a / b;
    if (a % b != 0) && ((a < 0) == (b < 0)) {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_ceil_division_round_away_from_truncation() {
        assert_eq!(div_floor(7, 2), 3);
        assert_eq!(div_floor(-7, 2), -4);
        assert_eq!(div_floor(7, -2), -4);
        assert_eq!(div_ceil(7, 2), 4);
        assert_eq!(div_ceil(-7, 2), -3);
        assert_eq!(div_ceil(-7, -2), 4);
    }
}
