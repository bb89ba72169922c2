//! Leveled assertion macros.
//!
//! Simple checks are always compiled in; moderate and extreme checks are only
//! enabled in tests or with the `debug-checks` feature, since they can be
//! expensive inside the propagation hot path.

#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const ACORN_ASSERT_LEVEL_DEFINITION: u8 = ACORN_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const ACORN_ASSERT_LEVEL_DEFINITION: u8 = ACORN_ASSERT_MODERATE;

pub const ACORN_ASSERT_SIMPLE: u8 = 1;
pub const ACORN_ASSERT_MODERATE: u8 = 2;
pub const ACORN_ASSERT_EXTREME: u8 = 3;

#[macro_export]
#[doc(hidden)]
macro_rules! acorn_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::ACORN_ASSERT_LEVEL_DEFINITION >= $crate::asserts::ACORN_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! acorn_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::ACORN_ASSERT_LEVEL_DEFINITION >= $crate::asserts::ACORN_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! acorn_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::ACORN_ASSERT_LEVEL_DEFINITION >= $crate::asserts::ACORN_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! acorn_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::ACORN_ASSERT_LEVEL_DEFINITION >= $crate::asserts::ACORN_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}
