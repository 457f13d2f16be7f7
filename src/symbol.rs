//! Terminal symbols of a free group.
//!
//! A symbol is a nonzero signed integer: `s > 0` names the generator `x_s` and
//! `-s` names its formal inverse. Zero is the reserved non-symbol sentinel; it
//! is returned by queries over empty maps and marks the empty word in the
//! persisted layout, but it never names a generator.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::Neg;

/// Integer-like type usable as a terminal symbol.
///
/// The engine only needs a total order, unary negation, a zero default and a
/// lossless conversion to and from `i64` (used by fingerprinting and by the
/// persisted formats).
pub trait TerminalSymbol:
    Copy + Ord + Hash + Debug + Display + Default + Neg<Output = Self> + Send + Sync + 'static
{
    /// Builds the symbol with the given index, e.g. `from_index(3) == x_3`.
    ///
    /// # Panics
    /// Panics if the index does not fit the symbol type.
    fn from_index(index: i32) -> Self;

    /// Returns the signed integer code of this symbol.
    fn code(&self) -> i64;

    /// Converts a signed integer code back into a symbol, if it fits.
    fn from_code(code: i64) -> Option<Self>;

    /// Returns `true` for generators, `false` for inverses and the sentinel.
    #[inline]
    fn is_positive(&self) -> bool {
        *self > Self::default()
    }

    /// Returns `true` for the reserved zero sentinel.
    #[inline]
    fn is_null(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the generator this symbol is built on (`x_s` for both `s` and `-s`).
    #[inline]
    fn generator(self) -> Self {
        if self.is_positive() {
            self
        } else {
            -self
        }
    }
}

macro_rules! impl_terminal_symbol {
    ($($ty:ty),*) => {
        $(
            impl TerminalSymbol for $ty {
                #[inline]
                fn from_index(index: i32) -> Self {
                    <$ty>::try_from(index).expect("symbol index out of range for the symbol type")
                }

                #[inline]
                fn code(&self) -> i64 {
                    i64::from(*self)
                }

                #[inline]
                fn from_code(code: i64) -> Option<Self> {
                    <$ty>::try_from(code).ok()
                }
            }
        )*
    };
}

impl_terminal_symbol!(i8, i16, i32, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_helpers() {
        assert!(3i32.is_positive());
        assert!(!(-3i32).is_positive());
        assert!(!0i32.is_positive());
        assert!(0i32.is_null());
        assert_eq!((-7i32).generator(), 7);
        assert_eq!(7i32.generator(), 7);
    }

    #[test]
    fn code_conversion() {
        assert_eq!(i16::from_index(12), 12);
        assert_eq!((-5i16).code(), -5);
        assert_eq!(i8::from_code(300), None);
        assert_eq!(i8::from_code(-100), Some(-100));
    }
}
