use core::fmt;
use core::hash::Hash;
use core::ops::{BitAnd, BitOr, Shl, Shr};

/// The unsigned scalar an identifier is carried in.
///
/// Every field of an identifier is at most 64 bits wide and is handed in and
/// out as a `u64`; the word only has to be wide enough for the whole layout.
/// Layouts wider than 64 bits therefore never lose precision as long as the
/// word is wide enough, which [`EngineConfig::validate`] enforces.
///
/// Implemented for `u64`, `u128` and, with the `wide` feature, [`U256`].
///
/// [`EngineConfig::validate`]: crate::EngineConfig::validate
pub trait Word:
    Copy
    + Clone
    + Default
    + fmt::Debug
    + fmt::Display
    + fmt::LowerHex
    + Ord
    + PartialOrd
    + Eq
    + PartialEq
    + Hash
    + Send
    + Sync
    + 'static
    + From<u64>
    + BitOr<Output = Self>
    + BitAnd<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    /// Width of the word in bits.
    const BITS: u32;

    /// Zero value.
    const ZERO: Self;

    /// Returns the lowest 64 bits.
    fn low_u64(self) -> u64;

    /// Divides by a small divisor, returning the quotient and remainder.
    fn div_rem_small(self, divisor: u32) -> (Self, u32);

    /// Computes `self * mul + add`, or `None` on overflow.
    fn checked_mul_add(self, mul: u32, add: u32) -> Option<Self>;

    /// Returns true if the value is zero.
    fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// Shifts left, yielding zero when the shift is at least [`Self::BITS`].
    fn shl_or_zero(self, shift: u32) -> Self {
        if shift >= Self::BITS {
            Self::ZERO
        } else {
            self << shift
        }
    }
}

impl Word for u64 {
    const BITS: u32 = u64::BITS;
    const ZERO: Self = 0;

    fn low_u64(self) -> u64 {
        self
    }

    fn div_rem_small(self, divisor: u32) -> (Self, u32) {
        let divisor = u64::from(divisor);
        #[allow(clippy::cast_possible_truncation)]
        (self / divisor, (self % divisor) as u32)
    }

    fn checked_mul_add(self, mul: u32, add: u32) -> Option<Self> {
        self.checked_mul(u64::from(mul))?.checked_add(u64::from(add))
    }
}

impl Word for u128 {
    const BITS: u32 = u128::BITS;
    const ZERO: Self = 0;

    fn low_u64(self) -> u64 {
        #[allow(clippy::cast_possible_truncation)]
        {
            self as u64
        }
    }

    fn div_rem_small(self, divisor: u32) -> (Self, u32) {
        let divisor = u128::from(divisor);
        #[allow(clippy::cast_possible_truncation)]
        (self / divisor, (self % divisor) as u32)
    }

    fn checked_mul_add(self, mul: u32, add: u32) -> Option<Self> {
        self.checked_mul(u128::from(mul))?.checked_add(u128::from(add))
    }
}

/// A 256-bit unsigned word for layouts wider than 128 bits.
#[cfg_attr(docsrs, doc(cfg(feature = "wide")))]
#[cfg(feature = "wide")]
pub use primitive_types::U256;

#[cfg(feature = "wide")]
impl Word for U256 {
    const BITS: u32 = 256;
    const ZERO: Self = U256([0; 4]);

    fn low_u64(self) -> u64 {
        self.0[0]
    }

    fn div_rem_small(self, divisor: u32) -> (Self, u32) {
        let (quotient, remainder) = self.div_mod(U256::from(divisor));
        #[allow(clippy::cast_possible_truncation)]
        (quotient, remainder.0[0] as u32)
    }

    fn checked_mul_add(self, mul: u32, add: u32) -> Option<Self> {
        self.checked_mul(U256::from(mul))?
            .checked_add(U256::from(add))
    }
}
