use core::fmt;

use crate::layout::Field;

/// A result type defaulting to the crate [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Rejections raised while validating configuration or a malformed argument.
///
/// These are never retried: the caller must fix the input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The epoch is older than 2000-01-01 or ahead of the current time.
    #[error("epoch {epoch_ms}ms is outside [{min_ms}ms, {max_ms}ms]")]
    EpochOutOfRange {
        epoch_ms: u128,
        min_ms: u64,
        max_ms: u64,
    },

    /// A field width is outside its permitted range.
    #[error("{field} field is {bits} bits; expected {min}..={max}")]
    FieldBitsOutOfRange {
        field: Field,
        bits: u32,
        min: u32,
        max: u32,
    },

    /// The declared identifier width is outside its permitted range.
    #[error("total width is {bits} bits; expected {min}..={max}")]
    TotalBitsOutOfRange { bits: u32, min: u32, max: u32 },

    /// The declared identifier width does not fit the word type.
    #[error("total width of {bits} bits does not fit a {word_bits}-bit word")]
    TotalBitsExceedWord { bits: u32, word_bits: u32 },

    /// The field widths do not add up to `total_bits - 1`.
    #[error("field widths sum to {sum} bits; expected total_bits - 1 = {expected}")]
    PartitionMismatch { sum: u32, expected: u32 },

    /// A location value does not fit its field.
    #[error("{field} = {value}; expected 0..={max}")]
    LocationOutOfRange { field: Field, value: u64, max: u64 },

    /// A radix outside `2..=36` was requested.
    #[error("radix {radix}; expected 2..=36")]
    InvalidRadix { radix: u32 },

    /// A textual ID could not be parsed in the requested radix.
    #[error("`{input}` is not a valid base-{radix} identifier")]
    MalformedId { input: String, radix: u32 },

    /// An unrecognised time precision name.
    #[error("unknown time precision `{0}`; expected `second` or `millisecond`")]
    UnknownPrecision(String),

    /// An unrecognised policy name.
    #[error("unknown policy `{0}`; expected `resilient` or `strict`")]
    UnknownPolicy(String),
}

/// All errors that `snowbit` can produce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration or argument.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The wall clock reported a slot older than the last issued one.
    ///
    /// Only raised by engines running [`Policy::Strict`]. The engine state is
    /// left untouched and the next call may succeed.
    ///
    /// [`Policy::Strict`]: crate::Policy::Strict
    #[error("clock moved backwards: current slot {current} is behind last issued slot {last}")]
    ClockRollback { current: u64, last: u64 },

    /// Waiting for the next time slot took longer than the configured bound.
    #[error("gave up waiting for the next time slot after {waited_ms}ms")]
    WaitTimeout { waited_ms: u64 },

    /// The time elapsed since the epoch no longer fits the time field.
    #[error("time field exhausted: {elapsed} slots since epoch exceeds {max}")]
    TimeFieldExhausted { elapsed: u64, max: u64 },

    /// The engine lock was poisoned by a panicking thread.
    ///
    /// `parking_lot` mutexes do not poison, so this variant is absent with the
    /// `parking-lot` feature.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator state lock is poisoned")]
    LockPoisoned,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
