use core::{fmt, str::FromStr};
use std::time::Duration;

use crate::{
    error::ConfigError,
    layout::{Field, FieldWidths, max_for_bits},
    time::{DEFAULT_EPOCH, MIN_SUPPORTED_EPOCH},
    word::Word,
};

/// Smallest accepted sequence width; guarantees 1024 IDs per slot.
pub const MIN_SEQUENCE_BITS: u32 = 10;

/// Smallest accepted identifier width.
pub const MIN_TOTAL_BITS: u32 = 10;

/// Largest accepted identifier width.
pub const MAX_TOTAL_BITS: u32 = 213;

/// Widest single field. Fields travel as `u64`.
pub const MAX_FIELD_BITS: u32 = u64::BITS;

/// Default bound on how long a strict engine waits for the next slot.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Granularity of the time field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimePrecision {
    Second,
    #[default]
    Millisecond,
}

impl TimePrecision {
    /// Milliseconds per slot.
    pub const fn unit_millis(self) -> u64 {
        match self {
            Self::Second => 1_000,
            Self::Millisecond => 1,
        }
    }

    /// Converts a millisecond timestamp to a slot, rounding down.
    pub const fn to_slot(self, millis: u64) -> u64 {
        millis / self.unit_millis()
    }

    /// Converts a slot back to the millisecond timestamp it starts at.
    pub const fn to_millis(self, slot: u64) -> u64 {
        slot.saturating_mul(self.unit_millis())
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Second => "second",
            Self::Millisecond => "millisecond",
        })
    }
}

impl FromStr for TimePrecision {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "second" | "seconds" | "s" => Ok(Self::Second),
            "millisecond" | "milliseconds" | "ms" => Ok(Self::Millisecond),
            _ => Err(ConfigError::UnknownPrecision(s.to_owned())),
        }
    }
}

/// How the engine reacts to clock rollback and sequence exhaustion.
///
/// | anomaly            | `Resilient`                      | `Strict`                           |
/// |--------------------|----------------------------------|------------------------------------|
/// | clock behind       | reuse the last slot              | fail with `ClockRollback`          |
/// | sequence exhausted | advance the slot by one, seq = 0 | wait for the clock, then seq = 0   |
///
/// `Resilient` never fails or blocks but may let the time field run ahead of
/// the wall clock while load stays above one slot's capacity.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    #[default]
    Resilient,
    Strict,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resilient => "resilient",
            Self::Strict => "strict",
        })
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "resilient" => Ok(Self::Resilient),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::UnknownPolicy(s.to_owned())),
        }
    }
}

/// The declared bit partition and time base.
///
/// The epoch is fixed for the lifetime of a deployment: changing it after IDs
/// have been issued can reissue an existing ID.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutConfig {
    pub total_bits: u32,
    pub time_precision: TimePrecision,
    /// Offset from 1970-01-01 UTC.
    pub epoch: Duration,
    pub time_bits: u32,
    pub location_a_bits: u32,
    pub location_b_bits: u32,
    pub sequence_bits: u32,
}

impl Default for LayoutConfig {
    /// 64 bits, millisecond precision, [`DEFAULT_EPOCH`], 41/5/5/12.
    fn default() -> Self {
        Self {
            total_bits: 64,
            time_precision: TimePrecision::Millisecond,
            epoch: DEFAULT_EPOCH,
            time_bits: 41,
            location_a_bits: 5,
            location_b_bits: 5,
            sequence_bits: 12,
        }
    }
}

impl LayoutConfig {
    pub const fn widths(&self) -> FieldWidths {
        FieldWidths {
            time: self.time_bits,
            location_a: self.location_a_bits,
            location_b: self.location_b_bits,
            sequence: self.sequence_bits,
        }
    }

    /// The epoch in the configured precision.
    pub fn epoch_slot(&self) -> u64 {
        let millis = u64::try_from(self.epoch.as_millis()).unwrap_or(u64::MAX);
        self.time_precision.to_slot(millis)
    }
}

/// Everything an engine is constructed from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    /// Data-center style identity of this instance.
    pub location_a: u64,
    /// Worker style identity of this instance.
    pub location_b: u64,
    pub policy: Policy,
    /// Upper bound for strict waits. `None` waits for as long as it takes.
    pub wait_timeout: Option<Duration>,
}

impl EngineConfig {
    /// Default layout with the [`Policy::Resilient`] policy.
    pub fn new(location_a: u64, location_b: u64) -> Self {
        Self {
            layout: LayoutConfig::default(),
            location_a,
            location_b,
            policy: Policy::Resilient,
            wait_timeout: Some(DEFAULT_WAIT_TIMEOUT),
        }
    }

    /// The fixed 64-bit layout (41/5/5/12, milliseconds) with the
    /// [`Policy::Strict`] policy.
    pub fn classic(datacenter_id: u64, worker_id: u64) -> Self {
        Self::new(datacenter_id, worker_id).with_policy(Policy::Strict)
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_wait_timeout(mut self, wait_timeout: Option<Duration>) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    /// Checks every construction rule against a word type `W` and the current
    /// wall-clock time `now_ms`.
    ///
    /// Rules are applied in order: epoch range, field widths, sequence floor,
    /// total width, word fit, partition sum, location values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate<W: Word>(&self, now_ms: u64) -> Result<(), ConfigError> {
        let layout = &self.layout;

        let epoch_ms = layout.epoch.as_millis();
        if epoch_ms < MIN_SUPPORTED_EPOCH.as_millis() || epoch_ms > u128::from(now_ms) {
            return Err(ConfigError::EpochOutOfRange {
                epoch_ms,
                min_ms: u64::try_from(MIN_SUPPORTED_EPOCH.as_millis()).unwrap_or(u64::MAX),
                max_ms: now_ms,
            });
        }

        let widths = layout.widths();
        for (field, min) in [
            (Field::Time, 0),
            (Field::LocationA, 0),
            (Field::LocationB, 0),
            (Field::Sequence, MIN_SEQUENCE_BITS),
        ] {
            let bits = widths.get(field);
            if !(min..=MAX_FIELD_BITS).contains(&bits) {
                return Err(ConfigError::FieldBitsOutOfRange {
                    field,
                    bits,
                    min,
                    max: MAX_FIELD_BITS,
                });
            }
        }

        if !(MIN_TOTAL_BITS..=MAX_TOTAL_BITS).contains(&layout.total_bits) {
            return Err(ConfigError::TotalBitsOutOfRange {
                bits: layout.total_bits,
                min: MIN_TOTAL_BITS,
                max: MAX_TOTAL_BITS,
            });
        }

        if layout.total_bits > W::BITS {
            return Err(ConfigError::TotalBitsExceedWord {
                bits: layout.total_bits,
                word_bits: W::BITS,
            });
        }

        let expected = layout.total_bits - 1;
        if widths.sum() != expected {
            return Err(ConfigError::PartitionMismatch {
                sum: widths.sum(),
                expected,
            });
        }

        for (field, value) in [
            (Field::LocationA, self.location_a),
            (Field::LocationB, self.location_b),
        ] {
            let max = max_for_bits(widths.get(field));
            if value > max {
                return Err(ConfigError::LocationOutOfRange { field, value, max });
            }
        }

        Ok(())
    }
}
