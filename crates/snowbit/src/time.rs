use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Earliest epoch an engine accepts: Saturday, January 1, 2000 00:00:00 UTC
pub const MIN_SUPPORTED_EPOCH: Duration = Duration::from_millis(946_684_800_000);

/// Default epoch: Saturday, January 1, 2022 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_640_995_200_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// A trait for wall-clock time sources.
///
/// The engine trusts this clock and only reacts to its anomalies: a reading
/// older than the last issued slot is treated as a clock rollback. Plug in a
/// mock in tests.
///
/// # Example
///
/// ```
/// use snowbit::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_700_000_000_000
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_700_000_000_000);
/// ```
pub trait TimeSource {
    /// Returns milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// The host wall clock.
///
/// Readings before 1970 collapse to zero, which every valid epoch is ahead of,
/// so they surface as a rollback rather than a panic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}
