use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    codec::{Decomposed, compose_with_instance, decompose},
    config::{EngineConfig, TimePrecision},
    describe::Snapshot,
    error::{ConfigError, Error, Result},
    generator::{Adjustment, Mutex, MutexGuard, Poll, SequenceState, SlotRules, Step},
    layout::BitLayout,
    radix::{DEFAULT_RADIX, parse_radix, to_radix_string},
    time::{SystemClock, TimeSource},
    word::Word,
};

/// A Snowflake-style identifier engine with a runtime-declared bit layout.
///
/// The slot/sequence counters live behind an [`Arc<Mutex<_>>`], so the
/// engine can be shared across threads and cloned; clones issue from the same
/// counters. Identifiers are unique per engine. Global uniqueness needs every
/// concurrently running engine to own a distinct `(location_a, location_b)`
/// pair.
///
/// ## Policies
/// - [`Policy::Resilient`]: [`Self::next_id`] never fails on clock anomalies
///   and never waits.
/// - [`Policy::Strict`]: a clock rollback is an error and an exhausted slot is
///   waited out, bounded by [`EngineConfig::wait_timeout`].
///
/// ## See Also
/// - [`Snowbit::next_id_async`] for a non-blocking wait.
///
/// [`Policy::Resilient`]: crate::Policy::Resilient
/// [`Policy::Strict`]: crate::Policy::Strict
/// [`Snowbit::next_id_async`]: #method.next_id_async
#[derive(Clone)]
pub struct Snowbit<W: Word, T: TimeSource = SystemClock> {
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<SequenceState>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<SequenceState>>,
    layout: BitLayout<W>,
    rules: SlotRules,
    instance_bits: W,
    config: EngineConfig,
    time: T,
}

/// A 64-bit engine.
pub type Snowbit64<T = SystemClock> = Snowbit<u64, T>;

/// A 128-bit engine.
pub type Snowbit128<T = SystemClock> = Snowbit<u128, T>;

/// A 256-bit engine for layouts up to 213 bits.
#[cfg_attr(docsrs, doc(cfg(feature = "wide")))]
#[cfg(feature = "wide")]
pub type Snowbit256<T = SystemClock> = Snowbit<crate::word::U256, T>;

impl<W: Word> Snowbit<W, SystemClock> {
    /// Creates an engine reading the host wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is rejected by
    /// [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_time(config, SystemClock)
    }
}

impl<W: Word, T: TimeSource> Snowbit<W, T> {
    /// Creates an engine reading the given clock.
    ///
    /// The configuration is validated against the clock's current reading, so
    /// an epoch in the future is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] with the first rule `config` breaks.
    pub fn with_time(config: EngineConfig, time: T) -> Result<Self> {
        config.validate::<W>(time.current_millis())?;

        let layout = BitLayout::from_widths(config.layout.widths());
        let rules = SlotRules {
            epoch_slot: config.layout.epoch_slot(),
            max_time: layout.max_time(),
            max_sequence: layout.max_sequence(),
            policy: config.policy,
        };
        let instance_bits = layout.instance_bits(config.location_a, config.location_b);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            total_bits = config.layout.total_bits,
            location_a = config.location_a,
            location_b = config.location_b,
            policy = %config.policy,
            precision = %config.layout.time_precision,
            "snowbit engine ready"
        );

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(
                SequenceState::default(),
            ))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(SequenceState::default())),
            layout,
            rules,
            instance_bits,
            config,
            time,
        })
    }

    /// Makes one attempt to issue an identifier without waiting.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: a new identifier
    /// - `Ok(Poll::Pending { yield_for })`: strict engines only; the current
    ///   slot is full, retry in `yield_for` milliseconds
    ///
    /// # Errors
    /// - [`Error::ClockRollback`] if a strict engine sees the clock go back
    /// - [`Error::TimeFieldExhausted`] once the time field is full
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   state lock
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll<W>> {
        // The clock is read under the lock: a reading taken before another
        // caller commits a later slot would look like a rollback.
        let (now_ms, step) = {
            let mut state = self.lock_state()?;
            let now_ms = self.time.current_millis();
            let now_slot = self.precision().to_slot(now_ms);
            (now_ms, state.advance(now_slot, &self.rules))
        };

        match step {
            Ok(Step::Ready {
                slot,
                sequence,
                adjustment,
            }) => {
                if adjustment != Adjustment::None {
                    Self::cold_adjusted(slot, adjustment);
                }
                let elapsed = slot - self.rules.epoch_slot;
                Ok(Poll::Ready {
                    id: compose_with_instance(&self.layout, elapsed, self.instance_bits, sequence),
                })
            }
            Ok(Step::Pending { until_slot }) => {
                let until_ms = self.precision().to_millis(until_slot);
                Ok(Poll::Pending {
                    yield_for: until_ms.saturating_sub(now_ms).max(1),
                })
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "refused to issue an identifier");
                Err(e)
            }
        }
    }

    #[cold]
    #[inline(never)]
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn cold_adjusted(slot: u64, adjustment: Adjustment) {
        #[cfg(feature = "tracing")]
        match adjustment {
            Adjustment::ClockClamped { behind_by } => {
                tracing::debug!(slot, behind_by, "clock behind last slot; reusing it");
            }
            Adjustment::SlotAdvanced => {
                tracing::debug!(slot, "slot exhausted; time field advanced ahead of clock");
            }
            Adjustment::None => {}
        };
    }

    /// Issues the next identifier, waiting for the clock if a strict engine
    /// has exhausted its slot.
    ///
    /// The wait spins on [`std::thread::yield_now`] and gives up with
    /// [`Error::WaitTimeout`] after [`EngineConfig::wait_timeout`]. The
    /// timeout is measured on the monotonic clock, so a stalled wall clock
    /// cannot hold the caller forever. Resilient engines never wait.
    ///
    /// # Errors
    ///
    /// Everything [`Self::try_poll_id`] returns, plus [`Error::WaitTimeout`].
    pub fn next_id(&self) -> Result<W> {
        let started = Instant::now();
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { .. } => {
                    self.remaining_wait(started)?;
                    std::thread::yield_now();
                }
            }
        }
    }

    /// Time left before a wait that began at `started` times out, or `None`
    /// when waits are unbounded.
    pub(crate) fn remaining_wait(&self, started: Instant) -> Result<Option<Duration>> {
        let Some(limit) = self.config.wait_timeout else {
            return Ok(None);
        };
        let waited = started.elapsed();
        if waited >= limit {
            let waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
            #[cfg(feature = "tracing")]
            tracing::warn!(waited_ms, "timed out waiting for the next time slot");
            return Err(Error::WaitTimeout { waited_ms });
        }
        Ok(Some(limit - waited))
    }

    /// [`Self::next_id`] rendered in `radix`.
    ///
    /// # Errors
    ///
    /// Everything [`Self::next_id`] returns, plus a [`ConfigError::InvalidRadix`]
    /// which is checked before an identifier is consumed.
    ///
    /// [`ConfigError::InvalidRadix`]: crate::ConfigError::InvalidRadix
    pub fn next_id_string(&self, radix: u32) -> Result<String> {
        // Reject the radix before burning an identifier.
        to_radix_string(W::ZERO, radix)?;
        to_radix_string(self.next_id()?, radix)
    }

    /// [`Self::next_id`] rendered in base 36.
    ///
    /// # Errors
    ///
    /// See [`Self::next_id`].
    pub fn next_id_base36(&self) -> Result<String> {
        self.next_id_string(DEFAULT_RADIX)
    }

    /// Splits an identifier issued under this engine's layout back into its
    /// fields.
    pub fn decompose(&self, id: W) -> Decomposed {
        decompose(&self.layout, self.rules.epoch_slot, self.precision(), id)
    }

    /// Milliseconds since 1970 at the start of the slot `id` was issued in.
    ///
    /// Matches [`Decomposed::timestamp_ms`]; with second precision the slot
    /// is scaled back to milliseconds.
    pub fn time_of(&self, id: W) -> u64 {
        self.precision().to_millis(self.time_slot_of(id))
    }

    /// Parses an identifier rendered in `radix` and checks it fits this
    /// engine's layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedId`] if `input` does not parse or has
    /// bits set at or above the reserved bit, and
    /// [`ConfigError::InvalidRadix`] for an unsupported radix.
    ///
    /// [`ConfigError::MalformedId`]: crate::ConfigError::MalformedId
    /// [`ConfigError::InvalidRadix`]: crate::ConfigError::InvalidRadix
    pub fn parse_id(&self, input: &str, radix: u32) -> Result<W> {
        let id = parse_radix::<W>(input, radix)?;
        if !self.layout.contains(id) {
            return Err(ConfigError::MalformedId {
                input: input.to_owned(),
                radix,
            }
            .into());
        }
        Ok(id)
    }

    /// Absolute time slot `id` was issued in, in precision units.
    pub fn time_slot_of(&self, id: W) -> u64 {
        self.layout.time_of(id).saturating_add(self.rules.epoch_slot)
    }

    /// Location A `id` was issued under.
    pub fn location_a_of(&self, id: W) -> u64 {
        self.layout.location_a_of(id)
    }

    /// Location B `id` was issued under.
    pub fn location_b_of(&self, id: W) -> u64 {
        self.layout.location_b_of(id)
    }

    /// Position of `id` within its slot.
    pub fn sequence_of(&self, id: W) -> u64 {
        self.layout.sequence_of(id)
    }

    /// A point-in-time view of the layout, identity and counters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the state lock is poisoned.
    pub fn describe(&self) -> Result<Snapshot> {
        let state = *self.lock_state()?;
        let now_slot = self.precision().to_slot(self.time.current_millis());
        Ok(Snapshot::capture(&self.config, &self.layout, state, now_slot))
    }

    pub const fn layout(&self) -> &BitLayout<W> {
        &self.layout
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn time_precision(&self) -> TimePrecision {
        self.config.layout.time_precision
    }

    /// Both location values, pre-shifted into place.
    pub const fn instance_bits(&self) -> W {
        self.instance_bits
    }

    const fn precision(&self) -> TimePrecision {
        self.config.layout.time_precision
    }

    #[cfg(not(feature = "parking-lot"))]
    fn lock_state(&self) -> Result<MutexGuard<'_, SequenceState>> {
        Ok(self.state.lock()?)
    }

    #[cfg(feature = "parking-lot")]
    fn lock_state(&self) -> Result<MutexGuard<'_, SequenceState>> {
        Ok(self.state.lock())
    }
}

impl<W: Word, T: TimeSource> fmt::Debug for Snowbit<W, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.describe() {
            Ok(snapshot) => fmt::Display::fmt(&snapshot, f),
            Err(_) => f
                .debug_struct("Snowbit")
                .field("config", &self.config)
                .finish_non_exhaustive(),
        }
    }
}
