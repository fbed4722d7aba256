use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    thread::scope,
    time::Duration,
};

use crate::{
    EngineConfig, Error, LayoutConfig, Policy, Poll, Snowbit, SystemClock, TimePrecision,
    TimeSource, Word, parse_radix,
};

pub(crate) const EPOCH_MS: u64 = 1_640_995_200_000;

#[derive(Clone)]
pub(crate) struct MockTime {
    pub millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock the test moves by hand.
#[derive(Clone)]
pub(crate) struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn at(millis: u64) -> Self {
        Self(Arc::new(AtomicU64::new(millis)))
    }

    pub fn set(&self, millis: u64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn current_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reads `millis` for the first `step_after` reads, then one millisecond
/// later.
struct SteppingClock {
    millis: u64,
    step_after: usize,
    reads: AtomicUsize,
}

impl TimeSource for SteppingClock {
    fn current_millis(&self) -> u64 {
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.step_after {
            self.millis
        } else {
            self.millis + 1
        }
    }
}

pub(crate) trait PollExt<W> {
    fn unwrap_ready(self) -> W;
    fn unwrap_pending(self) -> u64;
}

impl<W: Word> PollExt<W> for Poll<W> {
    fn unwrap_ready(self) -> W {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => panic!("unexpected pending (yield for: {yield_for})"),
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn engine<T: TimeSource>(policy: Policy, time: T) -> Snowbit<u64, T> {
    Snowbit::with_time(EngineConfig::new(1, 1).with_policy(policy), time).unwrap()
}

fn run_sequence_increments_within_same_slot<T: TimeSource>(engine: &Snowbit<u64, T>) {
    let id1 = engine.next_id().unwrap();
    let id2 = engine.next_id().unwrap();
    let id3 = engine.next_id().unwrap();

    for id in [id1, id2, id3] {
        assert_eq!(engine.decompose(id).elapsed, 42);
        assert_eq!(engine.time_of(id), EPOCH_MS + 42);
        assert_eq!(engine.time_slot_of(id), EPOCH_MS + 42);
    }
    assert_eq!(engine.sequence_of(id1), 0);
    assert_eq!(engine.sequence_of(id2), 1);
    assert_eq!(engine.sequence_of(id3), 2);
    assert!(id1 < id2 && id2 < id3);
}

/// Drains the 4096 identifiers of the current slot.
fn run_fill_slot<T: TimeSource>(engine: &Snowbit<u64, T>, elapsed: u64) -> Vec<u64> {
    (0..=engine.layout().max_sequence())
        .map(|seq| {
            let id = engine.try_poll_id().unwrap().unwrap_ready();
            let parts = engine.decompose(id);
            assert_eq!(parts.elapsed, elapsed);
            assert_eq!(parts.sequence, seq);
            id
        })
        .collect()
}

fn run_unique_across_threads(policy: Policy) {
    const THREADS: usize = 8;
    const TOTAL_IDS: usize = 4096 * 64;
    const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

    let engine = Snowbit::<u64>::new(EngineConfig::new(3, 9).with_policy(policy)).unwrap();
    let seen_ids = Mutex::new(HashSet::with_capacity(TOTAL_IDS));

    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let mut local = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0..IDS_PER_THREAD {
                    local.push(engine.next_id().unwrap());
                }
                // Each thread observes its own identifiers in order.
                assert!(local.windows(2).all(|w| w[0] < w[1]));
                let mut seen = seen_ids.lock().unwrap();
                for id in local {
                    assert!(seen.insert(id), "duplicate id {id}");
                }
            });
        }
    });

    assert_eq!(seen_ids.lock().unwrap().len(), TOTAL_IDS);
}

#[test]
fn sequence_increments_within_same_slot() {
    for policy in [Policy::Resilient, Policy::Strict] {
        let engine = engine(policy, MockTime {
            millis: EPOCH_MS + 42,
        });
        run_sequence_increments_within_same_slot(&engine);
    }
}

#[test]
fn resilient_issues_5000_ids_in_one_millisecond() {
    let engine = engine(Policy::Resilient, MockTime {
        millis: EPOCH_MS + 42,
    });
    let first = run_fill_slot(&engine, 42);

    let rest: Vec<u64> = (0..5000 - 4096).map(|_| engine.next_id().unwrap()).collect();
    let parts = engine.decompose(rest[0]);
    assert_eq!(parts.elapsed, 43, "time field advances by exactly one");
    assert_eq!(parts.sequence, 0);
    assert_eq!(engine.decompose(rest[903]).sequence, 903);

    let all: Vec<u64> = first.into_iter().chain(rest).collect();
    assert!(all.windows(2).all(|w| w[0] < w[1]));
    for id in &all {
        assert_eq!(engine.location_a_of(*id), 1);
        assert_eq!(engine.location_b_of(*id), 1);
    }

    // The frozen clock is now one slot behind the issued time field.
    assert_eq!(engine.describe().unwrap().state.ahead_by, 1);
}

#[test]
fn strict_pends_without_mutating_state() {
    let clock = ManualClock::at(EPOCH_MS + 42);
    let engine = engine(Policy::Strict, clock.clone());
    run_fill_slot(&engine, 42);

    let before = engine.describe().unwrap().state;
    assert_eq!(engine.try_poll_id().unwrap().unwrap_pending(), 1);
    assert_eq!(engine.try_poll_id().unwrap().unwrap_pending(), 1);
    let after = engine.describe().unwrap().state;
    assert_eq!(before.last_slot, after.last_slot);
    assert_eq!(before.sequence, after.sequence);
    assert_eq!(after.sequence, 4095);

    clock.set(EPOCH_MS + 43);
    let id = engine.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(engine.decompose(id).elapsed, 43);
    assert_eq!(engine.sequence_of(id), 0);
}

#[test]
fn strict_next_id_times_out_on_a_frozen_clock() {
    let config = EngineConfig::classic(1, 1).with_wait_timeout(Some(Duration::from_millis(20)));
    let engine = Snowbit::<u64, _>::with_time(config, MockTime {
        millis: EPOCH_MS + 42,
    })
    .unwrap();
    run_fill_slot(&engine, 42);

    match engine.next_id() {
        Err(Error::WaitTimeout { waited_ms }) => assert!(waited_ms >= 20),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(engine.describe().unwrap().state.sequence, 4095);
}

#[test]
fn strict_next_id_waits_for_the_clock() {
    // One read for validation and one per identifier in the first slot.
    let clock = SteppingClock {
        millis: EPOCH_MS + 42,
        step_after: 1 + 4096 + 25,
        reads: AtomicUsize::new(0),
    };
    let engine = engine(Policy::Strict, clock);
    run_fill_slot(&engine, 42);

    let id = engine.next_id().unwrap();
    assert_eq!(engine.decompose(id).elapsed, 43);
    assert_eq!(engine.sequence_of(id), 0);
}

#[test]
fn strict_second_precision_reports_time_left_in_the_slot() {
    let layout = LayoutConfig {
        time_precision: TimePrecision::Second,
        time_bits: 31,
        location_a_bits: 10,
        location_b_bits: 10,
        sequence_bits: 12,
        ..LayoutConfig::default()
    };
    let config = EngineConfig::classic(0, 0).with_layout(layout);
    let engine = Snowbit::<u64, _>::with_time(config, MockTime {
        millis: EPOCH_MS + 12_250,
    })
    .unwrap();
    run_fill_slot(&engine, 12);
    assert_eq!(engine.try_poll_id().unwrap().unwrap_pending(), 750);
}

#[test]
fn second_precision_time_of_reports_millis() {
    let layout = LayoutConfig {
        time_precision: TimePrecision::Second,
        time_bits: 31,
        location_a_bits: 10,
        location_b_bits: 10,
        sequence_bits: 12,
        ..LayoutConfig::default()
    };
    let config = EngineConfig::new(0, 0).with_layout(layout);
    let engine = Snowbit::<u64, _>::with_time(config, MockTime {
        millis: EPOCH_MS + 12_250,
    })
    .unwrap();
    let id = engine.next_id().unwrap();

    assert_eq!(engine.time_slot_of(id), EPOCH_MS / 1000 + 12);
    assert_eq!(engine.time_of(id), EPOCH_MS + 12_000);
    assert_eq!(engine.time_of(id), engine.decompose(id).timestamp_ms);
}

#[test]
fn resilient_rollback_clamps_to_last_slot() {
    let clock = ManualClock::at(EPOCH_MS + 100);
    let engine = engine(Policy::Resilient, clock.clone());
    let first = engine.next_id().unwrap();

    clock.set(EPOCH_MS + 99);
    let second = engine.next_id().unwrap();
    assert_eq!(engine.decompose(second).elapsed, 100);
    assert_eq!(engine.sequence_of(second), 1);
    assert!(first < second);
}

#[test]
fn strict_rollback_fails_without_mutating_state() {
    let clock = ManualClock::at(EPOCH_MS + 100);
    let engine = engine(Policy::Strict, clock.clone());
    engine.next_id().unwrap();

    clock.set(EPOCH_MS + 99);
    assert_eq!(
        engine.next_id(),
        Err(Error::ClockRollback {
            current: EPOCH_MS + 99,
            last: EPOCH_MS + 100,
        })
    );
    assert_eq!(engine.describe().unwrap().state.sequence, 0);

    // Still usable once the clock recovers.
    clock.set(EPOCH_MS + 100);
    let id = engine.next_id().unwrap();
    assert_eq!(engine.sequence_of(id), 1);
}

#[test]
fn first_reading_before_the_epoch() {
    let clock = ManualClock::at(EPOCH_MS + 100);
    let resilient = engine(Policy::Resilient, clock.clone());
    let strict = engine(Policy::Strict, clock.clone());
    clock.set(EPOCH_MS - 5);

    let id = resilient.next_id().unwrap();
    assert_eq!(resilient.decompose(id).elapsed, 0);
    assert_eq!(resilient.sequence_of(id), 0);

    assert_eq!(
        strict.next_id(),
        Err(Error::ClockRollback {
            current: EPOCH_MS - 5,
            last: EPOCH_MS,
        })
    );
}

#[test]
fn exhausted_time_field_is_reported() {
    let layout = LayoutConfig {
        total_bits: 32,
        time_bits: 11,
        location_a_bits: 5,
        location_b_bits: 5,
        sequence_bits: 10,
        ..LayoutConfig::default()
    };
    let clock = ManualClock::at(EPOCH_MS + 2047);
    let engine = Snowbit::<u64, _>::with_time(
        EngineConfig::new(0, 0).with_layout(layout),
        clock.clone(),
    )
    .unwrap();

    // The last slot still issues, including its whole sequence.
    for _ in 0..1024 {
        assert_eq!(engine.decompose(engine.next_id().unwrap()).elapsed, 2047);
    }
    // A resilient advance past the last slot fails.
    assert_eq!(
        engine.next_id(),
        Err(Error::TimeFieldExhausted {
            elapsed: 2048,
            max: 2047
        })
    );

    clock.set(EPOCH_MS + 5000);
    assert_eq!(
        engine.next_id(),
        Err(Error::TimeFieldExhausted {
            elapsed: 5000,
            max: 2047
        })
    );
}

#[test]
fn locations_are_isolated() {
    let time = || MockTime {
        millis: EPOCH_MS + 7,
    };
    let a = Snowbit::<u64, _>::with_time(EngineConfig::new(1, 5), time()).unwrap();
    let b = Snowbit::<u64, _>::with_time(EngineConfig::new(2, 5), time()).unwrap();

    let pa = a.decompose(a.next_id().unwrap());
    let pb = b.decompose(b.next_id().unwrap());
    assert_eq!(pa.location_a, 1);
    assert_eq!(pb.location_a, 2);
    assert_eq!(pa.location_b, pb.location_b);
    assert_eq!(pa.elapsed, pb.elapsed);
    assert_eq!(pa.sequence, pb.sequence);
}

#[test]
fn maximum_locations_stay_in_their_fields() {
    let engine = Snowbit::<u64, _>::with_time(EngineConfig::new(31, 31), MockTime {
        millis: EPOCH_MS + 1,
    })
    .unwrap();
    let id = engine.next_id().unwrap();
    let parts = engine.decompose(id);
    assert_eq!(parts.location_a, 31);
    assert_eq!(parts.location_b, 31);
    assert_eq!(parts.elapsed, 1);
    assert_eq!(parts.sequence, 0);
    assert_eq!(id >> 63, 0);
}

#[test]
fn invalid_configs_are_rejected_at_construction() {
    let err = Snowbit::<u64>::new(EngineConfig::new(32, 0)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let layout = LayoutConfig {
        total_bits: 100,
        time_bits: 53,
        location_a_bits: 10,
        location_b_bits: 10,
        sequence_bits: 26,
        ..LayoutConfig::default()
    };
    let config = EngineConfig::new(0, 0).with_layout(layout);
    assert!(Snowbit::<u64>::new(config).is_err());
    assert!(Snowbit::<u128>::new(config).is_ok());
}

#[test]
fn radix_strings_decode_to_the_issued_id() {
    let engine = engine(Policy::Resilient, MockTime {
        millis: EPOCH_MS + 9,
    });
    let text = engine.next_id_base36().unwrap();
    assert!(text.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    let id = parse_radix::<u64>(&text, 36).unwrap();
    assert_eq!(engine.decompose(id).elapsed, 9);
    assert_eq!(engine.sequence_of(id), 0);

    // A bad radix fails before an identifier is consumed.
    assert!(engine.next_id_string(37).is_err());
    let id = parse_radix::<u64>(&engine.next_id_string(16).unwrap(), 16).unwrap();
    assert_eq!(engine.sequence_of(id), 1);
}

#[test]
fn parse_id_rejects_bits_outside_the_layout() {
    let layout = LayoutConfig {
        total_bits: 32,
        time_bits: 11,
        location_a_bits: 5,
        location_b_bits: 5,
        sequence_bits: 10,
        ..LayoutConfig::default()
    };
    let engine = Snowbit::<u64, _>::with_time(
        EngineConfig::new(3, 4).with_layout(layout),
        MockTime {
            millis: EPOCH_MS + 7,
        },
    )
    .unwrap();
    let id = engine.next_id().unwrap();
    let text = engine.next_id_string(16).unwrap();
    assert_eq!(engine.parse_id(&text, 16).unwrap(), id + 1);
    assert_eq!(engine.location_b_of(engine.parse_id(&text, 16).unwrap()), 4);

    // The reserved bit and anything above the declared width.
    for bad in ["80000000", "100000000"] {
        assert_eq!(
            engine.parse_id(bad, 16),
            Err(Error::Config(crate::ConfigError::MalformedId {
                input: bad.to_owned(),
                radix: 16,
            }))
        );
    }
    assert!(engine.parse_id("7FFFFFFF", 16).is_ok());
}

#[test]
fn clones_share_counters() {
    let engine = engine(Policy::Strict, MockTime {
        millis: EPOCH_MS + 3,
    });
    let twin = engine.clone();
    let a = engine.next_id().unwrap();
    let b = twin.next_id().unwrap();
    assert_eq!(engine.sequence_of(a), 0);
    assert_eq!(twin.sequence_of(b), 1);
}

#[test]
fn describe_reflects_layout_and_counters() {
    let engine = engine(Policy::Strict, MockTime {
        millis: EPOCH_MS + 3,
    });
    engine.next_id().unwrap();
    engine.next_id().unwrap();

    let snapshot = engine.describe().unwrap();
    assert_eq!(snapshot.layout.total_bits, 64);
    assert_eq!(snapshot.layout.time_shift, 22);
    assert_eq!(snapshot.identity.policy, Policy::Strict);
    assert_eq!(snapshot.state.last_slot, Some(EPOCH_MS + 3));
    assert_eq!(snapshot.state.sequence, 1);
    assert_eq!(snapshot.state.ahead_by, 0);

    let debug = format!("{engine:?}");
    assert!(debug.starts_with("Snowbit {"));
    assert!(debug.contains("policy: strict"));
}

#[test]
fn u128_layout_issues_100_bit_ids() {
    let layout = LayoutConfig {
        total_bits: 100,
        time_bits: 53,
        location_a_bits: 10,
        location_b_bits: 10,
        sequence_bits: 26,
        ..LayoutConfig::default()
    };
    let engine = Snowbit::<u128, _>::with_time(
        EngineConfig::new(1023, 7).with_layout(layout),
        MockTime {
            millis: EPOCH_MS + 77,
        },
    )
    .unwrap();
    let id = engine.next_id().unwrap();
    assert!(id < 1 << 99);
    let parts = engine.decompose(id);
    assert_eq!(parts.elapsed, 77);
    assert_eq!(parts.location_a, 1023);
    assert_eq!(parts.location_b, 7);
    assert_eq!(parts.timestamp_ms, EPOCH_MS + 77);
}

#[cfg(feature = "wide")]
#[test]
fn u256_layout_issues_213_bit_ids() {
    use crate::U256;

    let layout = LayoutConfig {
        total_bits: 213,
        time_bits: 53,
        location_a_bits: 53,
        location_b_bits: 53,
        sequence_bits: 53,
        ..LayoutConfig::default()
    };
    let a = (1 << 53) - 1;
    let engine = Snowbit::<U256, _>::with_time(
        EngineConfig::new(a, 12_345).with_layout(layout),
        MockTime {
            millis: EPOCH_MS + 5,
        },
    )
    .unwrap();
    let id1 = engine.next_id().unwrap();
    let id2 = engine.next_id().unwrap();
    assert!(id1 < id2);
    assert!(id2 < U256::from(1u64) << 212u32);

    let parts = engine.decompose(id2);
    assert_eq!(parts.elapsed, 5);
    assert_eq!(parts.location_a, a);
    assert_eq!(parts.location_b, 12_345);
    assert_eq!(parts.sequence, 1);
}

#[test]
fn resilient_ids_are_unique_across_threads() {
    run_unique_across_threads(Policy::Resilient);
}

#[test]
fn strict_ids_are_unique_across_threads() {
    run_unique_across_threads(Policy::Strict);
}

#[test]
fn system_clock_ids_are_monotonic() {
    let engine = Snowbit::<u64, SystemClock>::new(EngineConfig::classic(0, 1)).unwrap();
    let mut last = 0;
    for _ in 0..4096 * 16 {
        let id = engine.next_id().unwrap();
        assert!(id > last);
        last = id;
    }
}
