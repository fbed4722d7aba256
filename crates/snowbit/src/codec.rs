use crate::{config::TimePrecision, layout::BitLayout, word::Word};

/// The fields recovered from an identifier.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Decomposed {
    /// Absolute timestamp the slot starts at, in milliseconds since 1970.
    pub timestamp_ms: u64,
    /// Absolute time slot (epoch added back).
    pub time_slot: u64,
    /// Raw time field: slots since the epoch.
    pub elapsed: u64,
    pub location_a: u64,
    pub location_b: u64,
    pub sequence: u64,
}

/// Packs the four fields into an identifier.
///
/// No bounds are checked: a value wider than its field bleeds into the
/// neighbouring field. The generator only ever passes in-bound values.
pub fn compose<W: Word>(
    layout: &BitLayout<W>,
    elapsed: u64,
    location_a: u64,
    location_b: u64,
    sequence: u64,
) -> W {
    compose_with_instance(
        layout,
        elapsed,
        layout.instance_bits(location_a, location_b),
        sequence,
    )
}

/// Packs a time field and sequence around precomputed instance bits.
pub fn compose_with_instance<W: Word>(
    layout: &BitLayout<W>,
    elapsed: u64,
    instance_bits: W,
    sequence: u64,
) -> W {
    W::from(elapsed).shl_or_zero(layout.time_shift()) | instance_bits | W::from(sequence)
}

/// Unpacks an identifier, re-basing the time field onto `epoch_slot`.
pub fn decompose<W: Word>(
    layout: &BitLayout<W>,
    epoch_slot: u64,
    precision: TimePrecision,
    id: W,
) -> Decomposed {
    let elapsed = layout.time_of(id);
    let time_slot = elapsed.saturating_add(epoch_slot);
    Decomposed {
        timestamp_ms: precision.to_millis(time_slot),
        time_slot,
        elapsed,
        location_a: layout.location_a_of(id),
        location_b: layout.location_b_of(id),
        sequence: layout.sequence_of(id),
    }
}
