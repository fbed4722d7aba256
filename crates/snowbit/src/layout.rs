use crate::word::Word;

/// Names a field of the identifier layout.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Time,
    LocationA,
    LocationB,
    Sequence,
}

impl Field {
    /// The snake_case name used in errors and debug output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::LocationA => "location_a",
            Self::LocationB => "location_b",
            Self::Sequence => "sequence",
        }
    }
}

/// The four declared field widths, in bits.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldWidths {
    pub time: u32,
    pub location_a: u32,
    pub location_b: u32,
    pub sequence: u32,
}

impl FieldWidths {
    /// Sum of all field widths. The identifier is one bit wider.
    pub const fn sum(&self) -> u32 {
        self.time + self.location_a + self.location_b + self.sequence
    }

    /// Width of the given field.
    pub const fn get(&self, field: Field) -> u32 {
        match field {
            Field::Time => self.time,
            Field::LocationA => self.location_a,
            Field::LocationB => self.location_b,
            Field::Sequence => self.sequence,
        }
    }
}

/// Largest value representable in `bits` bits, saturating at `u64::MAX`.
pub const fn max_for_bits(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else if bits >= u64::BITS {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Shift amounts, masks and maxima derived from a bit partition.
///
/// ```text
///  Bit Index:  T-1        T-2     ts   ts-1    as   as-1    bs   bs-1      0
///              +------------+--------+-------------+-------------+----------+
///  Field:      | reserved   | time   | location_a  | location_b  | sequence |
///              +------------+--------+-------------+-------------+----------+
/// ```
///
/// `ts`, `as` and `bs` are the time, location A and location B shifts. The
/// sequence is never shifted.
///
/// Construction has no failure path; widths are expected to have been checked
/// by [`EngineConfig::validate`] first. A shift at or beyond the word width
/// produces an all-zero mask rather than a panic.
///
/// [`EngineConfig::validate`]: crate::EngineConfig::validate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout<W: Word> {
    widths: FieldWidths,
    time_shift: u32,
    location_a_shift: u32,
    location_b_shift: u32,
    time_mask: W,
    location_a_mask: W,
    location_b_mask: W,
    sequence_mask: W,
    max_time: u64,
    max_location_a: u64,
    max_location_b: u64,
    max_sequence: u64,
}

impl<W: Word> BitLayout<W> {
    /// Derives the layout for the given widths.
    pub fn from_widths(widths: FieldWidths) -> Self {
        let location_b_shift = widths.sequence;
        let location_a_shift = widths.location_b + location_b_shift;
        let time_shift = widths.location_a + location_a_shift;

        let max_time = max_for_bits(widths.time);
        let max_location_a = max_for_bits(widths.location_a);
        let max_location_b = max_for_bits(widths.location_b);
        let max_sequence = max_for_bits(widths.sequence);

        Self {
            widths,
            time_shift,
            location_a_shift,
            location_b_shift,
            time_mask: W::from(max_time).shl_or_zero(time_shift),
            location_a_mask: W::from(max_location_a).shl_or_zero(location_a_shift),
            location_b_mask: W::from(max_location_b).shl_or_zero(location_b_shift),
            sequence_mask: W::from(max_sequence),
            max_time,
            max_location_a,
            max_location_b,
            max_sequence,
        }
    }

    /// The widths this layout was derived from.
    pub const fn widths(&self) -> FieldWidths {
        self.widths
    }

    /// Declared identifier width including the reserved bit.
    pub const fn total_bits(&self) -> u32 {
        self.widths.sum() + 1
    }

    /// Bit offset of the time field.
    pub const fn time_shift(&self) -> u32 {
        self.time_shift
    }

    /// Bit offset of location A.
    pub const fn location_a_shift(&self) -> u32 {
        self.location_a_shift
    }

    /// Bit offset of location B, equal to the sequence width.
    pub const fn location_b_shift(&self) -> u32 {
        self.location_b_shift
    }

    /// In-place mask of the time field.
    pub const fn time_mask(&self) -> W {
        self.time_mask
    }

    /// In-place mask of location A.
    pub const fn location_a_mask(&self) -> W {
        self.location_a_mask
    }

    /// In-place mask of location B.
    pub const fn location_b_mask(&self) -> W {
        self.location_b_mask
    }

    /// Mask of the sequence field.
    pub const fn sequence_mask(&self) -> W {
        self.sequence_mask
    }

    /// Largest value the time field holds.
    pub const fn max_time(&self) -> u64 {
        self.max_time
    }

    /// Largest location A value.
    pub const fn max_location_a(&self) -> u64 {
        self.max_location_a
    }

    /// Largest location B value.
    pub const fn max_location_b(&self) -> u64 {
        self.max_location_b
    }

    /// Largest per-slot sequence; one slot issues `max_sequence + 1` ids.
    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    /// Maximum value of the given field.
    pub const fn max_of(&self, field: Field) -> u64 {
        match field {
            Field::Time => self.max_time,
            Field::LocationA => self.max_location_a,
            Field::LocationB => self.max_location_b,
            Field::Sequence => self.max_sequence,
        }
    }

    /// Pre-shifted, OR-ready combination of both location values.
    pub fn instance_bits(&self, location_a: u64, location_b: u64) -> W {
        W::from(location_a).shl_or_zero(self.location_a_shift)
            | W::from(location_b).shl_or_zero(self.location_b_shift)
    }

    /// Whether `id` has no bits set at or above the reserved bit.
    pub fn contains(&self, id: W) -> bool {
        let top = self.widths.sum();
        top >= W::BITS || (id >> top).is_zero()
    }

    /// Extracts the time field (slots since the epoch).
    pub fn time_of(&self, id: W) -> u64 {
        ((id & self.time_mask) >> self.time_shift).low_u64()
    }

    /// Extracts location A.
    pub fn location_a_of(&self, id: W) -> u64 {
        ((id & self.location_a_mask) >> self.location_a_shift).low_u64()
    }

    /// Extracts location B.
    pub fn location_b_of(&self, id: W) -> u64 {
        ((id & self.location_b_mask) >> self.location_b_shift).low_u64()
    }

    /// Extracts the sequence field.
    pub fn sequence_of(&self, id: W) -> u64 {
        (id & self.sequence_mask).low_u64()
    }
}
