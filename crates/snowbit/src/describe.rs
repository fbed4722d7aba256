use core::fmt;

use crate::{
    codec::Decomposed,
    config::{EngineConfig, Policy, TimePrecision},
    generator::SequenceState,
    layout::{BitLayout, FieldWidths},
    word::Word,
};

/// Derived layout constants of an engine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutSnapshot {
    pub total_bits: u32,
    pub time_precision: TimePrecision,
    pub epoch_ms: u64,
    pub epoch_slot: u64,
    pub widths: FieldWidths,
    pub time_shift: u32,
    pub location_a_shift: u32,
    pub location_b_shift: u32,
    pub max_time: u64,
    pub max_location_a: u64,
    pub max_location_b: u64,
    pub max_sequence: u64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdentitySnapshot {
    pub location_a: u64,
    pub location_b: u64,
    pub policy: Policy,
    pub wait_timeout_ms: Option<u64>,
}

/// The engine counters at the time of the snapshot.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateSnapshot {
    /// Last issued slot, `None` before the first identifier.
    pub last_slot: Option<u64>,
    pub sequence: u64,
    /// Wall-clock slot when the snapshot was taken.
    pub current_slot: u64,
    /// How many slots the time field runs ahead of the wall clock. Only a
    /// resilient engine under sustained overload or after a clock rollback
    /// reports a non-zero value.
    pub ahead_by: u64,
}

/// A diagnostic dump of an engine.
///
/// `Display` renders it as nested key/value text; with the `serde` feature it
/// can be logged as a structured record instead. The format is not part of
/// the identifier contract.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot {
    pub layout: LayoutSnapshot,
    pub identity: IdentitySnapshot,
    pub state: StateSnapshot,
}

impl Snapshot {
    pub(crate) fn capture<W: Word>(
        config: &EngineConfig,
        layout: &BitLayout<W>,
        state: SequenceState,
        current_slot: u64,
    ) -> Self {
        let last_slot = state.last_slot();
        Self {
            layout: LayoutSnapshot {
                total_bits: layout.total_bits(),
                time_precision: config.layout.time_precision,
                epoch_ms: u64::try_from(config.layout.epoch.as_millis()).unwrap_or(u64::MAX),
                epoch_slot: config.layout.epoch_slot(),
                widths: layout.widths(),
                time_shift: layout.time_shift(),
                location_a_shift: layout.location_a_shift(),
                location_b_shift: layout.location_b_shift(),
                max_time: layout.max_time(),
                max_location_a: layout.max_location_a(),
                max_location_b: layout.max_location_b(),
                max_sequence: layout.max_sequence(),
            },
            identity: IdentitySnapshot {
                location_a: config.location_a,
                location_b: config.location_b,
                policy: config.policy,
                wait_timeout_ms: config
                    .wait_timeout
                    .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            },
            state: StateSnapshot {
                last_slot,
                sequence: state.sequence(),
                current_slot,
                ahead_by: last_slot.map_or(0, |last| last.saturating_sub(current_slot)),
            },
        }
    }
}

struct Section<'a> {
    name: &'a str,
    entries: Vec<(&'a str, String)>,
}

impl fmt::Display for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}: {{", self.name)?;
        for (key, value) in &self.entries {
            writeln!(f, "    {key}: {value},")?;
        }
        write!(f, "  }}")
    }
}

fn field(bits: u32, shift: u32, max: u64) -> String {
    format!("{bits} bits << {shift} (max {max})")
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l = &self.layout;
        let layout = Section {
            name: "layout",
            entries: vec![
                ("total_bits", l.total_bits.to_string()),
                ("time_precision", l.time_precision.to_string()),
                ("epoch_ms", l.epoch_ms.to_string()),
                ("time", field(l.widths.time, l.time_shift, l.max_time)),
                (
                    "location_a",
                    field(l.widths.location_a, l.location_a_shift, l.max_location_a),
                ),
                (
                    "location_b",
                    field(l.widths.location_b, l.location_b_shift, l.max_location_b),
                ),
                ("sequence", field(l.widths.sequence, 0, l.max_sequence)),
            ],
        };

        let i = &self.identity;
        let identity = Section {
            name: "identity",
            entries: vec![
                ("location_a", i.location_a.to_string()),
                ("location_b", i.location_b.to_string()),
                ("policy", i.policy.to_string()),
                (
                    "wait_timeout",
                    i.wait_timeout_ms
                        .map_or_else(|| "none".to_owned(), |ms| format!("{ms}ms")),
                ),
            ],
        };

        let s = &self.state;
        let state = Section {
            name: "state",
            entries: vec![
                (
                    "last_slot",
                    s.last_slot
                        .map_or_else(|| "none".to_owned(), |slot| slot.to_string()),
                ),
                ("sequence", s.sequence.to_string()),
                ("current_slot", s.current_slot.to_string()),
                ("ahead_by", s.ahead_by.to_string()),
            ],
        };

        writeln!(f, "Snowbit {{")?;
        writeln!(f, "{layout},")?;
        writeln!(f, "{identity},")?;
        writeln!(f, "{state}")?;
        write!(f, "}}")
    }
}

fn center(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(s.len());
    let left = pad / 2;
    format!("{}{s}{}", " ".repeat(left), " ".repeat(pad - left))
}

fn border(f: &mut fmt::Formatter<'_>, columns: &[usize]) -> fmt::Result {
    write!(f, "    +")?;
    for &w in columns {
        write!(f, "{}+", "-".repeat(w))?;
    }
    writeln!(f)
}

fn row(f: &mut fmt::Formatter<'_>, cells: &[String], columns: &[usize]) -> fmt::Result {
    write!(f, "    |")?;
    for (cell, &w) in cells.iter().zip(columns) {
        write!(f, "{}|", center(cell, w))?;
    }
    writeln!(f)
}

/// Renders a decomposed identifier as a field table. Zero-width fields are
/// left out.
///
/// ```text
/// id 0x1b2f... (12345...)
///     +-----------+---------------+---------------+-------------+
///     | time (41) | location_a (5)| location_b (5)| sequence (12)|
///     ...
/// ```
pub struct DecomposedTable<'a, W: Word> {
    pub id: W,
    pub parts: &'a Decomposed,
    pub widths: FieldWidths,
}

impl<W: Word> fmt::Display for DecomposedTable<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<(String, u64)> = [
            ("time", self.widths.time, self.parts.elapsed),
            ("location_a", self.widths.location_a, self.parts.location_a),
            ("location_b", self.widths.location_b, self.parts.location_b),
            ("sequence", self.widths.sequence, self.parts.sequence),
        ]
        .into_iter()
        .filter(|&(_, bits, _)| bits > 0)
        .map(|(name, bits, value)| (format!("{name} ({bits})"), value))
        .collect();

        let labels: Vec<String> = fields.iter().map(|(label, _)| label.clone()).collect();
        let decimals: Vec<String> = fields.iter().map(|(_, v)| v.to_string()).collect();
        let hexes: Vec<String> = fields.iter().map(|(_, v)| format!("0x{v:x}")).collect();

        let columns: Vec<usize> = (0..fields.len())
            .map(|i| labels[i].len().max(decimals[i].len()).max(hexes[i].len()) + 2)
            .collect();

        writeln!(f, "id 0x{:x} ({})", self.id, self.id)?;
        writeln!(
            f,
            "timestamp {}ms (slot {})",
            self.parts.timestamp_ms, self.parts.time_slot
        )?;
        border(f, &columns)?;
        row(f, &labels, &columns)?;
        border(f, &columns)?;
        row(f, &decimals, &columns)?;
        row(f, &hexes, &columns)?;
        border(f, &columns)
    }
}
