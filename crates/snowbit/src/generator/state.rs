use core::cmp::Ordering;

use crate::{
    config::Policy,
    error::{Error, Result},
};

/// The per-engine constants [`SequenceState::advance`] is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotRules {
    pub epoch_slot: u64,
    pub max_time: u64,
    pub max_sequence: u64,
    pub policy: Policy,
}

/// What the state machine had to do to the wall-clock slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Adjustment {
    None,
    /// The clock read `behind_by` slots behind the last issued slot.
    ClockClamped { behind_by: u64 },
    /// The last slot was full and the time field was pushed one slot ahead.
    SlotAdvanced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Ready {
        slot: u64,
        sequence: u64,
        adjustment: Adjustment,
    },
    /// Strict overflow: nothing may be issued before `until_slot`.
    Pending { until_slot: u64 },
}

/// The two counters every engine owns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SequenceState {
    /// `None` until the first identifier is issued.
    last_slot: Option<u64>,
    sequence: u64,
}

impl SequenceState {
    pub const fn last_slot(&self) -> Option<u64> {
        self.last_slot
    }

    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Moves the state forward for a clock reading of `now_slot`.
    ///
    /// State is only committed once an identifier can be issued: a strict
    /// rollback, a strict overflow and time-field exhaustion all leave it
    /// untouched.
    pub fn advance(&mut self, now_slot: u64, rules: &SlotRules) -> Result<Step> {
        let (slot, sequence, adjustment) = match self.last_slot {
            // First issue. Anything before the epoch counts as a rollback
            // against the epoch itself.
            None if now_slot < rules.epoch_slot => {
                Self::behind(now_slot, rules.epoch_slot, rules.policy)?;
                (
                    rules.epoch_slot,
                    0,
                    Adjustment::ClockClamped {
                        behind_by: rules.epoch_slot - now_slot,
                    },
                )
            }
            None => (now_slot, 0, Adjustment::None),
            Some(last) => match now_slot.cmp(&last) {
                Ordering::Greater => (now_slot, 0, Adjustment::None),
                Ordering::Equal => match self.same_slot(last, rules, Adjustment::None) {
                    Some(next) => next,
                    None => return Ok(Self::pending_after(last)),
                },
                Ordering::Less => {
                    Self::behind(now_slot, last, rules.policy)?;
                    let clamped = Adjustment::ClockClamped {
                        behind_by: last - now_slot,
                    };
                    match self.same_slot(last, rules, clamped) {
                        Some(next) => next,
                        None => return Ok(Self::pending_after(last)),
                    }
                }
            },
        };

        let elapsed = slot - rules.epoch_slot;
        if elapsed > rules.max_time {
            return Err(Error::TimeFieldExhausted {
                elapsed,
                max: rules.max_time,
            });
        }

        self.last_slot = Some(slot);
        self.sequence = sequence;
        Ok(Step::Ready {
            slot,
            sequence,
            adjustment,
        })
    }

    /// Next `(slot, sequence)` within `last`, or `None` when a strict engine
    /// has to wait for the clock.
    fn same_slot(
        &self,
        last: u64,
        rules: &SlotRules,
        adjustment: Adjustment,
    ) -> Option<(u64, u64, Adjustment)> {
        if self.sequence < rules.max_sequence {
            return Some((last, self.sequence + 1, adjustment));
        }
        match rules.policy {
            Policy::Resilient => Some((last.saturating_add(1), 0, Adjustment::SlotAdvanced)),
            Policy::Strict => None,
        }
    }

    const fn pending_after(last: u64) -> Step {
        Step::Pending {
            until_slot: last.saturating_add(1),
        }
    }

    #[cold]
    #[inline(never)]
    fn behind(current: u64, last: u64, policy: Policy) -> Result<()> {
        match policy {
            Policy::Resilient => Ok(()),
            Policy::Strict => Err(Error::ClockRollback { current, last }),
        }
    }
}
