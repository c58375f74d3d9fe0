//! Append-only value history keyed by logical time.
//!
//! Entries are strictly increasing in `time`. A write at the time of the
//! latest entry overwrites it; earlier times are rejected, so history is
//! never rewritten.

use agora_types::Amount;
use serde::{Deserialize, Serialize};

use crate::error::VotesError;

/// A value in force from `time` until the next checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub time: u64,
    pub value: Amount,
}

/// Ordered checkpoint log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoints {
    entries: Vec<Checkpoint>,
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `time`. Returns `(previous, current)`.
    ///
    /// No-op when the value is unchanged.
    pub fn push(&mut self, time: u64, value: Amount) -> Result<(Amount, Amount), VotesError> {
        let previous = self.latest();

        if let Some(last) = self.entries.last_mut() {
            if time < last.time {
                return Err(VotesError::CheckpointOutOfOrder {
                    last: last.time,
                    attempted: time,
                });
            }
            if last.value == value {
                return Ok((previous, value));
            }
            if last.time == time {
                last.value = value;
                return Ok((previous, value));
            }
        } else if value == 0 {
            return Ok((0, 0));
        }

        self.entries.push(Checkpoint { time, value });
        Ok((previous, value))
    }

    /// Value of the latest checkpoint with `checkpoint.time <= time`, or 0.
    pub fn upper_lookup(&self, time: u64) -> Amount {
        let idx = self.entries.partition_point(|c| c.time <= time);
        match idx {
            0 => 0,
            n => self.entries[n - 1].value,
        }
    }

    /// Most recent value, or 0 when empty.
    pub fn latest(&self) -> Amount {
        self.entries.last().map(|c| c.value).unwrap_or(0)
    }

    pub fn latest_checkpoint(&self) -> Option<Checkpoint> {
        self.entries.last().copied()
    }

    pub fn get(&self, pos: usize) -> Option<Checkpoint> {
        self.entries.get(pos).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
