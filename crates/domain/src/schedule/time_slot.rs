//! Half-open time-of-day interval.

use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A contiguous time-of-day interval `[start, end)`.
///
/// Invariant: `start < end`. Slots never span midnight. Ordering is by start,
/// then by end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSlot")]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawTimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawTimeSlot> for TimeSlot {
    type Error = DomainError;

    fn try_from(raw: RawTimeSlot) -> Result<Self, Self::Error> {
        TimeSlot::new(raw.start, raw.end)
    }
}

impl TimeSlot {
    /// Creates a slot, failing with `InvalidTimeSlot` unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidTimeSlot { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates the slot covering `duration_minutes` from `start`.
    ///
    /// There is no roll-over into the next day: a window that would end at or
    /// past midnight is rejected.
    pub fn starting_at(start: NaiveTime, duration_minutes: u32) -> Result<Self, DomainError> {
        if duration_minutes == 0 {
            return Err(DomainError::InvalidDuration {
                minutes: duration_minutes,
            });
        }

        let (end, overflow) =
            start.overflowing_add_signed(TimeDelta::minutes(i64::from(duration_minutes)));
        if overflow != 0 {
            return Err(DomainError::SlotPastMidnight {
                start,
                minutes: duration_minutes,
            });
        }

        Self::new(start, end)
    }

    /// Returns the inclusive start of the slot.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Returns the exclusive end of the slot.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Returns the length of the slot in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_minutes()
    }

    /// Returns true if the two slots share at least one instant.
    ///
    /// Touching boundaries (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `other` lies entirely within this slot.
    pub fn contains(&self, other: &TimeSlot) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}
