//! Staff availability for a single calendar day.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use common::{AvailabilityId, BusinessId, StaffId};
use serde::{Deserialize, Serialize};

use super::TimeSlot;

/// The working windows a staff member has declared for one calendar date.
///
/// Created or replaced by schedule management; the booking workflow only
/// reads it. A requested window is available when it fits entirely inside
/// one declared slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffDailyAvailability {
    id: AvailabilityId,
    staff_id: StaffId,
    business_id: BusinessId,
    date: NaiveDate,
    slots: BTreeSet<TimeSlot>,
}

impl StaffDailyAvailability {
    /// Creates the availability of a staff member for `date`.
    pub fn new(
        staff_id: StaffId,
        business_id: BusinessId,
        date: NaiveDate,
        slots: impl IntoIterator<Item = TimeSlot>,
    ) -> Self {
        Self {
            id: AvailabilityId::new(),
            staff_id,
            business_id,
            date,
            slots: slots.into_iter().collect(),
        }
    }

    /// Adds another declared slot.
    pub fn with_slot(mut self, slot: TimeSlot) -> Self {
        self.slots.insert(slot);
        self
    }

    pub fn id(&self) -> AvailabilityId {
        self.id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn business_id(&self) -> BusinessId {
        self.business_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the declared slots ordered by start time.
    pub fn slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    /// Returns true iff `date` is this aggregate's date and `requested` is
    /// contained in at least one declared slot.
    ///
    /// "Not available" is a normal outcome, not an error.
    pub fn is_available(&self, date: NaiveDate, requested: &TimeSlot) -> bool {
        date == self.date && self.slots.iter().any(|slot| slot.contains(requested))
    }

    /// Returns the declared slots with overlapping or touching slots merged.
    pub fn merged_slots(&self) -> Vec<TimeSlot> {
        let mut merged: Vec<TimeSlot> = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            match merged.last_mut() {
                Some(last) if slot.start() <= last.end() => {
                    if slot.end() > last.end() {
                        // start < end holds because last.start <= slot.start < slot.end
                        *last = TimeSlot::new(last.start(), slot.end()).unwrap_or(*last);
                    }
                }
                _ => merged.push(*slot),
            }
        }
        merged
    }

    /// Returns the number of minutes covered by at least one declared slot.
    pub fn total_available_minutes(&self) -> i64 {
        self.merged_slots()
            .iter()
            .map(TimeSlot::duration_minutes)
            .sum()
    }
}
