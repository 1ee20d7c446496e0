//! Time slots and declared staff availability.

mod availability;
mod time_slot;

pub use availability::StaffDailyAvailability;
pub use time_slot::TimeSlot;
