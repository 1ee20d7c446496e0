//! Domain error types.

use chrono::NaiveTime;
use thiserror::Error;

use crate::appointment::AppointmentStatus;

/// Errors that can occur during domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A time slot must start strictly before it ends.
    #[error("Invalid time slot: start {start} must be before end {end}")]
    InvalidTimeSlot { start: NaiveTime, end: NaiveTime },

    /// A slot length derived from a service must be positive.
    #[error("Invalid duration: {minutes} minutes (must be greater than 0)")]
    InvalidDuration { minutes: u32 },

    /// A slot derived from a service duration would roll over into the next day.
    #[error("Time slot starting at {start} with {minutes} minutes runs past midnight")]
    SlotPastMidnight { start: NaiveTime, minutes: u32 },

    /// The appointment is not in a state that allows the requested transition.
    #[error("Invalid appointment transition: cannot {action} from {from} state")]
    InvalidAppointmentTransition {
        from: AppointmentStatus,
        action: &'static str,
    },
}

impl DomainError {
    /// Returns true for every kind of malformed time window.
    pub fn is_invalid_time_slot(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidTimeSlot { .. }
                | DomainError::InvalidDuration { .. }
                | DomainError::SlotPastMidnight { .. }
        )
    }
}
