//! Appointment status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The status of an appointment in its lifecycle.
///
/// State transitions:
/// ```text
/// Scheduled ──► Confirmed ──┬──► Completed
///     │             │       └──► NoShow
///     └─────────────┴──────────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AppointmentStatus {
    /// Booked, awaiting confirmation.
    #[default]
    Scheduled,

    /// Confirmed by the business or the client.
    Confirmed,

    /// The appointment took place (terminal state).
    Completed,

    /// The appointment was called off (terminal state).
    Cancelled,

    /// The client did not show up (terminal state).
    NoShow,
}

impl AppointmentStatus {
    /// Returns true if the appointment can be confirmed in this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled)
    }

    /// Returns true if the appointment can be completed in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed)
    }

    /// Returns true if the appointment can be marked as a no-show in this state.
    pub fn can_mark_no_show(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed)
    }

    /// Returns true if the appointment can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Returns true if the appointment still occupies its staff member's time.
    ///
    /// Only cancelled appointments release their window.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "NoShow",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown appointment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(AppointmentStatus::Scheduled),
            "Confirmed" => Ok(AppointmentStatus::Confirmed),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            "NoShow" => Ok(AppointmentStatus::NoShow),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
