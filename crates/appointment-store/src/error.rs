use chrono::NaiveDate;
use domain::TimeSlot;
use thiserror::Error;

use crate::{AppointmentId, StaffId, Version};

/// Errors that can occur when interacting with the appointment store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The appointment would overlap a non-cancelled appointment of the same
    /// staff member. This is the authoritative double-booking rejection.
    #[error("Staff {staff_id} already has an appointment overlapping {slot} on {date}")]
    OverlappingAppointment {
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    },

    /// The stored appointment has moved on since it was loaded.
    #[error(
        "Version conflict for appointment {appointment_id}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        appointment_id: AppointmentId,
        expected: Version,
        actual: Version,
    },

    /// The appointment was not found.
    #[error("Appointment not found: {0}")]
    NotFound(AppointmentId),

    /// An appointment with this id has already been saved.
    #[error("Appointment already exists: {0}")]
    DuplicateId(AppointmentId),

    /// An update tried to change more than the lifecycle of an appointment.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// A stored row could not be turned back into an appointment.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The backing store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the error is a concurrency outcome rather than a failure
    /// of the store itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::OverlappingAppointment { .. } | StoreError::VersionConflict { .. }
        )
    }
}

/// Result type for appointment store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
