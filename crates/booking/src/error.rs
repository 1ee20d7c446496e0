//! Booking error types.

use appointment_store::StoreError;
use chrono::NaiveDate;
use common::{AppointmentId, BusinessId, ServiceId, StaffId};
use domain::{AppointmentStatus, DomainError, TimeSlot};
use thiserror::Error;

use crate::services::LookupError;

/// Errors that can occur during booking operations.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The staff member is not qualified for the requested service.
    #[error("Staff {staff_id} cannot perform service {service_id}")]
    StaffCannotPerformService {
        staff_id: StaffId,
        service_id: ServiceId,
    },

    /// The requested service does not exist.
    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// The requested window is not a valid time slot.
    #[error("{0}")]
    InvalidTimeSlot(DomainError),

    /// The staff member has no availability configured for the business.
    #[error("No availability configured for staff {staff_id} at business {business_id}")]
    AvailabilityNotConfigured {
        staff_id: StaffId,
        business_id: BusinessId,
    },

    /// The window is outside the staff member's declared availability.
    #[error("Staff {staff_id} is not available {slot} on {date}")]
    StaffNotAvailable {
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    },

    /// An existing appointment already overlaps the window (advisory check).
    #[error("Staff {staff_id} is already booked {slot} on {date}")]
    StaffDoubleBooked {
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
        existing: AppointmentId,
    },

    /// A concurrent booking won the window (authoritative store rejection).
    #[error("Booking conflict: staff {staff_id} was booked {slot} on {date} concurrently")]
    BookingConflict {
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    },

    /// The appointment cannot make the requested lifecycle transition.
    #[error("Cannot {action} appointment in {from} status")]
    InvalidAppointmentTransition {
        from: AppointmentStatus,
        action: &'static str,
    },

    /// The appointment does not exist.
    #[error("Appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),

    /// The appointment changed between load and update.
    #[error("Appointment {0} was modified concurrently")]
    ConcurrentModification(AppointmentId),

    /// Appointment store failure.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Collaborator lookup failure.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
}

impl BookingError {
    /// Returns true if the window is taken, whether detected by the advisory
    /// check or by the store.
    pub fn is_slot_unavailable(&self) -> bool {
        matches!(
            self,
            BookingError::StaffDoubleBooked { .. } | BookingError::BookingConflict { .. }
        )
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Store(_) | BookingError::Lookup(_))
    }

    /// Returns a stable, snake_case name for metrics labels and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            BookingError::StaffCannotPerformService { .. } => "staff_cannot_perform_service",
            BookingError::ServiceNotFound(_) => "service_not_found",
            BookingError::InvalidTimeSlot(_) => "invalid_time_slot",
            BookingError::AvailabilityNotConfigured { .. } => "availability_not_configured",
            BookingError::StaffNotAvailable { .. } => "staff_not_available",
            BookingError::StaffDoubleBooked { .. } => "staff_double_booked",
            BookingError::BookingConflict { .. } => "booking_conflict",
            BookingError::InvalidAppointmentTransition { .. } => "invalid_transition",
            BookingError::AppointmentNotFound(_) => "appointment_not_found",
            BookingError::ConcurrentModification(_) => "concurrent_modification",
            BookingError::Store(_) => "store_error",
            BookingError::Lookup(_) => "lookup_error",
        }
    }
}

impl From<DomainError> for BookingError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidAppointmentTransition { from, action } => {
                BookingError::InvalidAppointmentTransition { from, action }
            }
            other => BookingError::InvalidTimeSlot(other),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OverlappingAppointment {
                staff_id,
                date,
                slot,
            } => BookingError::BookingConflict {
                staff_id,
                date,
                slot,
            },
            StoreError::VersionConflict { appointment_id, .. } => {
                BookingError::ConcurrentModification(appointment_id)
            }
            StoreError::NotFound(id) => BookingError::AppointmentNotFound(id),
            other => BookingError::Store(other),
        }
    }
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
