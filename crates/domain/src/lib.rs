//! Domain layer for the booking platform.
//!
//! This crate provides the core domain abstractions including:
//! - [`TimeSlot`] half-open time-of-day intervals with overlap and containment checks
//! - [`StaffDailyAvailability`] declared working windows of a staff member for one day
//! - [`Appointment`] aggregate with its status state machine and domain events
//! - [`ServiceInfo`] and [`Money`] describing bookable services

pub mod aggregate;
pub mod appointment;
pub mod error;
pub mod schedule;
pub mod value_objects;

pub use aggregate::{Aggregate, CommandResult, DomainEvent};
pub use appointment::{
    Appointment, AppointmentCancelledData, AppointmentCompletedData, AppointmentConfirmedData,
    AppointmentEvent, AppointmentMarkedNoShowData, AppointmentRecord, AppointmentScheduledData,
    AppointmentStatus, NewAppointment, UnknownStatus,
};
pub use error::DomainError;
pub use schedule::{StaffDailyAvailability, TimeSlot};
pub use value_objects::{Money, ServiceInfo};
