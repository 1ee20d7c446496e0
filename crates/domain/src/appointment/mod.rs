//! Appointment aggregate and related types.

mod aggregate;
mod events;
mod state;

pub use aggregate::{Appointment, AppointmentRecord, NewAppointment};
pub use events::{
    AppointmentCancelledData, AppointmentCompletedData, AppointmentConfirmedData,
    AppointmentEvent, AppointmentMarkedNoShowData, AppointmentScheduledData,
};
pub use state::{AppointmentStatus, UnknownStatus};
