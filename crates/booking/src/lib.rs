//! Appointment booking orchestration.
//!
//! `BookingService::book_appointment` validates a booking request against
//! the external collaborators in a fixed order and fails fast:
//! 1. Staff capability for the service
//! 2. Service lookup (derives the appointment length)
//! 3. Window construction
//! 4. Declared staff availability
//! 5. Advisory overlap check against existing appointments
//! 6. Persistence, where the store has the final word on overlaps
//! 7. Best-effort event publication
//!
//! Lifecycle transitions (confirm, complete, cancel, no-show) load the
//! appointment, run the pure transition and persist it with an expected
//! version.

pub mod commands;
pub mod error;
pub mod service;
pub mod services;

pub use commands::BookAppointment;
pub use error::{BookingError, Result};
pub use service::BookingService;
pub use services::{
    EventPublisher, InMemoryAvailabilityStore, InMemoryCapabilities, InMemoryEventPublisher,
    InMemoryServiceCatalog, LookupError, PublishError, ServiceLookup, StaffAvailabilityStore,
    StaffCapabilityLookup,
};
