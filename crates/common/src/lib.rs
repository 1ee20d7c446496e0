//! Shared types for the booking platform.
//!
//! Every crate in the workspace refers to businesses, clients, staff members,
//! services and appointments through the typed identifiers defined here, so
//! that a `StaffId` can never be passed where a `ServiceId` is expected.

mod types;
mod version;

pub use types::{AppointmentId, AvailabilityId, BusinessId, ClientId, ServiceId, StaffId};
pub use version::Version;
