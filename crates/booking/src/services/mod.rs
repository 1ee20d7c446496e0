//! Collaborator contracts consulted by the booking workflow, with in-memory
//! implementations.

pub mod availability;
pub mod capability;
pub mod catalog;
pub mod publisher;

use thiserror::Error;

pub use availability::{InMemoryAvailabilityStore, StaffAvailabilityStore};
pub use capability::{InMemoryCapabilities, StaffCapabilityLookup};
pub use catalog::{InMemoryServiceCatalog, ServiceLookup};
pub use publisher::{EventPublisher, InMemoryEventPublisher, PublishError};

/// Failure of an external lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The collaborator could not be reached or did not answer.
    #[error("{lookup} unavailable: {reason}")]
    Unavailable {
        lookup: &'static str,
        reason: String,
    },
}

impl LookupError {
    /// Creates an `Unavailable` error for the named collaborator.
    pub fn unavailable(lookup: &'static str, reason: impl Into<String>) -> Self {
        LookupError::Unavailable {
            lookup,
            reason: reason.into(),
        }
    }
}
