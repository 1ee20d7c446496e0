//! Projection error types.

use common::AppointmentId;
use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An event refers to an appointment the projection has never seen.
    #[error("Unknown appointment: {0}")]
    UnknownAppointment(AppointmentId),

    /// An event carries data the projection cannot use.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// A projection-specific error.
    #[error("Projection error: {0}")]
    Projection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
