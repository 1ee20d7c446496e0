//! Booking commands.

use chrono::{NaiveDate, NaiveTime};
use common::{BusinessId, ClientId, ServiceId, StaffId};
use serde::{Deserialize, Serialize};

/// Command to book an appointment.
///
/// The window length is not part of the request; it is derived from the
/// service duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAppointment {
    pub business_id: BusinessId,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,

    /// Carried onto the appointment for display; scheduling ignores it.
    #[serde(default)]
    pub client_timezone: Option<String>,
}

impl BookAppointment {
    /// Creates a booking request without notes or timezone.
    pub fn new(
        business_id: BusinessId,
        client_id: ClientId,
        staff_id: StaffId,
        service_id: ServiceId,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Self {
        Self {
            business_id,
            client_id,
            staff_id,
            service_id,
            date,
            start_time,
            notes: None,
            client_timezone: None,
        }
    }

    /// Attaches free-text notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attaches the client's timezone.
    pub fn with_client_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.client_timezone = Some(timezone.into());
        self
    }
}
