//! Appointment domain events.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{AppointmentId, BusinessId, ClientId, ServiceId, StaffId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::schedule::TimeSlot;

use super::Appointment;

/// Events that can occur on an appointment aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AppointmentEvent {
    /// Appointment was booked.
    AppointmentScheduled(AppointmentScheduledData),

    /// Appointment was confirmed.
    AppointmentConfirmed(AppointmentConfirmedData),

    /// Appointment took place.
    AppointmentCompleted(AppointmentCompletedData),

    /// Appointment was cancelled and its window released.
    AppointmentCancelled(AppointmentCancelledData),

    /// Client did not show up.
    AppointmentMarkedNoShow(AppointmentMarkedNoShowData),
}

impl DomainEvent for AppointmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AppointmentEvent::AppointmentScheduled(_) => "AppointmentScheduled",
            AppointmentEvent::AppointmentConfirmed(_) => "AppointmentConfirmed",
            AppointmentEvent::AppointmentCompleted(_) => "AppointmentCompleted",
            AppointmentEvent::AppointmentCancelled(_) => "AppointmentCancelled",
            AppointmentEvent::AppointmentMarkedNoShow(_) => "AppointmentMarkedNoShow",
        }
    }
}

/// Data for AppointmentScheduled event.
///
/// Carries the full booking identity and window so that read models can
/// retire the slot without loading the appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentScheduledData {
    pub appointment_id: AppointmentId,
    pub business_id: BusinessId,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub client_timezone: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

/// Data for AppointmentConfirmed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentConfirmedData {
    pub appointment_id: AppointmentId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub confirmed_at: DateTime<Utc>,
}

/// Data for AppointmentCompleted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCompletedData {
    pub appointment_id: AppointmentId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

/// Data for AppointmentCancelled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCancelledData {
    pub appointment_id: AppointmentId,
    pub business_id: BusinessId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    /// The window the appointment no longer occupies.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

/// Data for AppointmentMarkedNoShow event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentMarkedNoShowData {
    pub appointment_id: AppointmentId,
    pub staff_id: StaffId,
    pub date: NaiveDate,
    pub marked_at: DateTime<Utc>,
}

impl AppointmentScheduledData {
    /// Returns the booked window.
    ///
    /// Falls back to `None` only for hand-built data violating `start < end`.
    pub fn slot(&self) -> Option<TimeSlot> {
        TimeSlot::new(self.start_time, self.end_time).ok()
    }
}

impl AppointmentCancelledData {
    /// Returns the released window.
    pub fn slot(&self) -> Option<TimeSlot> {
        TimeSlot::new(self.start_time, self.end_time).ok()
    }
}

// Convenience constructors for transition events
impl AppointmentEvent {
    /// Creates an AppointmentConfirmed event.
    pub fn confirmed(appointment: &Appointment) -> Self {
        AppointmentEvent::AppointmentConfirmed(AppointmentConfirmedData {
            appointment_id: appointment.id(),
            staff_id: appointment.staff_id(),
            date: appointment.date(),
            confirmed_at: Utc::now(),
        })
    }

    /// Creates an AppointmentCompleted event.
    pub fn completed(appointment: &Appointment) -> Self {
        AppointmentEvent::AppointmentCompleted(AppointmentCompletedData {
            appointment_id: appointment.id(),
            staff_id: appointment.staff_id(),
            date: appointment.date(),
            completed_at: Utc::now(),
        })
    }

    /// Creates an AppointmentCancelled event.
    pub fn cancelled(appointment: &Appointment, reason: Option<String>) -> Self {
        AppointmentEvent::AppointmentCancelled(AppointmentCancelledData {
            appointment_id: appointment.id(),
            business_id: appointment.business_id(),
            staff_id: appointment.staff_id(),
            date: appointment.date(),
            start_time: appointment.start_time(),
            end_time: appointment.end_time(),
            reason,
            cancelled_at: Utc::now(),
        })
    }

    /// Creates an AppointmentMarkedNoShow event.
    pub fn marked_no_show(appointment: &Appointment) -> Self {
        AppointmentEvent::AppointmentMarkedNoShow(AppointmentMarkedNoShowData {
            appointment_id: appointment.id(),
            staff_id: appointment.staff_id(),
            date: appointment.date(),
            marked_at: Utc::now(),
        })
    }
}

// Accessors shared by every event
impl AppointmentEvent {
    /// Returns the appointment the event belongs to.
    pub fn appointment_id(&self) -> AppointmentId {
        match self {
            AppointmentEvent::AppointmentScheduled(d) => d.appointment_id,
            AppointmentEvent::AppointmentConfirmed(d) => d.appointment_id,
            AppointmentEvent::AppointmentCompleted(d) => d.appointment_id,
            AppointmentEvent::AppointmentCancelled(d) => d.appointment_id,
            AppointmentEvent::AppointmentMarkedNoShow(d) => d.appointment_id,
        }
    }

    /// Returns the staff member whose schedule the event affects.
    pub fn staff_id(&self) -> StaffId {
        match self {
            AppointmentEvent::AppointmentScheduled(d) => d.staff_id,
            AppointmentEvent::AppointmentConfirmed(d) => d.staff_id,
            AppointmentEvent::AppointmentCompleted(d) => d.staff_id,
            AppointmentEvent::AppointmentCancelled(d) => d.staff_id,
            AppointmentEvent::AppointmentMarkedNoShow(d) => d.staff_id,
        }
    }

    /// Returns the calendar date of the appointment.
    pub fn date(&self) -> NaiveDate {
        match self {
            AppointmentEvent::AppointmentScheduled(d) => d.date,
            AppointmentEvent::AppointmentConfirmed(d) => d.date,
            AppointmentEvent::AppointmentCompleted(d) => d.date,
            AppointmentEvent::AppointmentCancelled(d) => d.date,
            AppointmentEvent::AppointmentMarkedNoShow(d) => d.date,
        }
    }

    /// Returns when the event happened.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AppointmentEvent::AppointmentScheduled(d) => d.scheduled_at,
            AppointmentEvent::AppointmentConfirmed(d) => d.confirmed_at,
            AppointmentEvent::AppointmentCompleted(d) => d.completed_at,
            AppointmentEvent::AppointmentCancelled(d) => d.cancelled_at,
            AppointmentEvent::AppointmentMarkedNoShow(d) => d.marked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduled() -> AppointmentEvent {
        AppointmentEvent::AppointmentScheduled(AppointmentScheduledData {
            appointment_id: AppointmentId::new(),
            business_id: BusinessId::new(),
            client_id: ClientId::new(),
            staff_id: StaffId::new(),
            service_id: ServiceId::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            notes: Some("First visit".to_string()),
            client_timezone: None,
            scheduled_at: Utc::now(),
        })
    }

    #[test]
    fn test_event_type() {
        assert_eq!(scheduled().event_type(), "AppointmentScheduled");
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = scheduled();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "AppointmentScheduled");
        assert_eq!(json["data"]["start_time"], "10:00:00");

        let deserialized: AppointmentEvent = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_shared_accessors() {
        let event = scheduled();
        let AppointmentEvent::AppointmentScheduled(ref data) = event else {
            panic!("Expected AppointmentScheduled event");
        };

        assert_eq!(event.appointment_id(), data.appointment_id);
        assert_eq!(event.staff_id(), data.staff_id);
        assert_eq!(event.date(), data.date);
        assert_eq!(event.occurred_at(), data.scheduled_at);
        assert_eq!(data.slot().unwrap().duration_minutes(), 30);
    }
}
