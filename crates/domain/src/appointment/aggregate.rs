//! Appointment aggregate implementation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{AppointmentId, BusinessId, ClientId, ServiceId, StaffId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::schedule::TimeSlot;

use super::{AppointmentEvent, AppointmentScheduledData, AppointmentStatus};

/// Everything needed to book a new appointment once the booking workflow has
/// validated the window.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub business_id: BusinessId,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub notes: Option<String>,
    pub client_timezone: Option<String>,
}

/// Appointment aggregate root.
///
/// A booked interval of a staff member's day with its lifecycle status.
/// Appointments are only created through [`Appointment::schedule`]; status
/// changes go through the transition commands, which return events instead of
/// mutating the aggregate in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    id: AppointmentId,

    /// Current version for optimistic concurrency.
    version: Version,

    business_id: BusinessId,
    client_id: ClientId,
    staff_id: StaffId,
    service_id: ServiceId,
    date: NaiveDate,
    slot: TimeSlot,
    status: AppointmentStatus,
    notes: Option<String>,

    /// Accepted from the client for display purposes only.
    client_timezone: Option<String>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Flat, storage-friendly view of an appointment.
///
/// Used by persistence adapters to move appointments in and out of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub version: Version,
    pub business_id: BusinessId,
    pub client_id: ClientId,
    pub staff_id: StaffId,
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub client_timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppointmentRecord> for Appointment {
    fn from(record: AppointmentRecord) -> Self {
        Self {
            id: record.id,
            version: record.version,
            business_id: record.business_id,
            client_id: record.client_id,
            staff_id: record.staff_id,
            service_id: record.service_id,
            date: record.date,
            slot: record.slot,
            status: record.status,
            notes: record.notes,
            client_timezone: record.client_timezone,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<Appointment> for AppointmentRecord {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            version: appointment.version,
            business_id: appointment.business_id,
            client_id: appointment.client_id,
            staff_id: appointment.staff_id,
            service_id: appointment.service_id,
            date: appointment.date,
            slot: appointment.slot,
            status: appointment.status,
            notes: appointment.notes,
            client_timezone: appointment.client_timezone,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

impl Aggregate for Appointment {
    type Event = AppointmentEvent;
    type Error = DomainError;

    fn aggregate_type() -> &'static str {
        "Appointment"
    }

    fn version(&self) -> Version {
        self.version
    }

    fn apply(&mut self, event: Self::Event) {
        let at = event.occurred_at();
        match event {
            AppointmentEvent::AppointmentScheduled(_) => {
                // The aggregate is built from this event in `schedule`.
                return;
            }
            AppointmentEvent::AppointmentConfirmed(_) => {
                self.status = AppointmentStatus::Confirmed;
            }
            AppointmentEvent::AppointmentCompleted(_) => {
                self.status = AppointmentStatus::Completed;
            }
            AppointmentEvent::AppointmentCancelled(_) => {
                self.status = AppointmentStatus::Cancelled;
            }
            AppointmentEvent::AppointmentMarkedNoShow(_) => {
                self.status = AppointmentStatus::NoShow;
            }
        }
        self.updated_at = at;
        self.version = self.version.next();
    }
}

// Query methods
impl Appointment {
    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn business_id(&self) -> BusinessId {
        self.business_id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the booked window.
    pub fn slot(&self) -> TimeSlot {
        self.slot
    }

    pub fn start_time(&self) -> NaiveTime {
        self.slot.start()
    }

    pub fn end_time(&self) -> NaiveTime {
        self.slot.end()
    }

    /// Returns the current status.
    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn client_timezone(&self) -> Option<&str> {
        self.client_timezone.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the appointment is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if this appointment blocks `slot` on `date` for its staff member.
    pub fn blocks(&self, date: NaiveDate, slot: &TimeSlot) -> bool {
        self.status.holds_slot() && self.date == date && self.slot.overlaps(slot)
    }
}

// Command methods (return events)
impl Appointment {
    /// Creates a new appointment in the `Scheduled` state with a fresh identity.
    ///
    /// Returns the appointment together with the `AppointmentScheduled` event
    /// describing it.
    pub fn schedule(new: NewAppointment) -> (Self, AppointmentEvent) {
        let data = AppointmentScheduledData {
            appointment_id: AppointmentId::new(),
            business_id: new.business_id,
            client_id: new.client_id,
            staff_id: new.staff_id,
            service_id: new.service_id,
            date: new.date,
            start_time: new.slot.start(),
            end_time: new.slot.end(),
            notes: new.notes,
            client_timezone: new.client_timezone,
            scheduled_at: Utc::now(),
        };

        let appointment = Self {
            id: data.appointment_id,
            version: Version::first(),
            business_id: data.business_id,
            client_id: data.client_id,
            staff_id: data.staff_id,
            service_id: data.service_id,
            date: data.date,
            slot: new.slot,
            status: AppointmentStatus::Scheduled,
            notes: data.notes.clone(),
            client_timezone: data.client_timezone.clone(),
            created_at: data.scheduled_at,
            updated_at: data.scheduled_at,
        };

        (appointment, AppointmentEvent::AppointmentScheduled(data))
    }

    /// Confirms a scheduled appointment.
    pub fn confirm(&self) -> Result<Vec<AppointmentEvent>, DomainError> {
        self.ensure(self.status.can_confirm(), "confirm")?;
        Ok(vec![AppointmentEvent::confirmed(self)])
    }

    /// Completes a confirmed appointment.
    pub fn complete(&self) -> Result<Vec<AppointmentEvent>, DomainError> {
        self.ensure(self.status.can_complete(), "complete")?;
        Ok(vec![AppointmentEvent::completed(self)])
    }

    /// Cancels a scheduled or confirmed appointment, releasing its window.
    pub fn cancel(&self, reason: Option<String>) -> Result<Vec<AppointmentEvent>, DomainError> {
        self.ensure(self.status.can_cancel(), "cancel")?;
        Ok(vec![AppointmentEvent::cancelled(self, reason)])
    }

    /// Marks a confirmed appointment as a no-show.
    pub fn mark_no_show(&self) -> Result<Vec<AppointmentEvent>, DomainError> {
        self.ensure(self.status.can_mark_no_show(), "mark no-show")?;
        Ok(vec![AppointmentEvent::marked_no_show(self)])
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> Result<(), DomainError> {
        if allowed {
            Ok(())
        } else {
            Err(DomainError::InvalidAppointmentTransition {
                from: self.status,
                action,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;

    fn new_appointment() -> NewAppointment {
        NewAppointment {
            business_id: BusinessId::new(),
            client_id: ClientId::new(),
            staff_id: StaffId::new(),
            service_id: ServiceId::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            slot: TimeSlot::new(
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            )
            .unwrap(),
            notes: Some("Bring previous results".to_string()),
            client_timezone: Some("Europe/Lisbon".to_string()),
        }
    }

    fn scheduled() -> Appointment {
        Appointment::schedule(new_appointment()).0
    }

    #[test]
    fn test_schedule_creates_scheduled_appointment() {
        let request = new_appointment();
        let (appointment, event) = Appointment::schedule(request.clone());

        assert_eq!(appointment.status(), AppointmentStatus::Scheduled);
        assert_eq!(appointment.version(), Version::first());
        assert_eq!(appointment.staff_id(), request.staff_id);
        assert_eq!(appointment.slot(), request.slot);
        assert_eq!(appointment.notes(), Some("Bring previous results"));
        assert_eq!(appointment.client_timezone(), Some("Europe/Lisbon"));
        assert_eq!(appointment.created_at(), appointment.updated_at());

        assert_eq!(event.event_type(), "AppointmentScheduled");
        assert_eq!(event.appointment_id(), appointment.id());
    }

    #[test]
    fn test_schedule_assigns_fresh_ids() {
        assert_ne!(scheduled().id(), scheduled().id());
    }

    #[test]
    fn test_confirm_then_complete() {
        let appointment = scheduled();

        let confirmed = appointment.execute(Appointment::confirm).unwrap();
        assert_eq!(confirmed.aggregate.status(), AppointmentStatus::Confirmed);
        assert_eq!(confirmed.events[0].event_type(), "AppointmentConfirmed");

        let completed = confirmed.aggregate.execute(Appointment::complete).unwrap();
        assert_eq!(completed.aggregate.status(), AppointmentStatus::Completed);
        assert_eq!(completed.aggregate.version(), Version::new(3));
        assert!(completed.aggregate.is_terminal());
    }

    #[test]
    fn test_transition_updates_timestamp_and_leaves_original() {
        let appointment = scheduled();
        let result = appointment.execute(Appointment::confirm).unwrap();

        assert_eq!(appointment.status(), AppointmentStatus::Scheduled);
        assert_eq!(result.aggregate.updated_at(), result.events[0].occurred_at());
        assert!(result.aggregate.updated_at() >= appointment.updated_at());
        assert_eq!(result.aggregate.created_at(), appointment.created_at());
    }

    #[test]
    fn test_completed_cannot_be_confirmed() {
        let appointment = scheduled();
        let appointment = appointment.execute(Appointment::confirm).unwrap().aggregate;
        let appointment = appointment.execute(Appointment::complete).unwrap().aggregate;

        let result = appointment.confirm();
        assert!(matches!(
            result,
            Err(DomainError::InvalidAppointmentTransition {
                from: AppointmentStatus::Completed,
                action: "confirm"
            })
        ));
    }

    #[test]
    fn test_scheduled_cannot_complete_or_no_show() {
        let appointment = scheduled();
        assert!(appointment.complete().is_err());
        assert!(appointment.mark_no_show().is_err());
    }

    #[test]
    fn test_cancel_releases_slot() {
        let appointment = scheduled();
        let date = appointment.date();
        let slot = appointment.slot();
        assert!(appointment.blocks(date, &slot));

        let result = appointment
            .execute(|a| a.cancel(Some("Client request".to_string())))
            .unwrap();

        assert_eq!(result.aggregate.status(), AppointmentStatus::Cancelled);
        assert!(!result.aggregate.blocks(date, &slot));
        match &result.events[0] {
            AppointmentEvent::AppointmentCancelled(data) => {
                assert_eq!(data.reason.as_deref(), Some("Client request"));
                assert_eq!(data.slot(), Some(slot));
            }
            other => panic!("Expected AppointmentCancelled, got {other:?}"),
        }
    }

    #[test]
    fn test_confirmed_can_be_cancelled_or_no_show() {
        let confirmed = scheduled().execute(Appointment::confirm).unwrap().aggregate;

        let cancelled = confirmed.execute(|a| a.cancel(None)).unwrap().aggregate;
        assert_eq!(cancelled.status(), AppointmentStatus::Cancelled);

        let no_show = confirmed.execute(Appointment::mark_no_show).unwrap().aggregate;
        assert_eq!(no_show.status(), AppointmentStatus::NoShow);
        assert!(no_show.cancel(None).is_err());
    }

    #[test]
    fn test_blocks_only_same_day_overlaps() {
        let appointment = scheduled();
        let other_day = appointment.date().succ_opt().unwrap();
        let later = TimeSlot::new(
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        )
        .unwrap();

        assert!(!appointment.blocks(other_day, &appointment.slot()));
        assert!(!appointment.blocks(appointment.date(), &later));
    }

    #[test]
    fn test_record_round_trip() {
        let appointment = scheduled();
        let record = AppointmentRecord::from(appointment.clone());
        assert_eq!(Appointment::from(record), appointment);
    }
}
