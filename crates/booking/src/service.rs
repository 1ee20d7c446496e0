//! Booking service orchestrating appointment creation and lifecycle.

use std::sync::Arc;
use std::time::Instant;

use appointment_store::{AppointmentQuery, AppointmentStore, StoreError};
use common::AppointmentId;
use domain::{
    Aggregate, Appointment, AppointmentEvent, CommandResult, DomainError, DomainEvent,
    NewAppointment, TimeSlot,
};

use crate::commands::BookAppointment;
use crate::error::{BookingError, Result};
use crate::services::{
    EventPublisher, ServiceLookup, StaffAvailabilityStore, StaffCapabilityLookup,
};

/// Books appointments and drives their lifecycle.
///
/// Owns no state of its own: every decision is made from the collaborators
/// and the appointment store, which is the only thing it writes to.
pub struct BookingService<S: AppointmentStore> {
    store: S,
    capabilities: Arc<dyn StaffCapabilityLookup>,
    services: Arc<dyn ServiceLookup>,
    availability: Arc<dyn StaffAvailabilityStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl<S: AppointmentStore> BookingService<S> {
    /// Creates a new booking service.
    pub fn new(
        store: S,
        capabilities: Arc<dyn StaffCapabilityLookup>,
        services: Arc<dyn ServiceLookup>,
        availability: Arc<dyn StaffAvailabilityStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            capabilities,
            services,
            availability,
            publisher,
        }
    }

    /// Returns a reference to the underlying appointment store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Books an appointment.
    ///
    /// Checks run in a fixed order and the first failure is returned without
    /// consulting anything further. On success the appointment is persisted
    /// in `Scheduled` status and `AppointmentScheduled` is published.
    #[tracing::instrument(
        skip(self, cmd),
        fields(
            staff_id = %cmd.staff_id,
            service_id = %cmd.service_id,
            date = %cmd.date,
            start_time = %cmd.start_time,
        )
    )]
    pub async fn book_appointment(&self, cmd: BookAppointment) -> Result<Appointment> {
        let started = Instant::now();
        let result = self.try_book(cmd).await;
        metrics::histogram!("booking_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(appointment) => {
                metrics::counter!("bookings_total").increment(1);
                tracing::info!(
                    appointment_id = %appointment.id(),
                    slot = %appointment.slot(),
                    "appointment booked"
                );
            }
            Err(e) => {
                metrics::counter!("booking_rejections_total", "reason" => e.reason())
                    .increment(1);
                if e.is_retryable() {
                    tracing::warn!(error = %e, "booking failed");
                } else {
                    tracing::info!(reason = e.reason(), error = %e, "booking rejected");
                }
            }
        }

        result
    }

    async fn try_book(&self, cmd: BookAppointment) -> Result<Appointment> {
        // 1. Capability
        if !self
            .capabilities
            .can_perform(cmd.staff_id, cmd.service_id)
            .await?
        {
            return Err(BookingError::StaffCannotPerformService {
                staff_id: cmd.staff_id,
                service_id: cmd.service_id,
            });
        }

        // 2. Service
        let service = self
            .services
            .get_by_id(cmd.service_id)
            .await?
            .ok_or(BookingError::ServiceNotFound(cmd.service_id))?;

        // 3. Window
        let slot = TimeSlot::starting_at(cmd.start_time, service.duration_minutes)
            .map_err(BookingError::InvalidTimeSlot)?;

        // 4. Availability
        let availability = self
            .availability
            .find_by_staff_and_business(cmd.staff_id, cmd.business_id)
            .await?
            .ok_or(BookingError::AvailabilityNotConfigured {
                staff_id: cmd.staff_id,
                business_id: cmd.business_id,
            })?;

        if !availability.is_available(cmd.date, &slot) {
            return Err(BookingError::StaffNotAvailable {
                staff_id: cmd.staff_id,
                date: cmd.date,
                slot,
            });
        }

        // 5. Advisory conflict check
        let overlapping = self
            .store
            .find_overlapping(cmd.staff_id, cmd.date, slot)
            .await
            .map_err(BookingError::Store)?;

        if let Some(existing) = overlapping.first() {
            return Err(BookingError::StaffDoubleBooked {
                staff_id: cmd.staff_id,
                date: cmd.date,
                slot,
                existing: existing.id(),
            });
        }

        // 6. Creation and persistence; the store has the final word
        let (appointment, event) = Appointment::schedule(NewAppointment {
            business_id: cmd.business_id,
            client_id: cmd.client_id,
            staff_id: cmd.staff_id,
            service_id: cmd.service_id,
            date: cmd.date,
            slot,
            notes: cmd.notes,
            client_timezone: cmd.client_timezone,
        });

        let saved = self.store.save(appointment).await.map_err(|e| match e {
            StoreError::OverlappingAppointment {
                staff_id,
                date,
                slot,
            } => BookingError::BookingConflict {
                staff_id,
                date,
                slot,
            },
            other => BookingError::Store(other),
        })?;

        // 7. Event emission
        self.notify(&event).await;

        Ok(saved)
    }

    /// Confirms a scheduled appointment.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, id: AppointmentId) -> Result<Appointment> {
        self.transition(id, "confirm", Appointment::confirm).await
    }

    /// Completes a confirmed appointment.
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, id: AppointmentId) -> Result<Appointment> {
        self.transition(id, "complete", Appointment::complete).await
    }

    /// Cancels an appointment, releasing its window for new bookings.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: AppointmentId, reason: Option<String>) -> Result<Appointment> {
        self.transition(id, "cancel", move |a| a.cancel(reason))
            .await
    }

    /// Marks a confirmed appointment as a no-show.
    #[tracing::instrument(skip(self))]
    pub async fn mark_no_show(&self, id: AppointmentId) -> Result<Appointment> {
        self.transition(id, "no_show", Appointment::mark_no_show)
            .await
    }

    /// Retrieves an appointment by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        self.store.get(id).await.map_err(BookingError::from)
    }

    /// Lists appointments matching a query.
    #[tracing::instrument(skip(self))]
    pub async fn list_appointments(&self, query: AppointmentQuery) -> Result<Vec<Appointment>> {
        self.store.query(query).await.map_err(BookingError::from)
    }

    async fn transition<F>(
        &self,
        id: AppointmentId,
        action: &'static str,
        command: F,
    ) -> Result<Appointment>
    where
        F: FnOnce(&Appointment) -> std::result::Result<Vec<AppointmentEvent>, DomainError> + Send,
    {
        let appointment = self
            .store
            .get(id)
            .await?
            .ok_or(BookingError::AppointmentNotFound(id))?;
        let expected_version = appointment.version();

        let CommandResult { aggregate, events } = appointment.execute(command)?;
        let saved = self.store.update(aggregate, expected_version).await?;

        metrics::counter!("appointment_transitions_total", "action" => action).increment(1);
        tracing::info!(
            appointment_id = %id,
            status = %saved.status(),
            version = %saved.version(),
            "appointment transitioned"
        );

        for event in &events {
            self.notify(event).await;
        }

        Ok(saved)
    }

    async fn notify(&self, event: &AppointmentEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            metrics::counter!("notification_failures_total").increment(1);
            tracing::warn!(
                event_type = event.event_type(),
                appointment_id = %event.appointment_id(),
                error = %e,
                "failed to publish appointment event"
            );
        }
    }
}
