use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{Aggregate, Appointment, TimeSlot};

use crate::{AppointmentId, AppointmentQuery, Result, StaffId, StoreError, Version};

/// Core trait for appointment persistence.
///
/// Implementations are the authority on the no-overlap invariant: `save` must
/// reject an appointment whose window overlaps a non-cancelled appointment of
/// the same staff member on the same date, even when two saves race.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Returns the non-cancelled appointments of `staff_id` on `date` whose
    /// window overlaps `slot`, ordered by start time.
    ///
    /// Advisory: the answer may be stale by the time the caller acts on it.
    async fn find_overlapping(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Vec<Appointment>>;

    /// Persists a new appointment.
    ///
    /// Fails with `OverlappingAppointment` if it would double-book the staff
    /// member, or `DuplicateId` if the id is already taken.
    async fn save(&self, appointment: Appointment) -> Result<Appointment>;

    /// Retrieves an appointment by id.
    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>>;

    /// Replaces a stored appointment with a transitioned copy.
    ///
    /// `expected_version` is the version the caller loaded; the update fails
    /// with `VersionConflict` if the stored appointment has moved on.
    async fn update(&self, appointment: Appointment, expected_version: Version)
    -> Result<Appointment>;

    /// Retrieves appointments matching a query.
    async fn query(&self, query: AppointmentQuery) -> Result<Vec<Appointment>>;
}

#[async_trait]
impl<T: AppointmentStore + ?Sized> AppointmentStore for Arc<T> {
    async fn find_overlapping(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Vec<Appointment>> {
        (**self).find_overlapping(staff_id, date, slot).await
    }

    async fn save(&self, appointment: Appointment) -> Result<Appointment> {
        (**self).save(appointment).await
    }

    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        (**self).get(id).await
    }

    async fn update(
        &self,
        appointment: Appointment,
        expected_version: Version,
    ) -> Result<Appointment> {
        (**self).update(appointment, expected_version).await
    }

    async fn query(&self, query: AppointmentQuery) -> Result<Vec<Appointment>> {
        (**self).query(query).await
    }
}

/// Extension trait providing convenience methods for appointment stores.
#[async_trait]
pub trait AppointmentStoreExt: AppointmentStore {
    /// Retrieves an appointment, failing with `NotFound` if it is absent.
    async fn require(&self, id: AppointmentId) -> Result<Appointment> {
        self.get(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// Checks whether the staff member already has something booked over `slot`.
    async fn has_conflict(&self, staff_id: StaffId, date: NaiveDate, slot: TimeSlot) -> Result<bool> {
        Ok(!self.find_overlapping(staff_id, date, slot).await?.is_empty())
    }

    /// Lists one staff member's appointments for a day.
    async fn staff_day(&self, staff_id: StaffId, date: NaiveDate) -> Result<Vec<Appointment>> {
        self.query(AppointmentQuery::for_staff_day(staff_id, date))
            .await
    }
}

// Blanket implementation for all AppointmentStore implementations
impl<T: AppointmentStore + ?Sized> AppointmentStoreExt for T {}

/// Validates that `updated` is a legal successor of `current`.
///
/// Only the lifecycle moves on an update: status, version and `updated_at`.
/// The booked identity and window are immutable.
pub fn validate_update(
    current: &Appointment,
    updated: &Appointment,
    expected_version: Version,
) -> Result<()> {
    if current.version() != expected_version {
        return Err(StoreError::VersionConflict {
            appointment_id: current.id(),
            expected: expected_version,
            actual: current.version(),
        });
    }

    if updated.version() <= expected_version {
        return Err(StoreError::InvalidUpdate(format!(
            "version must advance past {expected_version}, got {}",
            updated.version()
        )));
    }

    if current.staff_id() != updated.staff_id()
        || current.business_id() != updated.business_id()
        || current.client_id() != updated.client_id()
        || current.service_id() != updated.service_id()
        || current.date() != updated.date()
        || current.slot() != updated.slot()
    {
        return Err(StoreError::InvalidUpdate(
            "booked identity and window cannot change".to_string(),
        ));
    }

    // Terminal appointments never come back, and a cancelled window stays released
    if current.is_terminal() && current.status() != updated.status() {
        return Err(StoreError::InvalidUpdate(format!(
            "appointment {} is already {}",
            current.id(),
            current.status()
        )));
    }

    Ok(())
}
