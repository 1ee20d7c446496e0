//! Staff agenda read model: each staff member's appointments per day.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{AppointmentId, ClientId, ServiceId, StaffId};
use domain::{AppointmentEvent, AppointmentStatus, TimeSlot};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;
use crate::{ProjectionError, Result};

/// One appointment as shown on a staff agenda.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgendaEntry {
    pub appointment_id: AppointmentId,
    pub client_id: ClientId,
    pub service_id: ServiceId,
    pub slot: TimeSlot,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct AgendaState {
    /// Entries per staff day, ordered by window.
    days: HashMap<(StaffId, NaiveDate), Vec<AgendaEntry>>,
}

impl AgendaState {
    fn entry_mut(
        &mut self,
        staff_id: StaffId,
        date: NaiveDate,
        appointment_id: AppointmentId,
    ) -> Result<&mut AgendaEntry> {
        self.days
            .get_mut(&(staff_id, date))
            .and_then(|entries| {
                entries
                    .iter_mut()
                    .find(|e| e.appointment_id == appointment_id)
            })
            .ok_or(ProjectionError::UnknownAppointment(appointment_id))
    }
}

/// Read model listing every appointment on a staff member's day with its
/// current status.
///
/// Cancelled appointments stay on the agenda so the day's history is
/// visible; callers filter on [`AppointmentStatus::holds_slot`] when they
/// only want occupied windows.
#[derive(Clone, Default)]
pub struct StaffAgendaView {
    state: Arc<RwLock<AgendaState>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl StaffAgendaView {
    /// Creates a new empty agenda view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a staff member's agenda for a day, ordered by start time.
    pub async fn agenda(&self, staff_id: StaffId, date: NaiveDate) -> Vec<AgendaEntry> {
        self.state
            .read()
            .await
            .days
            .get(&(staff_id, date))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the agenda entries that still occupy staff time.
    pub async fn occupied(&self, staff_id: StaffId, date: NaiveDate) -> Vec<AgendaEntry> {
        self.agenda(staff_id, date)
            .await
            .into_iter()
            .filter(|e| e.status.holds_slot())
            .collect()
    }

    /// Finds a single entry by appointment id.
    pub async fn entry(&self, appointment_id: AppointmentId) -> Option<AgendaEntry> {
        self.state
            .read()
            .await
            .days
            .values()
            .flatten()
            .find(|e| e.appointment_id == appointment_id)
            .cloned()
    }
}

#[async_trait]
impl Projection for StaffAgendaView {
    fn name(&self) -> &'static str {
        "StaffAgendaView"
    }

    async fn handle(&self, event: &AppointmentEvent) -> Result<()> {
        let mut state = self.state.write().await;

        let status = match event {
            AppointmentEvent::AppointmentScheduled(data) => {
                let slot = data.slot().ok_or_else(|| {
                    ProjectionError::MalformedEvent(format!(
                        "scheduled window {}-{} is empty",
                        data.start_time, data.end_time
                    ))
                })?;
                let entries = state.days.entry((data.staff_id, data.date)).or_default();
                // Replayed events must not duplicate an entry
                entries.retain(|e| e.appointment_id != data.appointment_id);
                let at = entries.partition_point(|e| e.slot <= slot);
                entries.insert(
                    at,
                    AgendaEntry {
                        appointment_id: data.appointment_id,
                        client_id: data.client_id,
                        service_id: data.service_id,
                        slot,
                        status: AppointmentStatus::Scheduled,
                        notes: data.notes.clone(),
                        updated_at: data.scheduled_at,
                    },
                );
                None
            }
            AppointmentEvent::AppointmentConfirmed(_) => Some(AppointmentStatus::Confirmed),
            AppointmentEvent::AppointmentCompleted(_) => Some(AppointmentStatus::Completed),
            AppointmentEvent::AppointmentCancelled(_) => Some(AppointmentStatus::Cancelled),
            AppointmentEvent::AppointmentMarkedNoShow(_) => Some(AppointmentStatus::NoShow),
        };

        if let Some(status) = status {
            let entry = state.entry_mut(event.staff_id(), event.date(), event.appointment_id())?;
            entry.status = status;
            entry.updated_at = event.occurred_at();
        }
        drop(state);

        let mut pos = self.position.write().await;
        *pos = pos.advance(event);

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.state.write().await.days.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for StaffAgendaView {
    fn name(&self) -> &'static str {
        "StaffAgendaView"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|state| state.days.len())
            .unwrap_or(0)
    }
}
