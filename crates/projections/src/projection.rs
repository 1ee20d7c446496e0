//! Core projection trait and position tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::AppointmentEvent;

use crate::Result;

/// Tracks how far a projection has got through the event feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events processed by this projection.
    pub events_processed: u64,

    /// When the most recent processed event happened.
    pub last_event_at: Option<DateTime<Utc>>,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position past `event`.
    pub fn advance(&self, event: &AppointmentEvent) -> Self {
        Self {
            events_processed: self.events_processed + 1,
            last_event_at: Some(event.occurred_at()),
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A projection that folds appointment events into a read model.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &AppointmentEvent) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use common::{AppointmentId, StaffId};
    use domain::AppointmentConfirmedData;

    use super::*;

    fn confirmed() -> AppointmentEvent {
        AppointmentEvent::AppointmentConfirmed(AppointmentConfirmedData {
            appointment_id: AppointmentId::new(),
            staff_id: StaffId::new(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            confirmed_at: NaiveDate::from_ymd_opt(2025, 3, 9)
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(18, 0, 0).unwrap())
                .and_utc(),
        })
    }

    #[test]
    fn position_starts_at_zero() {
        let pos = ProjectionPosition::zero();
        assert_eq!(pos.events_processed, 0);
        assert!(pos.last_event_at.is_none());
    }

    #[test]
    fn position_advances() {
        let event = confirmed();
        let pos = ProjectionPosition::zero().advance(&event);
        assert_eq!(pos.events_processed, 1);
        assert_eq!(pos.last_event_at, Some(event.occurred_at()));

        let pos = pos.advance(&event);
        assert_eq!(pos.events_processed, 2);
    }

    #[test]
    fn position_display() {
        let pos = ProjectionPosition {
            events_processed: 42,
            last_event_at: None,
        };
        assert_eq!(pos.to_string(), "position(42)");
    }
}
