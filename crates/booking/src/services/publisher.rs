//! Appointment event publication.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::AppointmentEvent;
use thiserror::Error;

/// Failure to hand an event to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// Nothing is consuming events any more.
    #[error("Event channel closed")]
    ChannelClosed,

    /// The consumer refused the event.
    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Post-commit hook notified of every persisted appointment change.
///
/// Booking never waits on consumers beyond this call and never fails because
/// of it; implementations should hand the event off quickly.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event.
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), PublishError>;
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    events: Vec<AppointmentEvent>,
    fail_on_publish: bool,
    attempts: usize,
}

/// Publisher that records events in memory, for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new recording publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the publisher to reject every event.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_publish = fail;
    }

    /// Returns the events published so far, oldest first.
    pub fn published(&self) -> Vec<AppointmentEvent> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    /// Returns the number of publish attempts, including rejected ones.
    pub fn attempts(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .attempts
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), PublishError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.attempts += 1;

        if state.fail_on_publish {
            return Err(PublishError::Rejected(
                "publisher configured to fail".to_string(),
            ));
        }

        state.events.push(event.clone());
        Ok(())
    }
}
