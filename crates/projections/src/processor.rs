//! Projection processor for feeding appointment events to projections.

use async_trait::async_trait;
use booking::{EventPublisher, PublishError};
use domain::{AppointmentEvent, DomainEvent};
use futures_core::Stream;
use futures_util::{StreamExt, stream};
use tokio::sync::mpsc;

use crate::Result;
use crate::projection::Projection;

/// Receiving half of the event feed created by [`ProjectionProcessor::channel`].
pub type EventReceiver = mpsc::UnboundedReceiver<AppointmentEvent>;

/// Event publisher that forwards events into an unbounded channel.
///
/// Publishing never waits on projections; it only fails once the receiving
/// side has been dropped.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::UnboundedSender<AppointmentEvent>,
}

#[async_trait]
impl EventPublisher for ChannelPublisher {
    async fn publish(&self, event: &AppointmentEvent) -> std::result::Result<(), PublishError> {
        self.sender
            .send(event.clone())
            .map_err(|_| PublishError::ChannelClosed)
    }
}

/// Delivers appointment events to registered projections.
///
/// The processor supports:
/// - Single event delivery: hands one event to every projection
/// - Replay: resets all projections and feeds them a sequence or stream of events
/// - Channel feed: drains a [`ChannelPublisher`] until every sender is gone
#[derive(Default)]
pub struct ProjectionProcessor {
    projections: Vec<Box<dyn Projection>>,
}

impl ProjectionProcessor {
    /// Creates a new processor with no projections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connected publisher and receiver pair.
    pub fn channel() -> (ChannelPublisher, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelPublisher { sender }, receiver)
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Delivers a single event to all registered projections.
    ///
    /// A failing projection does not stop delivery to the others; the first
    /// failure is returned once every projection has seen the event.
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub async fn process_event(&self, event: &AppointmentEvent) -> Result<()> {
        let mut first_error = None;

        for projection in &self.projections {
            match projection.handle(event).await {
                Ok(()) => {
                    metrics::counter!("projections_events_processed").increment(1);
                }
                Err(e) => {
                    metrics::counter!("projections_errors_total", "projection" => projection.name())
                        .increment(1);
                    tracing::warn!(
                        projection = projection.name(),
                        appointment_id = %event.appointment_id(),
                        error = %e,
                        "projection failed to handle event"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Resets all projections and replays `events` in order.
    pub async fn replay<I>(&self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = AppointmentEvent>,
        I::IntoIter: Send,
    {
        self.replay_stream(stream::iter(events)).await
    }

    /// Resets all projections and replays an event stream in order.
    ///
    /// Stops at the first event a projection fails to handle.
    #[tracing::instrument(skip(self, events))]
    pub async fn replay_stream<S>(&self, events: S) -> Result<()>
    where
        S: Stream<Item = AppointmentEvent> + Send,
    {
        for projection in &self.projections {
            projection.reset().await?;
        }

        let mut events = std::pin::pin!(events);
        let mut replayed: u64 = 0;
        while let Some(event) = events.next().await {
            self.process_event(&event).await?;
            replayed += 1;
        }

        tracing::info!(events_replayed = replayed, "replay complete");
        Ok(())
    }

    /// Drains the channel until all publishers are dropped.
    ///
    /// Projection failures are logged and counted; they never stop the feed.
    pub async fn run(&self, mut receiver: EventReceiver) {
        tracing::info!(projections = self.projection_count(), "projection feed started");

        while let Some(event) = receiver.recv().await {
            // Already logged per projection
            let _ = self.process_event(&event).await;
        }

        tracing::info!("projection feed closed");
    }
}
