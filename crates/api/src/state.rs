//! Shared application state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use appointment_store::AppointmentStore;
use booking::{
    BookingError, BookingService, InMemoryAvailabilityStore, InMemoryCapabilities,
    InMemoryServiceCatalog,
};
use projections::{AvailableSlotsView, EventReceiver, ProjectionProcessor, StaffAgendaView};

use crate::config::Config;
use crate::error::ApiError;

/// Appointment store shared by every handler.
pub type SharedStore = Arc<dyn AppointmentStore>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub booking: BookingService<SharedStore>,
    pub capabilities: InMemoryCapabilities,
    pub catalog: InMemoryServiceCatalog,
    pub availability: InMemoryAvailabilityStore,
    pub available_slots: AvailableSlotsView,
    pub agenda: StaffAgendaView,
    pub request_timeout: Duration,
}

impl AppState {
    /// Runs `fut` under the request deadline.
    ///
    /// On expiry the in-flight future is dropped; a booking that had not yet
    /// been saved leaves nothing behind.
    pub async fn with_deadline<T, F>(&self, fut: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, BookingError>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => {
                metrics::counter!("request_timeouts_total").increment(1);
                Err(ApiError::Timeout(self.request_timeout))
            }
        }
    }
}

/// Builds the application state around `store`, with in-memory collaborators
/// and both read models wired to a projection feed.
///
/// The caller drives the feed by running the returned processor on the
/// returned receiver.
pub fn create_default_state(
    store: SharedStore,
    config: &Config,
) -> (Arc<AppState>, ProjectionProcessor, EventReceiver) {
    let capabilities = InMemoryCapabilities::new();
    let catalog = InMemoryServiceCatalog::new();
    let availability = InMemoryAvailabilityStore::new();

    let available_slots = AvailableSlotsView::new();
    let agenda = StaffAgendaView::new();

    let mut processor = ProjectionProcessor::new();
    processor.register(Box::new(available_slots.clone()));
    processor.register(Box::new(agenda.clone()));
    let (publisher, receiver) = ProjectionProcessor::channel();

    let booking = BookingService::new(
        store,
        Arc::new(capabilities.clone()),
        Arc::new(catalog.clone()),
        Arc::new(availability.clone()),
        Arc::new(publisher),
    );

    let state = Arc::new(AppState {
        booking,
        capabilities,
        catalog,
        availability,
        available_slots,
        agenda,
        request_timeout: config.request_timeout,
    });

    (state, processor, receiver)
}
