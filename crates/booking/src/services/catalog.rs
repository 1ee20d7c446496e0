//! Service catalog lookup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::ServiceId;
use domain::ServiceInfo;

use super::LookupError;

/// Resolves services offered by businesses.
#[async_trait]
pub trait ServiceLookup: Send + Sync {
    /// Returns the service with the given id, if it exists.
    async fn get_by_id(&self, service_id: ServiceId) -> Result<Option<ServiceInfo>, LookupError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    services: HashMap<ServiceId, ServiceInfo>,
    fail_on_lookup: bool,
    calls: usize,
}

/// In-memory service catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServiceCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryServiceCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a service.
    pub fn insert(&self, service: ServiceInfo) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .services
            .insert(service.id, service);
    }

    /// Configures the lookup to fail as if unreachable.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_lookup = fail;
    }

    /// Returns the number of `get_by_id` calls made.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }
}

#[async_trait]
impl ServiceLookup for InMemoryServiceCatalog {
    async fn get_by_id(&self, service_id: ServiceId) -> Result<Option<ServiceInfo>, LookupError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if state.fail_on_lookup {
            return Err(LookupError::unavailable(
                "service catalog",
                "configured to fail",
            ));
        }

        Ok(state.services.get(&service_id).cloned())
    }
}
