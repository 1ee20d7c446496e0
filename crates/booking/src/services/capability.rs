//! Staff capability lookup.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{ServiceId, StaffId};

use super::LookupError;

/// Answers whether a staff member is qualified to perform a service.
#[async_trait]
pub trait StaffCapabilityLookup: Send + Sync {
    /// Returns true if `staff_id` may perform `service_id`.
    async fn can_perform(&self, staff_id: StaffId, service_id: ServiceId)
    -> Result<bool, LookupError>;
}

#[derive(Debug, Default)]
struct InMemoryCapabilitiesState {
    grants: HashSet<(StaffId, ServiceId)>,
    fail_on_lookup: bool,
    calls: usize,
}

/// In-memory capability registry for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCapabilities {
    state: Arc<RwLock<InMemoryCapabilitiesState>>,
}

impl InMemoryCapabilities {
    /// Creates an empty registry; nobody can perform anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows `staff_id` to perform `service_id`.
    pub fn grant(&self, staff_id: StaffId, service_id: ServiceId) {
        self.write().grants.insert((staff_id, service_id));
    }

    /// Withdraws a previous grant.
    pub fn revoke(&self, staff_id: StaffId, service_id: ServiceId) {
        self.write().grants.remove(&(staff_id, service_id));
    }

    /// Configures the lookup to fail as if unreachable.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.write().fail_on_lookup = fail;
    }

    /// Returns the number of `can_perform` calls made.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryCapabilitiesState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StaffCapabilityLookup for InMemoryCapabilities {
    async fn can_perform(
        &self,
        staff_id: StaffId,
        service_id: ServiceId,
    ) -> Result<bool, LookupError> {
        let mut state = self.write();
        state.calls += 1;

        if state.fail_on_lookup {
            return Err(LookupError::unavailable(
                "capability lookup",
                "configured to fail",
            ));
        }

        Ok(state.grants.contains(&(staff_id, service_id)))
    }
}
