//! Staff availability lookup.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{BusinessId, StaffId};
use domain::StaffDailyAvailability;

use super::LookupError;

/// Read access to the availability declared by schedule management.
#[async_trait]
pub trait StaffAvailabilityStore: Send + Sync {
    /// Returns the current availability of `staff_id` at `business_id`.
    async fn find_by_staff_and_business(
        &self,
        staff_id: StaffId,
        business_id: BusinessId,
    ) -> Result<Option<StaffDailyAvailability>, LookupError>;
}

#[derive(Debug, Default)]
struct InMemoryAvailabilityState {
    availability: HashMap<(StaffId, BusinessId), StaffDailyAvailability>,
    fail_on_lookup: bool,
    calls: usize,
}

/// In-memory availability store for testing.
///
/// Holds one current availability per (staff, business); publishing a new one
/// replaces the previous declaration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAvailabilityStore {
    state: Arc<RwLock<InMemoryAvailabilityState>>,
}

impl InMemoryAvailabilityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes availability, replacing any previous declaration for the
    /// same staff member and business.
    pub fn put(&self, availability: StaffDailyAvailability) {
        let key = (availability.staff_id(), availability.business_id());
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .availability
            .insert(key, availability);
    }

    /// Removes the declaration for a staff member at a business.
    pub fn remove(&self, staff_id: StaffId, business_id: BusinessId) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .availability
            .remove(&(staff_id, business_id));
    }

    /// Configures the lookup to fail as if unreachable.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_lookup = fail;
    }

    /// Returns the number of lookups made.
    pub fn call_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }
}

#[async_trait]
impl StaffAvailabilityStore for InMemoryAvailabilityStore {
    async fn find_by_staff_and_business(
        &self,
        staff_id: StaffId,
        business_id: BusinessId,
    ) -> Result<Option<StaffDailyAvailability>, LookupError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.calls += 1;

        if state.fail_on_lookup {
            return Err(LookupError::unavailable(
                "availability store",
                "configured to fail",
            ));
        }

        Ok(state.availability.get(&(staff_id, business_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use domain::TimeSlot;

    use super::*;

    fn availability(staff_id: StaffId, business_id: BusinessId, day: u32) -> StaffDailyAvailability {
        let slot = TimeSlot::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .unwrap();
        StaffDailyAvailability::new(
            staff_id,
            business_id,
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            [slot],
        )
    }

    #[tokio::test]
    async fn test_put_replaces_previous_declaration() {
        let store = InMemoryAvailabilityStore::new();
        let staff_id = StaffId::new();
        let business_id = BusinessId::new();

        store.put(availability(staff_id, business_id, 10));
        store.put(availability(staff_id, business_id, 11));

        let found = store
            .find_by_staff_and_business(staff_id, business_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.date(), NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    }

    #[tokio::test]
    async fn test_scoped_by_business() {
        let store = InMemoryAvailabilityStore::new();
        let staff_id = StaffId::new();
        let business_id = BusinessId::new();
        store.put(availability(staff_id, business_id, 10));

        let other = store
            .find_by_staff_and_business(staff_id, BusinessId::new())
            .await
            .unwrap();
        assert!(other.is_none());

        store.remove(staff_id, business_id);
        let removed = store
            .find_by_staff_and_business(staff_id, business_id)
            .await
            .unwrap();
        assert!(removed.is_none());
        assert_eq!(store.call_count(), 2);
    }
}
