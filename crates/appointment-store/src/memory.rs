use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{Aggregate, Appointment, TimeSlot};
use tokio::sync::Mutex;

use crate::{
    AppointmentId, AppointmentQuery, Result, StaffId, StoreError, Version,
    store::{AppointmentStore, validate_update},
};

/// All appointments of one staff member.
#[derive(Default)]
struct StaffLedger {
    appointments: HashMap<AppointmentId, Appointment>,
}

impl StaffLedger {
    fn blocking<'a>(
        &'a self,
        date: NaiveDate,
        slot: &'a TimeSlot,
    ) -> impl Iterator<Item = &'a Appointment> + 'a {
        self.appointments
            .values()
            .filter(move |a| a.blocks(date, slot))
    }
}

/// In-memory appointment store.
///
/// Each staff member has a ledger behind its own async mutex. `save` checks
/// for overlaps and inserts while holding that lock, with no await point in
/// between, so racing bookings for one staff member are serialized and a
/// cancelled caller never leaves a half-written appointment behind. Bookings
/// for different staff members never contend.
#[derive(Clone, Default)]
pub struct InMemoryAppointmentStore {
    ledgers: Arc<RwLock<HashMap<StaffId, Arc<Mutex<StaffLedger>>>>>,
    index: Arc<RwLock<HashMap<AppointmentId, StaffId>>>,
    fail_on_save: Arc<AtomicBool>,
    save_calls: Arc<AtomicUsize>,
    find_overlapping_calls: Arc<AtomicUsize>,
}

impl InMemoryAppointmentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to fail all writes as if unreachable.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of appointments stored.
    pub fn appointment_count(&self) -> usize {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the number of `save` calls made.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of `find_overlapping` calls made.
    pub fn find_overlapping_calls(&self) -> usize {
        self.find_overlapping_calls.load(Ordering::SeqCst)
    }

    /// Clears all appointments.
    pub fn clear(&self) {
        self.ledgers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of staff members with a ledger.
    pub fn ledger_count(&self) -> usize {
        self.ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn find_ledger(&self, staff_id: StaffId) -> Option<Arc<Mutex<StaffLedger>>> {
        self.ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&staff_id)
            .cloned()
    }

    fn ledger_for_write(&self, staff_id: StaffId) -> Arc<Mutex<StaffLedger>> {
        if let Some(ledger) = self.find_ledger(staff_id) {
            return ledger;
        }

        let mut ledgers = self
            .ledgers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(ledgers.entry(staff_id).or_default())
    }

    fn staff_of(&self, id: AppointmentId) -> Option<StaffId> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }

    fn all_ledgers(&self) -> Vec<Arc<Mutex<StaffLedger>>> {
        self.ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    #[tracing::instrument(skip(self))]
    async fn find_overlapping(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Vec<Appointment>> {
        self.find_overlapping_calls.fetch_add(1, Ordering::SeqCst);

        let Some(ledger) = self.find_ledger(staff_id) else {
            return Ok(Vec::new());
        };
        let ledger = ledger.lock().await;
        let mut overlapping: Vec<_> = ledger.blocking(date, &slot).cloned().collect();
        overlapping.sort_by_key(|a| a.slot());
        Ok(overlapping)
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id()))]
    async fn save(&self, appointment: Appointment) -> Result<Appointment> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }

        let staff_id = appointment.staff_id();
        let ledger = self.ledger_for_write(staff_id);
        let mut ledger = ledger.lock().await;

        // From here to the end of the function nothing awaits.
        if ledger.appointments.contains_key(&appointment.id()) {
            return Err(StoreError::DuplicateId(appointment.id()));
        }

        let slot = appointment.slot();
        if appointment.status().holds_slot()
            && ledger.blocking(appointment.date(), &slot).next().is_some()
        {
            metrics::counter!("store_overlap_rejections_total").increment(1);
            return Err(StoreError::OverlappingAppointment {
                staff_id,
                date: appointment.date(),
                slot,
            });
        }

        ledger
            .appointments
            .insert(appointment.id(), appointment.clone());
        self.index
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(appointment.id(), staff_id);

        Ok(appointment)
    }

    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let Some(staff_id) = self.staff_of(id) else {
            return Ok(None);
        };

        let Some(ledger) = self.find_ledger(staff_id) else {
            return Ok(None);
        };
        let ledger = ledger.lock().await;
        Ok(ledger.appointments.get(&id).cloned())
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id()))]
    async fn update(
        &self,
        appointment: Appointment,
        expected_version: Version,
    ) -> Result<Appointment> {
        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }

        let id = appointment.id();
        let staff_id = self.staff_of(id).ok_or(StoreError::NotFound(id))?;

        let ledger = self.find_ledger(staff_id).ok_or(StoreError::NotFound(id))?;
        let mut ledger = ledger.lock().await;
        let current = ledger
            .appointments
            .get(&id)
            .ok_or(StoreError::NotFound(id))?;

        validate_update(current, &appointment, expected_version)?;
        ledger.appointments.insert(id, appointment.clone());

        Ok(appointment)
    }

    async fn query(&self, query: AppointmentQuery) -> Result<Vec<Appointment>> {
        let ledgers: Vec<_> = match query.staff_id {
            Some(staff_id) => self.find_ledger(staff_id).into_iter().collect(),
            None => self.all_ledgers(),
        };

        let mut appointments = Vec::new();
        for ledger in ledgers {
            let ledger = ledger.lock().await;
            appointments.extend(
                ledger
                    .appointments
                    .values()
                    .filter(|a| query.matches(a))
                    .cloned(),
            );
        }

        appointments.sort_by(|a, b| {
            a.date()
                .cmp(&b.date())
                .then(a.slot().cmp(&b.slot()))
                .then(a.id().cmp(&b.id()))
        });

        // Apply offset and limit
        let offset = query.offset.unwrap_or(0);
        let appointments = appointments.into_iter().skip(offset);

        let appointments = if let Some(limit) = query.limit {
            appointments.take(limit).collect()
        } else {
            appointments.collect()
        };

        Ok(appointments)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use common::{BusinessId, ClientId, ServiceId};
    use domain::{AppointmentStatus, NewAppointment};

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn slot(start: (u32, u32), minutes: u32) -> TimeSlot {
        TimeSlot::starting_at(NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(), minutes)
            .unwrap()
    }

    fn booking(staff_id: StaffId, slot: TimeSlot) -> Appointment {
        Appointment::schedule(NewAppointment {
            business_id: BusinessId::new(),
            client_id: ClientId::new(),
            staff_id,
            service_id: ServiceId::new(),
            date: day(),
            slot,
            notes: None,
            client_timezone: None,
        })
        .0
    }

    #[tokio::test]
    async fn save_and_get() {
        let store = InMemoryAppointmentStore::new();
        let appointment = booking(StaffId::new(), slot((10, 0), 30));

        let saved = store.save(appointment.clone()).await.unwrap();
        assert_eq!(saved, appointment);

        let loaded = store.get(appointment.id()).await.unwrap();
        assert_eq!(loaded, Some(appointment));
        assert_eq!(store.appointment_count(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryAppointmentStore::new();
        assert!(store.get(AppointmentId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_rejects_overlap_for_same_staff() {
        let store = InMemoryAppointmentStore::new();
        let staff_id = StaffId::new();

        store.save(booking(staff_id, slot((10, 0), 30))).await.unwrap();
        let result = store.save(booking(staff_id, slot((10, 15), 30))).await;

        assert!(matches!(
            result,
            Err(StoreError::OverlappingAppointment { staff_id: s, .. }) if s == staff_id
        ));
        assert_eq!(store.appointment_count(), 1);
    }

    #[tokio::test]
    async fn save_allows_touching_windows_and_other_staff() {
        let store = InMemoryAppointmentStore::new();
        let staff_id = StaffId::new();

        store.save(booking(staff_id, slot((10, 0), 30))).await.unwrap();
        store.save(booking(staff_id, slot((10, 30), 30))).await.unwrap();
        store.save(booking(StaffId::new(), slot((10, 0), 30))).await.unwrap();

        assert_eq!(store.appointment_count(), 3);
    }

    #[tokio::test]
    async fn save_rejects_duplicate_id() {
        let store = InMemoryAppointmentStore::new();
        let appointment = booking(StaffId::new(), slot((10, 0), 30));

        store.save(appointment.clone()).await.unwrap();
        let result = store.save(appointment).await;

        assert!(matches!(result, Err(StoreError::DuplicateId(_))));
    }

    #[tokio::test]
    async fn cancelled_appointment_releases_window() {
        let store = InMemoryAppointmentStore::new();
        let staff_id = StaffId::new();
        let first = store.save(booking(staff_id, slot((10, 0), 30))).await.unwrap();

        let cancelled = first.execute(|a| a.cancel(None)).unwrap().aggregate;
        store.update(cancelled, first.version()).await.unwrap();

        let overlapping = store
            .find_overlapping(staff_id, day(), slot((10, 0), 30))
            .await
            .unwrap();
        assert!(overlapping.is_empty());

        store.save(booking(staff_id, slot((10, 0), 30))).await.unwrap();
    }

    #[tokio::test]
    async fn find_overlapping_is_ordered_and_scoped() {
        let store = InMemoryAppointmentStore::new();
        let staff_id = StaffId::new();

        let late = store.save(booking(staff_id, slot((11, 0), 60))).await.unwrap();
        let early = store.save(booking(staff_id, slot((9, 0), 60))).await.unwrap();
        store.save(booking(staff_id, slot((14, 0), 30))).await.unwrap();

        let overlapping = store
            .find_overlapping(staff_id, day(), slot((9, 30), 120))
            .await
            .unwrap();
        let ids: Vec<_> = overlapping.iter().map(Appointment::id).collect();
        assert_eq!(ids, vec![early.id(), late.id()]);

        let other_day = store
            .find_overlapping(staff_id, day().succ_opt().unwrap(), slot((9, 30), 120))
            .await
            .unwrap();
        assert!(other_day.is_empty());
        assert_eq!(store.find_overlapping_calls(), 2);
    }

    #[tokio::test]
    async fn update_with_expected_version() {
        let store = InMemoryAppointmentStore::new();
        let appointment = store
            .save(booking(StaffId::new(), slot((10, 0), 30)))
            .await
            .unwrap();

        let confirmed = appointment.execute(Appointment::confirm).unwrap().aggregate;
        let saved = store
            .update(confirmed, appointment.version())
            .await
            .unwrap();

        assert_eq!(saved.status(), AppointmentStatus::Confirmed);
        assert_eq!(saved.version(), Version::new(2));
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let store = InMemoryAppointmentStore::new();
        let appointment = store
            .save(booking(StaffId::new(), slot((10, 0), 30)))
            .await
            .unwrap();

        let confirmed = appointment.execute(Appointment::confirm).unwrap().aggregate;
        store
            .update(confirmed, appointment.version())
            .await
            .unwrap();

        // A second writer still holding the version-1 copy
        let cancelled = appointment.execute(|a| a.cancel(None)).unwrap().aggregate;
        let result = store.update(cancelled, appointment.version()).await;

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected, actual, .. })
                if expected == Version::first() && actual == Version::new(2)
        ));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemoryAppointmentStore::new();
        let appointment = booking(StaffId::new(), slot((10, 0), 30));
        let confirmed = appointment.execute(Appointment::confirm).unwrap().aggregate;

        let result = store.update(confirmed, appointment.version()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn query_with_filters_and_paging() {
        let store = InMemoryAppointmentStore::new();
        let staff_id = StaffId::new();

        for hour in 9..13 {
            store
                .save(booking(staff_id, slot((hour, 0), 30)))
                .await
                .unwrap();
        }
        store.save(booking(StaffId::new(), slot((9, 0), 30))).await.unwrap();

        let day_list = store
            .query(AppointmentQuery::for_staff_day(staff_id, day()))
            .await
            .unwrap();
        assert_eq!(day_list.len(), 4);
        assert!(day_list.windows(2).all(|w| w[0].slot() < w[1].slot()));

        let page = store
            .query(AppointmentQuery::new().staff_id(staff_id).offset(1).limit(2))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].start_time(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());

        let everyone = store.query(AppointmentQuery::new()).await.unwrap();
        assert_eq!(everyone.len(), 5);
    }

    #[tokio::test]
    async fn failing_mode_rejects_writes() {
        let store = InMemoryAppointmentStore::new();
        store.set_fail_on_save(true);

        let result = store.save(booking(StaffId::new(), slot((10, 0), 30))).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.save_calls(), 1);
        assert_eq!(store.appointment_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_overlapping_saves_admit_exactly_one() {
        let store = InMemoryAppointmentStore::new();
        let staff_id = StaffId::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                let candidate = booking(staff_id, slot((10, i), 30));
                tokio::spawn(async move { store.save(candidate).await })
            })
            .collect();

        let mut successes = 0;
        let mut overlaps = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(StoreError::OverlappingAppointment { .. }) => overlaps += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(overlaps, 15);
        assert_eq!(store.appointment_count(), 1);
    }

    #[tokio::test]
    async fn reads_for_unknown_staff_do_not_allocate_ledgers() {
        let store = InMemoryAppointmentStore::new();

        for _ in 0..100 {
            let staff_id = StaffId::new();
            let overlapping = store
                .find_overlapping(staff_id, day(), slot((10, 0), 30))
                .await
                .unwrap();
            assert!(overlapping.is_empty());

            let listed = store
                .query(AppointmentQuery::for_staff_day(staff_id, day()))
                .await
                .unwrap();
            assert!(listed.is_empty());
        }
        assert_eq!(store.ledger_count(), 0);

        store.save(booking(StaffId::new(), slot((10, 0), 30))).await.unwrap();
        assert_eq!(store.ledger_count(), 1);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = InMemoryAppointmentStore::new();
        store.save(booking(StaffId::new(), slot((10, 0), 30))).await.unwrap();

        store.clear();
        assert_eq!(store.appointment_count(), 0);
    }
}
