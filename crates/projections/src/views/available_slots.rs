//! Open windows per staff day: declared availability minus booked windows.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{AppointmentId, BusinessId, StaffId};
use domain::{AppointmentEvent, StaffDailyAvailability, TimeSlot};
use tokio::sync::RwLock;

use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;
use crate::{ProjectionError, Result};

#[derive(Debug, Clone, Default)]
struct DaySlots {
    business_id: Option<BusinessId>,
    /// Merged declared windows; `None` until seeded.
    declared: Option<Vec<TimeSlot>>,
    booked: BTreeMap<AppointmentId, TimeSlot>,
}

impl DaySlots {
    fn open(&self) -> Option<Vec<TimeSlot>> {
        let declared = self.declared.as_ref()?;
        let mut booked: Vec<TimeSlot> = self.booked.values().copied().collect();
        booked.sort();
        Some(subtract(declared, &booked))
    }
}

/// Carves `booked` (sorted by start) out of `declared` (merged, sorted).
fn subtract(declared: &[TimeSlot], booked: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut open = Vec::with_capacity(declared.len() + booked.len());

    for window in declared {
        let mut cursor = window.start();
        for taken in booked.iter().filter(|b| b.overlaps(window)) {
            if taken.start() > cursor
                && let Ok(gap) = TimeSlot::new(cursor, taken.start())
            {
                open.push(gap);
            }
            cursor = cursor.max(taken.end());
        }
        if cursor < window.end()
            && let Ok(rest) = TimeSlot::new(cursor, window.end())
        {
            open.push(rest);
        }
    }

    open
}

/// Read model of the windows still open for booking on each staff day.
///
/// Seeded from a [`StaffDailyAvailability`]; scheduled appointments carve
/// their window out of the open windows and cancellations give it back.
/// Bookings seen before the day is seeded are remembered and applied once
/// it is.
///
/// Best-effort only: booking decisions never consult this view.
#[derive(Clone, Default)]
pub struct AvailableSlotsView {
    days: Arc<StdRwLock<HashMap<(StaffId, NaiveDate), DaySlots>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl AvailableSlotsView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds (or re-seeds) a staff day with its declared availability.
    pub fn seed(&self, availability: &StaffDailyAvailability) {
        let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
        let day = days
            .entry((availability.staff_id(), availability.date()))
            .or_default();
        day.business_id = Some(availability.business_id());
        day.declared = Some(availability.merged_slots());
    }

    /// Returns true if the staff day has been seeded.
    pub fn is_seeded(&self, staff_id: StaffId, date: NaiveDate) -> bool {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(staff_id, date))
            .is_some_and(|day| day.declared.is_some())
    }

    /// Returns the open windows of a staff day, ordered by start.
    ///
    /// `None` means the day was never seeded; an empty list means fully booked.
    pub fn open_slots(&self, staff_id: StaffId, date: NaiveDate) -> Option<Vec<TimeSlot>> {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(staff_id, date))
            .and_then(DaySlots::open)
    }

    /// Returns the open windows long enough for a service of `duration_minutes`.
    pub fn open_slots_fitting(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Option<Vec<TimeSlot>> {
        let open = self.open_slots(staff_id, date)?;
        Some(
            open.into_iter()
                .filter(|slot| slot.duration_minutes() >= i64::from(duration_minutes))
                .collect(),
        )
    }

    /// Returns the number of open minutes left on a staff day.
    pub fn open_minutes(&self, staff_id: StaffId, date: NaiveDate) -> Option<i64> {
        self.open_slots(staff_id, date)
            .map(|slots| slots.iter().map(TimeSlot::duration_minutes).sum())
    }

    /// Returns the business a seeded staff day belongs to.
    pub fn business_of(&self, staff_id: StaffId, date: NaiveDate) -> Option<BusinessId> {
        self.days
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(staff_id, date))
            .and_then(|day| day.business_id)
    }
}

#[async_trait]
impl Projection for AvailableSlotsView {
    fn name(&self) -> &'static str {
        "AvailableSlotsView"
    }

    async fn handle(&self, event: &AppointmentEvent) -> Result<()> {
        match event {
            AppointmentEvent::AppointmentScheduled(data) => {
                let slot = data.slot().ok_or_else(|| {
                    ProjectionError::MalformedEvent(format!(
                        "scheduled window {}-{} is empty",
                        data.start_time, data.end_time
                    ))
                })?;
                let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
                let day = days.entry((data.staff_id, data.date)).or_default();
                day.business_id.get_or_insert(data.business_id);
                day.booked.insert(data.appointment_id, slot);
            }
            AppointmentEvent::AppointmentCancelled(data) => {
                let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
                if let Some(day) = days.get_mut(&(data.staff_id, data.date)) {
                    day.booked.remove(&data.appointment_id);
                }
            }
            // Completed and no-show appointments keep their window
            AppointmentEvent::AppointmentConfirmed(_)
            | AppointmentEvent::AppointmentCompleted(_)
            | AppointmentEvent::AppointmentMarkedNoShow(_) => {}
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance(event);

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    /// Forgets every booking but keeps the declared availability, which is
    /// not derived from events.
    async fn reset(&self) -> Result<()> {
        {
            let mut days = self.days.write().unwrap_or_else(PoisonError::into_inner);
            days.retain(|_, day| day.declared.is_some());
            for day in days.values_mut() {
                day.booked.clear();
            }
        }

        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for AvailableSlotsView {
    fn name(&self) -> &'static str {
        "AvailableSlotsView"
    }

    fn count(&self) -> usize {
        self.days.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use common::{ClientId, ServiceId};
    use domain::{Aggregate, Appointment, NewAppointment};

    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(sh: u32, sm: u32, eh: u32, em: u32) -> TimeSlot {
        TimeSlot::new(t(sh, sm), t(eh, em)).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    struct Fixture {
        view: AvailableSlotsView,
        staff_id: StaffId,
        business_id: BusinessId,
    }

    impl Fixture {
        fn seeded(slots: Vec<TimeSlot>) -> Self {
            let view = AvailableSlotsView::new();
            let staff_id = StaffId::new();
            let business_id = BusinessId::new();
            view.seed(&StaffDailyAvailability::new(
                staff_id,
                business_id,
                day(),
                slots,
            ));
            Self {
                view,
                staff_id,
                business_id,
            }
        }

        fn book(&self, slot: TimeSlot) -> (Appointment, AppointmentEvent) {
            Appointment::schedule(NewAppointment {
                business_id: self.business_id,
                client_id: ClientId::new(),
                staff_id: self.staff_id,
                service_id: ServiceId::new(),
                date: day(),
                slot,
                notes: None,
                client_timezone: None,
            })
        }

        fn open(&self) -> Vec<TimeSlot> {
            self.view.open_slots(self.staff_id, day()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_unseeded_day_has_no_open_slots() {
        let view = AvailableSlotsView::new();
        assert!(view.open_slots(StaffId::new(), day()).is_none());
        assert!(!view.is_seeded(StaffId::new(), day()));
    }

    #[tokio::test]
    async fn test_seed_merges_declared_windows() {
        let f = Fixture::seeded(vec![slot(9, 0, 10, 0), slot(10, 0, 12, 0), slot(14, 0, 17, 0)]);

        assert!(f.view.is_seeded(f.staff_id, day()));
        assert_eq!(f.open(), vec![slot(9, 0, 12, 0), slot(14, 0, 17, 0)]);
        assert_eq!(f.view.open_minutes(f.staff_id, day()), Some(360));
        assert_eq!(f.view.business_of(f.staff_id, day()), Some(f.business_id));
    }

    #[tokio::test]
    async fn test_booking_in_the_middle_splits_window() {
        let f = Fixture::seeded(vec![slot(9, 0, 17, 0)]);
        let (_, event) = f.book(slot(10, 0, 10, 30));

        f.view.handle(&event).await.unwrap();

        assert_eq!(f.open(), vec![slot(9, 0, 10, 0), slot(10, 30, 17, 0)]);
    }

    #[tokio::test]
    async fn test_booking_at_window_edges_trims_window() {
        let f = Fixture::seeded(vec![slot(9, 0, 12, 0)]);
        let (_, first) = f.book(slot(9, 0, 9, 30));
        let (_, last) = f.book(slot(11, 30, 12, 0));

        f.view.handle(&first).await.unwrap();
        f.view.handle(&last).await.unwrap();

        assert_eq!(f.open(), vec![slot(9, 30, 11, 30)]);
    }

    #[tokio::test]
    async fn test_fully_booked_day_is_empty_not_none() {
        let f = Fixture::seeded(vec![slot(9, 0, 10, 0)]);
        let (_, event) = f.book(slot(9, 0, 10, 0));

        f.view.handle(&event).await.unwrap();

        assert_eq!(f.view.open_slots(f.staff_id, day()), Some(vec![]));
        assert_eq!(f.view.open_minutes(f.staff_id, day()), Some(0));
    }

    #[tokio::test]
    async fn test_cancellation_gives_window_back() {
        let f = Fixture::seeded(vec![slot(9, 0, 17, 0)]);
        let (appointment, scheduled) = f.book(slot(10, 0, 10, 30));
        f.view.handle(&scheduled).await.unwrap();

        let result = appointment
            .execute(|a| a.cancel(Some("sick".to_string())))
            .unwrap();
        f.view.handle(&result.events[0]).await.unwrap();

        assert_eq!(f.open(), vec![slot(9, 0, 17, 0)]);
    }

    #[tokio::test]
    async fn test_confirmation_keeps_window_booked() {
        let f = Fixture::seeded(vec![slot(9, 0, 17, 0)]);
        let (appointment, scheduled) = f.book(slot(10, 0, 10, 30));
        f.view.handle(&scheduled).await.unwrap();

        let result = appointment.execute(Appointment::confirm).unwrap();
        f.view.handle(&result.events[0]).await.unwrap();

        assert_eq!(f.open(), vec![slot(9, 0, 10, 0), slot(10, 30, 17, 0)]);
    }

    #[tokio::test]
    async fn test_booking_before_seed_is_applied_after() {
        let view = AvailableSlotsView::new();
        let staff_id = StaffId::new();
        let business_id = BusinessId::new();
        let (_, event) = Appointment::schedule(NewAppointment {
            business_id,
            client_id: ClientId::new(),
            staff_id,
            service_id: ServiceId::new(),
            date: day(),
            slot: slot(13, 0, 14, 0),
            notes: None,
            client_timezone: None,
        });

        view.handle(&event).await.unwrap();
        assert!(view.open_slots(staff_id, day()).is_none());

        view.seed(&StaffDailyAvailability::new(
            staff_id,
            business_id,
            day(),
            vec![slot(12, 0, 16, 0)],
        ));
        assert_eq!(
            view.open_slots(staff_id, day()),
            Some(vec![slot(12, 0, 13, 0), slot(14, 0, 16, 0)])
        );
    }

    #[tokio::test]
    async fn test_fitting_filters_short_gaps() {
        let f = Fixture::seeded(vec![slot(9, 0, 12, 0)]);
        let (_, event) = f.book(slot(9, 15, 11, 0));
        f.view.handle(&event).await.unwrap();

        assert_eq!(
            f.view.open_slots_fitting(f.staff_id, day(), 30),
            Some(vec![slot(11, 0, 12, 0)])
        );
    }

    #[tokio::test]
    async fn test_reset_keeps_seed_drops_bookings() {
        let f = Fixture::seeded(vec![slot(9, 0, 17, 0)]);
        let (_, event) = f.book(slot(10, 0, 10, 30));
        f.view.handle(&event).await.unwrap();
        assert_eq!(f.view.position().await.events_processed, 1);

        f.view.reset().await.unwrap();

        assert_eq!(f.open(), vec![slot(9, 0, 17, 0)]);
        assert_eq!(f.view.position().await, ProjectionPosition::zero());
        assert_eq!(ReadModel::count(&f.view), 1);
    }

    #[test]
    fn test_subtract_overlapping_bookings() {
        let open = subtract(
            &[slot(9, 0, 12, 0)],
            &[slot(9, 30, 10, 30), slot(10, 0, 11, 0)],
        );
        assert_eq!(open, vec![slot(9, 0, 9, 30), slot(11, 0, 12, 0)]);
    }
}
