use chrono::NaiveDate;
use common::{BusinessId, ClientId};
use domain::{Appointment, AppointmentStatus};

use crate::StaffId;

/// Query parameters for listing appointments.
///
/// Results are ordered by date, then start time.
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    /// Filter by business.
    pub business_id: Option<BusinessId>,

    /// Filter by staff member.
    pub staff_id: Option<StaffId>,

    /// Filter by client.
    pub client_id: Option<ClientId>,

    /// Filter to appointments on or after this date.
    pub from_date: Option<NaiveDate>,

    /// Filter to appointments on or before this date.
    pub to_date: Option<NaiveDate>,

    /// Filter by status (any of these).
    pub statuses: Option<Vec<AppointmentStatus>>,

    /// Maximum number of appointments to return.
    pub limit: Option<usize>,

    /// Number of appointments to skip.
    pub offset: Option<usize>,
}

impl AppointmentQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one staff member's day.
    pub fn for_staff_day(staff_id: StaffId, date: NaiveDate) -> Self {
        Self::new().staff_id(staff_id).date(date)
    }

    /// Filters by business.
    pub fn business_id(mut self, business_id: BusinessId) -> Self {
        self.business_id = Some(business_id);
        self
    }

    /// Filters by staff member.
    pub fn staff_id(mut self, staff_id: StaffId) -> Self {
        self.staff_id = Some(staff_id);
        self
    }

    /// Filters by client.
    pub fn client_id(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Filters to a single date.
    pub fn date(self, date: NaiveDate) -> Self {
        self.from_date(date).to_date(date)
    }

    /// Filters to appointments on or after this date (inclusive).
    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    /// Filters to appointments on or before this date (inclusive).
    pub fn to_date(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }

    /// Adds a status to filter by.
    pub fn status(mut self, status: AppointmentStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    /// Filters to appointments that still occupy their window.
    pub fn active(self) -> Self {
        self.status(AppointmentStatus::Scheduled)
            .status(AppointmentStatus::Confirmed)
            .status(AppointmentStatus::Completed)
            .status(AppointmentStatus::NoShow)
    }

    /// Limits the number of appointments returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many appointments before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the appointment passes every filter (ignores paging).
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(id) = self.business_id
            && appointment.business_id() != id
        {
            return false;
        }
        if let Some(id) = self.staff_id
            && appointment.staff_id() != id
        {
            return false;
        }
        if let Some(id) = self.client_id
            && appointment.client_id() != id
        {
            return false;
        }
        if let Some(from) = self.from_date
            && appointment.date() < from
        {
            return false;
        }
        if let Some(to) = self.to_date
            && appointment.date() > to
        {
            return false;
        }
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&appointment.status())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;
    use common::ServiceId;
    use domain::{NewAppointment, TimeSlot};

    use super::*;

    fn appointment(staff_id: StaffId, date: NaiveDate) -> Appointment {
        Appointment::schedule(NewAppointment {
            business_id: BusinessId::new(),
            client_id: ClientId::new(),
            staff_id,
            service_id: ServiceId::new(),
            date,
            slot: TimeSlot::starting_at(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 30).unwrap(),
            notes: None,
            client_timezone: None,
        })
        .0
    }

    #[test]
    fn query_for_staff_day() {
        let staff_id = StaffId::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let query = AppointmentQuery::for_staff_day(staff_id, date);

        assert_eq!(query.staff_id, Some(staff_id));
        assert_eq!(query.from_date, Some(date));
        assert_eq!(query.to_date, Some(date));
        assert!(query.statuses.is_none());
    }

    #[test]
    fn query_builder_chain() {
        let business_id = BusinessId::new();
        let query = AppointmentQuery::new()
            .business_id(business_id)
            .status(AppointmentStatus::Confirmed)
            .limit(50)
            .offset(10);

        assert_eq!(query.business_id, Some(business_id));
        assert_eq!(query.statuses, Some(vec![AppointmentStatus::Confirmed]));
        assert_eq!(query.limit, Some(50));
        assert_eq!(query.offset, Some(10));
    }

    #[test]
    fn query_matches_filters() {
        let staff_id = StaffId::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let booked = appointment(staff_id, date);

        assert!(AppointmentQuery::for_staff_day(staff_id, date).matches(&booked));
        assert!(AppointmentQuery::new().active().matches(&booked));
        assert!(!AppointmentQuery::for_staff_day(StaffId::new(), date).matches(&booked));
        assert!(
            !AppointmentQuery::new()
                .from_date(date.succ_opt().unwrap())
                .matches(&booked)
        );
        assert!(
            !AppointmentQuery::new()
                .status(AppointmentStatus::Cancelled)
                .matches(&booked)
        );
    }
}
