use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use common::{BusinessId, ClientId, ServiceId};
use domain::{Aggregate, Appointment, AppointmentRecord, AppointmentStatus, TimeSlot};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AppointmentId, AppointmentQuery, Result, StaffId, StoreError, Version,
    store::{AppointmentStore, validate_update},
};

/// Name of the exclusion constraint guarding against double-booking.
pub const NO_OVERLAP_CONSTRAINT: &str = "appointments_no_overlap";

/// SQLSTATE raised by an exclusion constraint violation.
const EXCLUSION_VIOLATION: &str = "23P01";

/// SQLSTATE raised by a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

const COLUMNS: &str = "id, version, business_id, client_id, staff_id, service_id, \
     appointment_date, start_time, end_time, status, notes, client_timezone, created_at, updated_at";

/// PostgreSQL-backed appointment store.
///
/// Double-booking is prevented by the `appointments_no_overlap` exclusion
/// constraint, so concurrent saves from any number of processes are safe.
#[derive(Clone)]
pub struct PostgresAppointmentStore {
    pool: PgPool,
}

impl PostgresAppointmentStore {
    /// Creates a new PostgreSQL appointment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and creates a store over a fresh pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_appointment(row: PgRow) -> Result<Appointment> {
        let status: String = row.try_get("status")?;
        let status: AppointmentStatus = status
            .parse()
            .map_err(|e: domain::UnknownStatus| StoreError::Corrupt(e.to_string()))?;

        let start: NaiveTime = row.try_get("start_time")?;
        let end: NaiveTime = row.try_get("end_time")?;
        let slot = TimeSlot::new(start, end).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let record = AppointmentRecord {
            id: AppointmentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            version: Version::new(row.try_get("version")?),
            business_id: BusinessId::from_uuid(row.try_get::<Uuid, _>("business_id")?),
            client_id: ClientId::from_uuid(row.try_get::<Uuid, _>("client_id")?),
            staff_id: StaffId::from_uuid(row.try_get::<Uuid, _>("staff_id")?),
            service_id: ServiceId::from_uuid(row.try_get::<Uuid, _>("service_id")?),
            date: row.try_get("appointment_date")?,
            slot,
            status,
            notes: row.try_get("notes")?,
            client_timezone: row.try_get("client_timezone")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };

        Ok(record.into())
    }
}

#[async_trait]
impl AppointmentStore for PostgresAppointmentStore {
    #[tracing::instrument(skip(self))]
    async fn find_overlapping(
        &self,
        staff_id: StaffId,
        date: NaiveDate,
        slot: TimeSlot,
    ) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}
            FROM appointments
            WHERE staff_id = $1
              AND appointment_date = $2
              AND status <> 'Cancelled'
              AND start_time < $4
              AND $3 < end_time
            ORDER BY start_time ASC, end_time ASC
            "#
        ))
        .bind(staff_id.as_uuid())
        .bind(date)
        .bind(slot.start())
        .bind(slot.end())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_appointment).collect()
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id()))]
    async fn save(&self, appointment: Appointment) -> Result<Appointment> {
        sqlx::query(&format!(
            r#"
            INSERT INTO appointments ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#
        ))
        .bind(appointment.id().as_uuid())
        .bind(appointment.version().as_i64())
        .bind(appointment.business_id().as_uuid())
        .bind(appointment.client_id().as_uuid())
        .bind(appointment.staff_id().as_uuid())
        .bind(appointment.service_id().as_uuid())
        .bind(appointment.date())
        .bind(appointment.start_time())
        .bind(appointment.end_time())
        .bind(appointment.status().as_str())
        .bind(appointment.notes())
        .bind(appointment.client_timezone())
        .bind(appointment.created_at())
        .bind(appointment.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                let code = db_err.code();
                if db_err.constraint() == Some(NO_OVERLAP_CONSTRAINT)
                    || code.as_deref() == Some(EXCLUSION_VIOLATION)
                {
                    metrics::counter!("store_overlap_rejections_total").increment(1);
                    return StoreError::OverlappingAppointment {
                        staff_id: appointment.staff_id(),
                        date: appointment.date(),
                        slot: appointment.slot(),
                    };
                }
                if code.as_deref() == Some(UNIQUE_VIOLATION) {
                    return StoreError::DuplicateId(appointment.id());
                }
            }
            StoreError::Database(e)
        })?;

        Ok(appointment)
    }

    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {COLUMNS} FROM appointments WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_appointment).transpose()
    }

    #[tracing::instrument(skip(self, appointment), fields(appointment_id = %appointment.id()))]
    async fn update(
        &self,
        appointment: Appointment,
        expected_version: Version,
    ) -> Result<Appointment> {
        let id = appointment.id();

        // Start a transaction
        let mut tx = self.pool.begin().await?;

        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM appointments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let current = row
            .map(Self::row_to_appointment)
            .transpose()?
            .ok_or(StoreError::NotFound(id))?;

        validate_update(&current, &appointment, expected_version)?;

        // The row is locked and its version checked above.
        sqlx::query(
            r#"
            UPDATE appointments
            SET status = $2, version = $3, notes = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(appointment.status().as_str())
        .bind(appointment.version().as_i64())
        .bind(appointment.notes())
        .bind(appointment.updated_at())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(appointment)
    }

    async fn query(&self, query: AppointmentQuery) -> Result<Vec<Appointment>> {
        let mut sql = format!("SELECT {COLUMNS} FROM appointments WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.business_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND business_id = ${param_count}"));
        }
        if query.staff_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND staff_id = ${param_count}"));
        }
        if query.client_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND client_id = ${param_count}"));
        }
        if query.from_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND appointment_date >= ${param_count}"));
        }
        if query.to_date.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND appointment_date <= ${param_count}"));
        }
        if query.statuses.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ANY(${param_count})"));
        }

        sql.push_str(" ORDER BY appointment_date ASC, start_time ASC, end_time ASC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        // Build and execute query with parameters
        let mut sqlx_query = sqlx::query(&sql);

        if let Some(id) = query.business_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(id) = query.staff_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(id) = query.client_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(from) = query.from_date {
            sqlx_query = sqlx_query.bind(from);
        }
        if let Some(to) = query.to_date {
            sqlx_query = sqlx_query.bind(to);
        }
        if let Some(statuses) = query.statuses {
            let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
            sqlx_query = sqlx_query.bind(names);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(i64::try_from(offset).unwrap_or(i64::MAX));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_appointment).collect()
    }
}
