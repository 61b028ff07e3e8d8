// ============================================================================
// InkBook Infrastructure - PostgreSQL Appointment Repository
// File: crates/inkbook-infrastructure/src/database/postgres/appointment_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use inkbook_core::domain::{Appointment, AppointmentFilter, AppointmentStatus};
use inkbook_core::error::DomainError;
use inkbook_core::repositories::AppointmentRepository;
use inkbook_shared::Pagination;

use super::{db_error, escape_like, offset_param, sqlstate, EXCLUSION_VIOLATION};

const APPOINTMENT_COLUMNS: &str = r#"
    id, title, description, start_time, end_time, status,
    deposit, total_price, notes, design_images,
    tenant_id, calendar_id, client_id, source_request_id,
    created_at, updated_at
"#;

pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct AppointmentRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub deposit: Option<f64>,
    pub total_price: Option<f64>,
    pub notes: Option<String>,
    pub design_images: Vec<String>,
    pub tenant_id: Uuid,
    pub calendar_id: Uuid,
    pub client_id: Uuid,
    pub source_request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            title: row.title,
            description: row.description,
            start_time: row.start_time,
            end_time: row.end_time,
            status: AppointmentStatus::from_str(&row.status).unwrap_or_default(),
            deposit: row.deposit,
            total_price: row.total_price,
            notes: row.notes,
            design_images: row.design_images,
            tenant_id: row.tenant_id,
            calendar_id: row.calendar_id,
            client_id: row.client_id,
            source_request_id: row.source_request_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Appends the WHERE clause for a listing filter.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AppointmentFilter) {
    qb.push(" WHERE TRUE");
    if let Some(tenant_id) = filter.tenant_id {
        qb.push(" AND tenant_id = ").push_bind(tenant_id);
    }
    if let Some(calendar_id) = filter.calendar_id {
        qb.push(" AND calendar_id = ").push_bind(calendar_id);
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND start_time >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND end_time <= ").push_bind(end);
    }
    if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Maps write errors, turning the overlap constraint into a conflict.
fn write_error(context: &str, e: sqlx::Error) -> DomainError {
    if sqlstate(&e).as_deref() == Some(EXCLUSION_VIOLATION) {
        warn!("Overlap constraint rejected {}", context);
        return DomainError::TimeConflict;
    }
    db_error(context, e)
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, DomainError> {
        info!("Inserting appointment {}", appointment.id);

        let sql = format!(
            r#"
            INSERT INTO appointments ({APPOINTMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        let row: AppointmentRow = sqlx::query_as(&sql)
            .bind(appointment.id)
            .bind(&appointment.title)
            .bind(&appointment.description)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status.as_str())
            .bind(appointment.deposit)
            .bind(appointment.total_price)
            .bind(&appointment.notes)
            .bind(&appointment.design_images)
            .bind(appointment.tenant_id)
            .bind(appointment.calendar_id)
            .bind(appointment.client_id)
            .bind(appointment.source_request_id)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error("creating appointment", e))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, DomainError> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let row: Option<AppointmentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding appointment by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_all(
        &self,
        filter: &AppointmentFilter,
        pagination: Pagination,
    ) -> Result<Vec<Appointment>, DomainError> {
        let mut qb = QueryBuilder::new(format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY start_time ASC LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(offset_param(pagination.offset())?);

        let rows: Vec<AppointmentRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing appointments", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &AppointmentFilter) -> Result<u64, DomainError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM appointments");
        push_filter(&mut qb, filter);

        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting appointments", e))?;

        Ok(total.max(0) as u64)
    }

    async fn find_by_calendar(
        &self,
        calendar_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, DomainError> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE calendar_id = $1
              AND ($2::timestamptz IS NULL OR start_time >= $2)
              AND ($3::timestamptz IS NULL OR end_time <= $3)
            ORDER BY start_time ASC
            "#
        );
        let rows: Vec<AppointmentRow> = sqlx::query_as(&sql)
            .bind(calendar_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing calendar appointments", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_upcoming(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Appointment>, DomainError> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE tenant_id = $1
              AND start_time >= $2
              AND status NOT IN ('CANCELLED', 'COMPLETED')
            ORDER BY start_time ASC
            LIMIT $3
            "#
        );
        let rows: Vec<AppointmentRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(now)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing upcoming appointments", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_conflicting(
        &self,
        calendar_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, DomainError> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE calendar_id = $1
              AND status <> 'CANCELLED'
              AND ($4::uuid IS NULL OR id <> $4)
              AND (
                    (start_time <= $2 AND end_time > $2)
                 OR (start_time < $3 AND end_time >= $3)
                 OR (start_time >= $2 AND end_time <= $3)
              )
            "#
        );
        let rows: Vec<AppointmentRow> = sqlx::query_as(&sql)
            .bind(calendar_id)
            .bind(start)
            .bind(end)
            .bind(exclude_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("finding conflicting appointments", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment, DomainError> {
        let sql = format!(
            r#"
            UPDATE appointments SET
                title = $2, description = $3, start_time = $4, end_time = $5,
                status = $6, deposit = $7, total_price = $8, notes = $9,
                design_images = $10, updated_at = $11
            WHERE id = $1
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        let row: Option<AppointmentRow> = sqlx::query_as(&sql)
            .bind(appointment.id)
            .bind(&appointment.title)
            .bind(&appointment.description)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status.as_str())
            .bind(appointment.deposit)
            .bind(appointment.total_price)
            .bind(&appointment.notes)
            .bind(&appointment.design_images)
            .bind(appointment.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error("updating appointment", e))?;

        row.map(Into::into)
            .ok_or(DomainError::AppointmentNotFound(appointment.id))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("deleting appointment", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AppointmentNotFound(id));
        }
        Ok(())
    }
}
