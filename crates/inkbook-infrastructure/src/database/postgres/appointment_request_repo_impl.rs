// ============================================================================
// InkBook Infrastructure - PostgreSQL Appointment Request Repository
// File: crates/inkbook-infrastructure/src/database/postgres/appointment_request_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use inkbook_core::domain::{AppointmentRequest, RequestFilter, RequestStatus};
use inkbook_core::error::DomainError;
use inkbook_core::repositories::AppointmentRequestRepository;

use super::{db_error, offset_param};

const REQUEST_COLUMNS: &str = r#"
    id, title, description, budget, design_images, preferences, status,
    expires_at, client_id, accepted_by_tenant_id, resulting_appointment_id,
    created_at, updated_at
"#;

pub struct PgAppointmentRequestRepository {
    pool: PgPool,
}

impl PgAppointmentRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RequestRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub budget: f64,
    pub design_images: Vec<String>,
    pub preferences: Option<serde_json::Value>,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub client_id: Uuid,
    pub accepted_by_tenant_id: Option<Uuid>,
    pub resulting_appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestRow> for AppointmentRequest {
    fn from(row: RequestRow) -> Self {
        AppointmentRequest {
            id: row.id,
            title: row.title,
            description: row.description,
            budget: row.budget,
            design_images: row.design_images,
            preferences: row.preferences,
            status: RequestStatus::from_str(&row.status).unwrap_or_default(),
            expires_at: row.expires_at,
            client_id: row.client_id,
            accepted_by_tenant_id: row.accepted_by_tenant_id,
            resulting_appointment_id: row.resulting_appointment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &RequestFilter) {
    qb.push(" WHERE TRUE");
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(tenant_id) = filter.tenant_id {
        qb.push(" AND accepted_by_tenant_id = ").push_bind(tenant_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl AppointmentRequestRepository for PgAppointmentRequestRepository {
    async fn create(&self, request: &AppointmentRequest) -> Result<AppointmentRequest, DomainError> {
        info!("Inserting appointment request {}", request.id);

        let sql = format!(
            r#"
            INSERT INTO appointment_requests ({REQUEST_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let row: RequestRow = sqlx::query_as(&sql)
            .bind(request.id)
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.budget)
            .bind(&request.design_images)
            .bind(&request.preferences)
            .bind(request.status.as_str())
            .bind(request.expires_at)
            .bind(request.client_id)
            .bind(request.accepted_by_tenant_id)
            .bind(request.resulting_appointment_id)
            .bind(request.created_at)
            .bind(request.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("creating appointment request", e))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentRequest>, DomainError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM appointment_requests WHERE id = $1");
        let row: Option<RequestRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding appointment request by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_all(
        &self,
        filter: &RequestFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AppointmentRequest>, DomainError> {
        let mut qb = QueryBuilder::new(format!("SELECT {REQUEST_COLUMNS} FROM appointment_requests"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset_param(offset)?);

        let rows: Vec<RequestRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing appointment requests", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &RequestFilter) -> Result<u64, DomainError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM appointment_requests");
        push_filter(&mut qb, filter);

        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting appointment requests", e))?;

        Ok(total.max(0) as u64)
    }

    async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<AppointmentRequest>, DomainError> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM appointment_requests
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#
        );
        let rows: Vec<RequestRow> = sqlx::query_as(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing client appointment requests", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_available(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentRequest>, DomainError> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM appointment_requests
            WHERE status = 'PENDING' AND expires_at > $1
            ORDER BY created_at DESC
            "#
        );
        let rows: Vec<RequestRow> = sqlx::query_as(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing available appointment requests", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentRequest>, DomainError> {
        let sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM appointment_requests
            WHERE status = 'PENDING' AND expires_at <= $1
            ORDER BY expires_at ASC
            "#
        );
        let rows: Vec<RequestRow> = sqlx::query_as(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing expired appointment requests", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, request: &AppointmentRequest) -> Result<AppointmentRequest, DomainError> {
        let sql = format!(
            r#"
            UPDATE appointment_requests SET
                title = $2, description = $3, budget = $4, design_images = $5,
                preferences = $6, status = $7, expires_at = $8,
                accepted_by_tenant_id = $9, resulting_appointment_id = $10, updated_at = $11
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let row: Option<RequestRow> = sqlx::query_as(&sql)
            .bind(request.id)
            .bind(&request.title)
            .bind(&request.description)
            .bind(request.budget)
            .bind(&request.design_images)
            .bind(&request.preferences)
            .bind(request.status.as_str())
            .bind(request.expires_at)
            .bind(request.accepted_by_tenant_id)
            .bind(request.resulting_appointment_id)
            .bind(request.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("updating appointment request", e))?;

        row.map(Into::into)
            .ok_or(DomainError::RequestNotFound(request.id))
    }

    async fn update_if_status(
        &self,
        request: &AppointmentRequest,
        expected: RequestStatus,
    ) -> Result<Option<AppointmentRequest>, DomainError> {
        let sql = format!(
            r#"
            UPDATE appointment_requests SET
                status = $3, accepted_by_tenant_id = $4,
                resulting_appointment_id = $5, updated_at = $6
            WHERE id = $1 AND status = $2
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let row: Option<RequestRow> = sqlx::query_as(&sql)
            .bind(request.id)
            .bind(expected.as_str())
            .bind(request.status.as_str())
            .bind(request.accepted_by_tenant_id)
            .bind(request.resulting_appointment_id)
            .bind(request.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("transitioning appointment request", e))?;

        if row.is_none() {
            debug!(
                "Request {} was no longer {} at write time",
                request.id,
                expected.as_str()
            );
        }
        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM appointment_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("deleting appointment request", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::RequestNotFound(id));
        }
        Ok(())
    }
}
