// ============================================================================
// InkBook Infrastructure - PostgreSQL Calendar Repository
// File: crates/inkbook-infrastructure/src/database/postgres/calendar_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use inkbook_core::domain::Calendar;
use inkbook_core::error::DomainError;
use inkbook_core::repositories::CalendarRepository;

use super::{db_error, sqlstate, FOREIGN_KEY_VIOLATION};

const CALENDAR_COLUMNS: &str = "id, tenant_id, name, description, color, created_at";

pub struct PgCalendarRepository {
    pool: PgPool,
}

impl PgCalendarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CalendarRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CalendarRow> for Calendar {
    fn from(row: CalendarRow) -> Self {
        Calendar {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CalendarRepository for PgCalendarRepository {
    async fn create(&self, calendar: &Calendar) -> Result<Calendar, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO calendars ({CALENDAR_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CALENDAR_COLUMNS}
            "#
        );
        let row: CalendarRow = sqlx::query_as(&sql)
            .bind(calendar.id)
            .bind(calendar.tenant_id)
            .bind(&calendar.name)
            .bind(&calendar.description)
            .bind(&calendar.color)
            .bind(calendar.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if sqlstate(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    DomainError::TenantNotFound(calendar.tenant_id)
                } else {
                    db_error("creating calendar", e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Calendar>, DomainError> {
        let sql = format!("SELECT {CALENDAR_COLUMNS} FROM calendars WHERE id = $1");
        let row: Option<CalendarRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding calendar by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Calendar>, DomainError> {
        let sql = format!("SELECT {CALENDAR_COLUMNS} FROM calendars WHERE tenant_id = $1 ORDER BY name ASC");
        let rows: Vec<CalendarRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing tenant calendars", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
