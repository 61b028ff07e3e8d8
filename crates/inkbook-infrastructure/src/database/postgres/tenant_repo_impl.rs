// ============================================================================
// InkBook Infrastructure - PostgreSQL Tenant Repository
// File: crates/inkbook-infrastructure/src/database/postgres/tenant_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use inkbook_core::domain::{Tenant, TenantContact};
use inkbook_core::error::DomainError;
use inkbook_core::repositories::TenantRepository;
use inkbook_shared::Pagination;

use super::{db_error, offset_param, sqlstate, FOREIGN_KEY_VIOLATION};

const TENANT_COLUMNS: &str = "id, name, description, address, phone, email, owner_id, created_at";

pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            name: row.name,
            description: row.description,
            address: row.address,
            phone: row.phone,
            email: row.email,
            owner_id: row.owner_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TenantContactRow {
    pub tenant_id: Uuid,
    pub tenant_name: String,
    pub owner_email: String,
    pub owner_name: String,
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, DomainError> {
        info!("Creating tenant {}", tenant.id);

        let sql = format!(
            r#"
            INSERT INTO tenants ({TENANT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TENANT_COLUMNS}
            "#
        );
        let row: TenantRow = sqlx::query_as(&sql)
            .bind(tenant.id)
            .bind(&tenant.name)
            .bind(&tenant.description)
            .bind(&tenant.address)
            .bind(&tenant.phone)
            .bind(&tenant.email)
            .bind(tenant.owner_id)
            .bind(tenant.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if sqlstate(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    DomainError::UserNotFound
                } else {
                    db_error("creating tenant", e)
                }
            })?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DomainError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1");
        let row: Option<TenantRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding tenant by id", e))?;

        Ok(row.map(Into::into))
    }

    async fn find_all(&self, pagination: Pagination) -> Result<Vec<Tenant>, DomainError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at ASC LIMIT $1 OFFSET $2");
        let rows: Vec<TenantRow> = sqlx::query_as(&sql)
            .bind(pagination.limit as i64)
            .bind(offset_param(pagination.offset())?)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing tenants", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting tenants", e))?;

        Ok(total.max(0) as u64)
    }

    async fn find_all_contacts(&self) -> Result<Vec<TenantContact>, DomainError> {
        let rows: Vec<TenantContactRow> = sqlx::query_as(
            r#"
            SELECT t.id AS tenant_id, t.name AS tenant_name,
                   u.email AS owner_email, u.name AS owner_name
            FROM tenants t
            JOIN users u ON u.id = t.owner_id
            ORDER BY t.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("listing tenant contacts", e))?;

        Ok(rows
            .into_iter()
            .map(|r| TenantContact {
                tenant_id: r.tenant_id,
                tenant_name: r.tenant_name,
                owner_email: r.owner_email,
                owner_name: r.owner_name,
            })
            .collect())
    }

    async fn is_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let member: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenants WHERE id = $1 AND owner_id = $2
                UNION ALL
                SELECT 1 FROM tenant_members WHERE tenant_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("checking tenant membership", e))?;

        Ok(member)
    }

    async fn add_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (tenant_id, user_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if sqlstate(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                DomainError::TenantNotFound(tenant_id)
            } else {
                db_error("adding tenant member", e)
            }
        })?;

        Ok(())
    }
}
