// ============================================================================
// InkBook Infrastructure - PostgreSQL Audit Repository
// File: crates/inkbook-infrastructure/src/database/postgres/audit_repo_impl.rs
// ============================================================================
//! Append-only. The table carries a trigger rejecting UPDATE and DELETE, and
//! this adapter exposes no statement that would attempt either.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use inkbook_core::domain::{AuditAction, AuditEntry, AuditQuery, AuditSeverity};
use inkbook_core::error::DomainError;
use inkbook_core::repositories::AuditRepository;
use inkbook_shared::Paginated;

use super::{db_error, offset_param};

const AUDIT_COLUMNS: &str = r#"
    id, action, severity, description,
    actor_id, actor_type, actor_email, actor_name,
    resource_id, resource_type, resource_name,
    tenant_id, tenant_name,
    metadata, old_values, new_values,
    ip_address, user_agent, endpoint, method,
    success, error_code, error_message, occurred_at
"#;

pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRow {
    pub id: Uuid,
    pub action: String,
    pub severity: String,
    pub description: String,
    pub actor_id: Option<Uuid>,
    pub actor_type: String,
    pub actor_email: Option<String>,
    pub actor_name: Option<String>,
    pub resource_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_name: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub tenant_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub success: bool,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DomainError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(&row.action).ok_or_else(|| {
            DomainError::DatabaseError(format!("unknown audit action '{}'", row.action))
        })?;

        Ok(AuditEntry {
            id: row.id,
            action,
            severity: AuditSeverity::from_str(&row.severity).unwrap_or_default(),
            description: row.description,
            actor_id: row.actor_id,
            actor_type: row.actor_type,
            actor_email: row.actor_email,
            actor_name: row.actor_name,
            resource_id: row.resource_id,
            resource_type: row.resource_type,
            resource_name: row.resource_name,
            tenant_id: row.tenant_id,
            tenant_name: row.tenant_name,
            metadata: row.metadata,
            old_values: row.old_values,
            new_values: row.new_values,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            endpoint: row.endpoint,
            method: row.method,
            success: row.success,
            error_code: row.error_code,
            error_message: row.error_message,
            timestamp: row.occurred_at,
        })
    }
}

fn into_entries(rows: Vec<AuditRow>) -> Result<Vec<AuditEntry>, DomainError> {
    rows.into_iter().map(AuditEntry::try_from).collect()
}

fn push_query(qb: &mut QueryBuilder<'_, Postgres>, query: &AuditQuery) {
    qb.push(" WHERE TRUE");
    if let Some(action) = query.action {
        qb.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(severity) = query.severity {
        qb.push(" AND severity = ").push_bind(severity.as_str());
    }
    if let Some(actor_id) = query.actor_id {
        qb.push(" AND actor_id = ").push_bind(actor_id);
    }
    if let Some(resource_type) = query.resource_type.clone() {
        qb.push(" AND resource_type = ").push_bind(resource_type);
    }
    if let Some(resource_id) = query.resource_id {
        qb.push(" AND resource_id = ").push_bind(resource_id);
    }
    if let Some(tenant_id) = query.tenant_id {
        qb.push(" AND tenant_id = ").push_bind(tenant_id);
    }
    if let Some(start) = query.start_date {
        qb.push(" AND occurred_at >= ").push_bind(start);
    }
    if let Some(end) = query.end_date {
        qb.push(" AND occurred_at <= ").push_bind(end);
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditEntry, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO audit_logs ({AUDIT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING {AUDIT_COLUMNS}
            "#
        );
        let row: AuditRow = sqlx::query_as(&sql)
            .bind(entry.id)
            .bind(entry.action.as_str())
            .bind(entry.severity.as_str())
            .bind(&entry.description)
            .bind(entry.actor_id)
            .bind(&entry.actor_type)
            .bind(&entry.actor_email)
            .bind(&entry.actor_name)
            .bind(entry.resource_id)
            .bind(&entry.resource_type)
            .bind(&entry.resource_name)
            .bind(entry.tenant_id)
            .bind(&entry.tenant_name)
            .bind(&entry.metadata)
            .bind(&entry.old_values)
            .bind(&entry.new_values)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(&entry.endpoint)
            .bind(&entry.method)
            .bind(entry.success)
            .bind(&entry.error_code)
            .bind(&entry.error_message)
            .bind(entry.timestamp)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("appending audit entry", e))?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEntry>, DomainError> {
        let sql = format!("SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE id = $1");
        let row: Option<AuditRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding audit entry", e))?;

        row.map(AuditEntry::try_from).transpose()
    }

    async fn find_by_resource(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let sql = format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_logs
            WHERE resource_type = $1 AND resource_id = $2
            ORDER BY occurred_at ASC
            "#
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(resource_type)
            .bind(resource_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing audit trail for resource", e))?;

        into_entries(rows)
    }

    async fn find_by_actor(&self, actor_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        let sql = format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_logs
            WHERE actor_id = $1
            ORDER BY occurred_at DESC
            LIMIT $2
            "#
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(actor_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing audit entries by actor", e))?;

        into_entries(rows)
    }

    async fn find_by_tenant(&self, tenant_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        let sql = format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_logs
            WHERE tenant_id = $1
            ORDER BY occurred_at DESC
            LIMIT $2
            "#
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing audit entries by tenant", e))?;

        into_entries(rows)
    }

    async fn query(&self, query: &AuditQuery) -> Result<Paginated<AuditEntry>, DomainError> {
        let pagination = query.pagination;

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM audit_logs");
        push_query(&mut count_qb, query);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting audit entries", e))?;

        let mut qb = QueryBuilder::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_logs"));
        push_query(&mut qb, query);
        qb.push(" ORDER BY occurred_at DESC LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(offset_param(pagination.offset())?);
        let rows: Vec<AuditRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("querying audit entries", e))?;

        Ok(Paginated::new(into_entries(rows)?, total.max(0) as u64, pagination))
    }

    async fn find_security_events(&self, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        let sql = format!(
            r#"
            SELECT {AUDIT_COLUMNS}
            FROM audit_logs
            WHERE severity IN ('ERROR', 'CRITICAL') OR action LIKE 'SECURITY\_%'
            ORDER BY occurred_at DESC
            LIMIT $1
            "#
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing security events", e))?;

        into_entries(rows)
    }
}
