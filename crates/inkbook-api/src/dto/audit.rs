//! Audit query strings

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use inkbook_core::{AuditAction, AuditQuery, AuditSeverity};
use inkbook_shared::constants::{DEFAULT_AUDIT_PAGE_SIZE, MAX_PAGE_SIZE};
use inkbook_shared::Pagination;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditListQuery {
    pub action: Option<AuditAction>,
    pub severity: Option<AuditSeverity>,
    pub actor_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<AuditListQuery> for AuditQuery {
    fn from(q: AuditListQuery) -> Self {
        AuditQuery {
            action: q.action,
            severity: q.severity,
            actor_id: q.actor_id,
            resource_type: q.resource_type,
            resource_id: q.resource_id,
            tenant_id: q.tenant_id,
            start_date: q.start_date,
            end_date: q.end_date,
            pagination: Pagination::new(q.page, q.limit, DEFAULT_AUDIT_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

impl LimitQuery {
    pub fn resolve(&self, default: u32) -> u32 {
        self.limit.filter(|l| *l > 0).unwrap_or(default).min(MAX_PAGE_SIZE)
    }
}
