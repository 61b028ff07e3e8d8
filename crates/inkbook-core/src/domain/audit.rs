// ============================================================================
// InkBook Core - Audit Entry
// File: crates/inkbook-core/src/domain/audit.rs
// ============================================================================
//! Append-only audit records for every state-changing action

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use inkbook_shared::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AppointmentCreated,
    AppointmentUpdated,
    AppointmentCancelled,
    AppointmentConfirmed,
    AppointmentCompleted,
    AppointmentRescheduled,
    AppointmentDeleted,
    AppointmentRequestCreated,
    AppointmentRequestAccepted,
    AppointmentRequestCancelled,
    AppointmentRequestExpired,
    AppointmentCreatedFromRequest,
    UserCreated,
    UserLogin,
    UserUpdated,
    UserDeleted,
    UserLogout,
    UserPasswordChanged,
    UserEmailVerified,
    TenantCreated,
    TenantMemberAdded,
    CalendarCreated,
    SecuritySuspiciousLogin,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::AppointmentCreated => "APPOINTMENT_CREATED",
            AuditAction::AppointmentUpdated => "APPOINTMENT_UPDATED",
            AuditAction::AppointmentCancelled => "APPOINTMENT_CANCELLED",
            AuditAction::AppointmentConfirmed => "APPOINTMENT_CONFIRMED",
            AuditAction::AppointmentCompleted => "APPOINTMENT_COMPLETED",
            AuditAction::AppointmentRescheduled => "APPOINTMENT_RESCHEDULED",
            AuditAction::AppointmentDeleted => "APPOINTMENT_DELETED",
            AuditAction::AppointmentRequestCreated => "APPOINTMENT_REQUEST_CREATED",
            AuditAction::AppointmentRequestAccepted => "APPOINTMENT_REQUEST_ACCEPTED",
            AuditAction::AppointmentRequestCancelled => "APPOINTMENT_REQUEST_CANCELLED",
            AuditAction::AppointmentRequestExpired => "APPOINTMENT_REQUEST_EXPIRED",
            AuditAction::AppointmentCreatedFromRequest => "APPOINTMENT_CREATED_FROM_REQUEST",
            AuditAction::UserCreated => "USER_CREATED",
            AuditAction::UserLogin => "USER_LOGIN",
            AuditAction::UserUpdated => "USER_UPDATED",
            AuditAction::UserDeleted => "USER_DELETED",
            AuditAction::UserLogout => "USER_LOGOUT",
            AuditAction::UserPasswordChanged => "USER_PASSWORD_CHANGED",
            AuditAction::UserEmailVerified => "USER_EMAIL_VERIFIED",
            AuditAction::TenantCreated => "TENANT_CREATED",
            AuditAction::TenantMemberAdded => "TENANT_MEMBER_ADDED",
            AuditAction::CalendarCreated => "CALENDAR_CREATED",
            AuditAction::SecuritySuspiciousLogin => "SECURITY_SUSPICIOUS_LOGIN",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        const ALL: [AuditAction; 23] = [
            AuditAction::AppointmentCreated,
            AuditAction::AppointmentUpdated,
            AuditAction::AppointmentCancelled,
            AuditAction::AppointmentConfirmed,
            AuditAction::AppointmentCompleted,
            AuditAction::AppointmentRescheduled,
            AuditAction::AppointmentDeleted,
            AuditAction::AppointmentRequestCreated,
            AuditAction::AppointmentRequestAccepted,
            AuditAction::AppointmentRequestCancelled,
            AuditAction::AppointmentRequestExpired,
            AuditAction::AppointmentCreatedFromRequest,
            AuditAction::UserCreated,
            AuditAction::UserLogin,
            AuditAction::UserUpdated,
            AuditAction::UserDeleted,
            AuditAction::UserLogout,
            AuditAction::UserPasswordChanged,
            AuditAction::UserEmailVerified,
            AuditAction::TenantCreated,
            AuditAction::TenantMemberAdded,
            AuditAction::CalendarCreated,
            AuditAction::SecuritySuspiciousLogin,
        ];
        let upper = s.to_ascii_uppercase();
        ALL.into_iter().find(|a| a.as_str() == upper)
    }

    pub fn is_security_event(&self) -> bool {
        self.as_str().starts_with("SECURITY_")
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Error => "ERROR",
            AuditSeverity::Critical => "CRITICAL",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INFO" => Some(AuditSeverity::Info),
            "WARNING" => Some(AuditSeverity::Warning),
            "ERROR" => Some(AuditSeverity::Error),
            "CRITICAL" => Some(AuditSeverity::Critical),
            _ => None,
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, AuditSeverity::Error | AuditSeverity::Critical)
    }
}

/// Who performed an action and from where
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Option<Uuid>,
    pub actor_type: Option<String>,
    pub actor_email: Option<String>,
    pub actor_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
}

impl ActorContext {
    pub fn user(actor_id: Uuid) -> Self {
        Self {
            actor_id: Some(actor_id),
            actor_type: Some("USER".to_string()),
            ..Default::default()
        }
    }

    pub fn system() -> Self {
        Self {
            actor_type: Some("SYSTEM".to_string()),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.actor_email = Some(email.into());
        self
    }
}

/// Builder for an entry that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub severity: AuditSeverity,
    pub description: String,
    pub actor: ActorContext,
    pub resource_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_name: Option<String>,
    pub tenant_id: Option<Uuid>,
    pub tenant_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub success: bool,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: AuditAction, description: impl Into<String>) -> Self {
        Self {
            action,
            severity: AuditSeverity::Info,
            description: description.into(),
            actor: ActorContext::default(),
            resource_id: None,
            resource_type: None,
            resource_name: None,
            tenant_id: None,
            tenant_name: None,
            metadata: None,
            old_values: None,
            new_values: None,
            success: true,
            error_code: None,
            error_message: None,
        }
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn actor(mut self, actor: &ActorContext) -> Self {
        self.actor = actor.clone();
        self
    }

    pub fn resource(mut self, resource_type: &str, resource_id: Uuid, name: Option<String>) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self.resource_id = Some(resource_id);
        self.resource_name = name;
        self
    }

    pub fn tenant(mut self, tenant_id: Uuid) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn values(mut self, old: Option<serde_json::Value>, new: Option<serde_json::Value>) -> Self {
        self.old_values = old;
        self.new_values = new;
        self
    }

    pub fn failed(mut self, code: &str, message: impl Into<String>) -> Self {
        self.success = false;
        self.error_code = Some(code.to_string());
        self.error_message = Some(message.into());
        self
    }
}

/// Persisted audit record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    pub severity: AuditSeverity,
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

    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn from_new(entry: NewAuditEntry, now: DateTime<Utc>) -> Self {
        let actor = entry.actor;
        Self {
            id: Uuid::new_v4(),
            action: entry.action,
            severity: entry.severity,
            description: entry.description,
            actor_id: actor.actor_id,
            actor_type: actor.actor_type.unwrap_or_else(|| "USER".to_string()),
            actor_email: actor.actor_email,
            actor_name: actor.actor_name,
            resource_id: entry.resource_id,
            resource_type: entry.resource_type,
            resource_name: entry.resource_name,
            tenant_id: entry.tenant_id,
            tenant_name: entry.tenant_name,
            metadata: entry.metadata,
            old_values: entry.old_values,
            new_values: entry.new_values,
            ip_address: actor.ip_address,
            user_agent: actor.user_agent,
            endpoint: actor.endpoint,
            method: actor.method,
            success: entry.success,
            error_code: entry.error_code,
            error_message: entry.error_message,
            timestamp: now,
        }
    }

    pub fn is_security_event(&self) -> bool {
        self.severity.is_high() || self.action.is_security_event()
    }
}

/// Filtered audit page query
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub action: Option<AuditAction>,
    pub severity: Option<AuditSeverity>,
    pub actor_id: Option<Uuid>,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub pagination: Pagination,
}

impl AuditQuery {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.action.is_none_or(|a| a == entry.action)
            && self.severity.is_none_or(|s| s == entry.severity)
            && self.actor_id.is_none_or(|id| entry.actor_id == Some(id))
            && self
                .resource_type
                .as_deref()
                .is_none_or(|t| entry.resource_type.as_deref() == Some(t))
            && self.resource_id.is_none_or(|id| entry.resource_id == Some(id))
            && self.tenant_id.is_none_or(|id| entry.tenant_id == Some(id))
            && self.start_date.is_none_or(|d| entry.timestamp >= d)
            && self.end_date.is_none_or(|d| entry.timestamp <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strings() {
        assert_eq!(AuditAction::AppointmentRescheduled.as_str(), "APPOINTMENT_RESCHEDULED");
        assert_eq!(
            AuditAction::from_str("appointment_request_accepted"),
            Some(AuditAction::AppointmentRequestAccepted)
        );
        assert_eq!(AuditAction::from_str("nope"), None);
        assert!(AuditAction::SecuritySuspiciousLogin.is_security_event());
        assert!(!AuditAction::UserLogin.is_security_event());
    }

    #[test]
    fn test_entry_builder_carries_actor() {
        let actor_id = Uuid::new_v4();
        let actor = ActorContext {
            ip_address: Some("10.0.0.1".to_string()),
            ..ActorContext::user(actor_id)
        };
        let resource = Uuid::new_v4();
        let new = NewAuditEntry::new(AuditAction::AppointmentCreated, "created")
            .actor(&actor)
            .resource("appointment", resource, Some("Session".to_string()))
            .failed("TIME_CONFLICT", "overlap");

        let entry = AuditEntry::from_new(new, Utc::now());
        assert_eq!(entry.actor_id, Some(actor_id));
        assert_eq!(entry.actor_type, "USER");
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.resource_id, Some(resource));
        assert!(!entry.success);
        assert_eq!(entry.error_code.as_deref(), Some("TIME_CONFLICT"));
    }

    #[test]
    fn test_security_event_classification() {
        let warn = AuditEntry::from_new(
            NewAuditEntry::new(AuditAction::SecuritySuspiciousLogin, "bad password")
                .severity(AuditSeverity::Warning),
            Utc::now(),
        );
        assert!(warn.is_security_event());

        let info = AuditEntry::from_new(NewAuditEntry::new(AuditAction::UserLogin, "ok"), Utc::now());
        assert!(!info.is_security_event());

        let error = AuditEntry::from_new(
            NewAuditEntry::new(AuditAction::AppointmentUpdated, "x").severity(AuditSeverity::Error),
            Utc::now(),
        );
        assert!(error.is_security_event());
    }

    #[test]
    fn test_query_matches() {
        let tenant = Uuid::new_v4();
        let entry = AuditEntry::from_new(
            NewAuditEntry::new(AuditAction::AppointmentCreated, "x").tenant(tenant),
            Utc::now(),
        );
        let query = AuditQuery { tenant_id: Some(tenant), ..Default::default() };
        assert!(query.matches(&entry));

        let other = AuditQuery { action: Some(AuditAction::AppointmentDeleted), ..Default::default() };
        assert!(!other.matches(&entry));
    }
}
