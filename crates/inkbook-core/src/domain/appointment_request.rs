// ============================================================================
// InkBook Core - Appointment Request Entity
// File: crates/inkbook-core/src/domain/appointment_request.rs
// ============================================================================
//! Open booking offers broadcast to every tenant.
//!
//! Status transitions are enforced here; services only orchestrate.
//!
//! ```text
//! PENDING --accept--> ACCEPTED --convert--> COMPLETED
//!    |--cancel--> CANCELLED
//!    |--sweep---> EXPIRED
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::DomainError;

/// Request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Cancelled,
    Expired,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Cancelled => "CANCELLED",
            RequestStatus::Expired => "EXPIRED",
            RequestStatus::Completed => "COMPLETED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(RequestStatus::Pending),
            "ACCEPTED" => Some(RequestStatus::Accepted),
            "CANCELLED" => Some(RequestStatus::Cancelled),
            "EXPIRED" => Some(RequestStatus::Expired),
            "COMPLETED" => Some(RequestStatus::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Cancelled | RequestStatus::Expired | RequestStatus::Completed
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub budget: f64,
    pub design_images: Vec<String>,
    /// Free-form client preferences (style, placement, size...)
    pub preferences: Option<serde_json::Value>,
    pub status: RequestStatus,
    pub expires_at: DateTime<Utc>,

    pub client_id: Uuid,
    pub accepted_by_tenant_id: Option<Uuid>,
    pub resulting_appointment_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAppointmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub budget: f64,
    #[serde(default)]
    pub design_images: Vec<String>,
    #[validate(custom(function = "validate_preferences"))]
    pub preferences: Option<serde_json::Value>,
}

fn validate_preferences(value: &serde_json::Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("preferences_must_be_object"))
    }
}

/// Listing filter for requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestFilter {
    pub client_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub status: Option<RequestStatus>,
}

impl RequestFilter {
    pub fn matches(&self, request: &AppointmentRequest) -> bool {
        self.client_id.is_none_or(|id| id == request.client_id)
            && self.tenant_id.is_none_or(|id| request.accepted_by_tenant_id == Some(id))
            && self.status.is_none_or(|s| s == request.status)
    }
}

/// Outcome of an accept attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// PENDING moved to ACCEPTED
    Accepted,
    /// Already held by the same tenant; nothing changed
    AlreadyAccepted,
}

impl AppointmentRequest {
    pub fn new(
        payload: NewAppointmentRequest,
        client_id: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, DomainError> {
        payload.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            title: payload.title,
            description: payload.description,
            budget: payload.budget,
            design_images: payload.design_images,
            preferences: payload.preferences,
            status: RequestStatus::Pending,
            expires_at: now + ttl,
            client_id,
            accepted_by_tenant_id: None,
            resulting_appointment_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == RequestStatus::Accepted
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn can_be_accepted(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && !self.is_expired_at(now)
    }

    pub fn can_be_cancelled(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && !self.is_expired_at(now)
    }

    pub fn is_owned_by(&self, client_id: Uuid) -> bool {
        self.client_id == client_id
    }

    /// Time left before expiry, zero once passed.
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    pub fn is_expiring_soon(&self, now: DateTime<Utc>, hours: i64) -> bool {
        let left = self.time_until_expiration(now);
        left > Duration::zero() && left <= Duration::hours(hours)
    }

    /// Tenant accepts. First tenant wins; the same tenant re-accepting is a no-op.
    pub fn accept(&mut self, tenant_id: Uuid, now: DateTime<Utc>) -> Result<AcceptOutcome, DomainError> {
        match self.status {
            RequestStatus::Accepted if self.accepted_by_tenant_id == Some(tenant_id) => {
                Ok(AcceptOutcome::AlreadyAccepted)
            }
            RequestStatus::Accepted => Err(DomainError::RequestAlreadyAccepted),
            RequestStatus::Pending => {
                if self.is_expired_at(now) {
                    return Err(DomainError::RequestExpired);
                }
                if self.accepted_by_tenant_id.is_some_and(|holder| holder != tenant_id) {
                    return Err(DomainError::RequestAlreadyAccepted);
                }
                self.status = RequestStatus::Accepted;
                self.accepted_by_tenant_id = Some(tenant_id);
                self.updated_at = now;
                Ok(AcceptOutcome::Accepted)
            }
            other => Err(DomainError::RequestNotAcceptable(other)),
        }
    }

    /// Authoring client withdraws the request.
    pub fn cancel(&mut self, client_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_owned_by(client_id) {
            return Err(DomainError::NotRequestOwner);
        }
        if !self.is_pending() {
            return Err(DomainError::RequestNotCancellable(self.status));
        }
        if self.is_expired_at(now) {
            return Err(DomainError::RequestExpired);
        }
        self.status = RequestStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    /// Sweep transition. Only a PENDING request past its deadline may expire.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.is_pending() || !self.is_expired_at(now) {
            return Err(DomainError::RequestNotExpirable(self.status));
        }
        self.status = RequestStatus::Expired;
        self.updated_at = now;
        Ok(())
    }

    /// Guard for conversion. Returns the accepting tenant.
    pub fn ensure_convertible(&self) -> Result<Uuid, DomainError> {
        if !self.is_accepted() {
            return Err(DomainError::RequestNotAccepted(self.status));
        }
        self.accepted_by_tenant_id.ok_or(DomainError::RequestMissingTenant)
    }

    /// Records the produced appointment and closes the request.
    pub fn complete(&mut self, appointment_id: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_convertible()?;
        self.status = RequestStatus::Completed;
        self.resulting_appointment_id = Some(appointment_id);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    fn pending(client_id: Uuid) -> AppointmentRequest {
        let payload = NewAppointmentRequest {
            title: "Koi on shoulder".to_string(),
            description: None,
            budget: 800.0,
            design_images: vec!["a.png".to_string(), "b.png".to_string()],
            preferences: Some(serde_json::json!({"style": "japanese"})),
        };
        AppointmentRequest::new(payload, client_id, now(), Duration::days(7)).unwrap()
    }

    #[test]
    fn test_new_request_expires_after_ttl() {
        let req = pending(Uuid::new_v4());
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.expires_at, now() + Duration::days(7));
        assert!(req.accepted_by_tenant_id.is_none());
        assert!(req.resulting_appointment_id.is_none());
    }

    #[test]
    fn test_new_request_rejects_bad_payload() {
        let payload = NewAppointmentRequest {
            title: String::new(),
            description: None,
            budget: -5.0,
            design_images: vec![],
            preferences: Some(serde_json::json!(["not", "a", "map"])),
        };
        let result = AppointmentRequest::new(payload, Uuid::new_v4(), now(), Duration::days(7));
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_accept_first_tenant_wins() {
        let mut req = pending(Uuid::new_v4());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(req.accept(a, now()).unwrap(), AcceptOutcome::Accepted);
        assert_eq!(req.accepted_by_tenant_id, Some(a));

        assert!(matches!(req.accept(b, now()), Err(DomainError::RequestAlreadyAccepted)));
        assert_eq!(req.accepted_by_tenant_id, Some(a));

        let before = req.updated_at;
        let later = now() + Duration::hours(1);
        assert_eq!(req.accept(a, later).unwrap(), AcceptOutcome::AlreadyAccepted);
        assert_eq!(req.updated_at, before);
    }

    #[test]
    fn test_accept_after_expiry_fails_without_sweep() {
        let mut req = pending(Uuid::new_v4());
        let after = req.expires_at;
        assert!(!req.can_be_accepted(after));
        assert!(matches!(req.accept(Uuid::new_v4(), after), Err(DomainError::RequestExpired)));
        assert_eq!(req.status, RequestStatus::Pending);
    }

    #[test]
    fn test_accept_terminal_request_fails() {
        let client = Uuid::new_v4();
        let mut req = pending(client);
        req.cancel(client, now()).unwrap();
        assert!(matches!(
            req.accept(Uuid::new_v4(), now()),
            Err(DomainError::RequestNotAcceptable(RequestStatus::Cancelled))
        ));
    }

    #[test]
    fn test_cancel_requires_owner_and_pending() {
        let client = Uuid::new_v4();
        let mut req = pending(client);

        assert!(matches!(req.cancel(Uuid::new_v4(), now()), Err(DomainError::NotRequestOwner)));

        req.accept(Uuid::new_v4(), now()).unwrap();
        assert!(matches!(
            req.cancel(client, now()),
            Err(DomainError::RequestNotCancellable(RequestStatus::Accepted))
        ));
    }

    #[test]
    fn test_cancel_after_expiry_fails() {
        let client = Uuid::new_v4();
        let mut req = pending(client);
        let after = req.expires_at + Duration::seconds(1);
        assert!(matches!(req.cancel(client, after), Err(DomainError::RequestExpired)));
    }

    #[test]
    fn test_expire_only_past_pending() {
        let mut req = pending(Uuid::new_v4());
        assert!(req.expire(now()).is_err());

        req.expire(req.expires_at).unwrap();
        assert_eq!(req.status, RequestStatus::Expired);
        assert!(req.expire(req.expires_at).is_err());
    }

    #[test]
    fn test_complete_requires_accepted() {
        let mut req = pending(Uuid::new_v4());
        let appointment_id = Uuid::new_v4();
        assert!(matches!(
            req.complete(appointment_id, now()),
            Err(DomainError::RequestNotAccepted(RequestStatus::Pending))
        ));

        let tenant = Uuid::new_v4();
        req.accept(tenant, now()).unwrap();
        assert_eq!(req.ensure_convertible().unwrap(), tenant);
        req.complete(appointment_id, now()).unwrap();
        assert_eq!(req.status, RequestStatus::Completed);
        assert_eq!(req.resulting_appointment_id, Some(appointment_id));
    }

    #[test]
    fn test_expiration_helpers() {
        let req = pending(Uuid::new_v4());
        assert_eq!(req.time_until_expiration(now()), Duration::days(7));
        assert!(!req.is_expiring_soon(now(), 24));
        assert!(req.is_expiring_soon(req.expires_at - Duration::hours(2), 24));
        assert_eq!(req.time_until_expiration(req.expires_at + Duration::days(1)), Duration::zero());
    }

    #[test]
    fn test_filter_by_tenant_uses_acceptance() {
        let mut req = pending(Uuid::new_v4());
        let tenant = Uuid::new_v4();
        let filter = RequestFilter { tenant_id: Some(tenant), ..Default::default() };
        assert!(!filter.matches(&req));
        req.accept(tenant, now()).unwrap();
        assert!(filter.matches(&req));
    }
}
