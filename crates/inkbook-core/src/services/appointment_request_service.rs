// ============================================================================
// InkBook Core - Appointment Request Lifecycle
// File: crates/inkbook-core/src/services/appointment_request_service.rs
// ============================================================================
//! Drives requests through PENDING -> ACCEPTED / CANCELLED / EXPIRED -> COMPLETED.
//!
//! Guards live on `AppointmentRequest`; this service loads, decides,
//! writes with compare-and-set, then notifies and audits. Mail, event
//! and audit failures are logged and never undo a transition.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

use inkbook_shared::constants::{DEFAULT_REQUEST_PAGE_SIZE, MAX_LIST_OFFSET};
use inkbook_shared::Paginated;

use crate::domain::{
    validate_time_range, AcceptOutcome, ActorContext, Appointment, AppointmentRequest, AppointmentStatus,
    AuditAction, MailMessage, MailTemplate, NewAppointment, NewAppointmentRequest, NewAuditEntry,
    RequestFilter, RequestStatus, Tenant,
};
use crate::error::DomainError;
use crate::ports::{EventNotifier, Mailer};
use crate::repositories::{
    AppointmentRepository, AppointmentRequestRepository, CalendarRepository, TenantRepository, UserRepository,
};
use crate::services::appointment_service::RESOURCE_APPOINTMENT;
use crate::services::{AuditRecorder, ConflictChecker};

const RESOURCE_REQUEST: &str = "APPOINTMENT_REQUEST";

/// Scheduling details supplied by the tenant when converting
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestConversion {
    pub calendar_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Defaults to the request budget
    #[validate(range(min = 0.0))]
    pub total_price: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub request: AppointmentRequest,
    pub appointment: Appointment,
}

/// Collaborators of the lifecycle engine
pub struct RequestServiceDeps {
    pub requests: Arc<dyn AppointmentRequestRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub calendars: Arc<dyn CalendarRepository>,
    pub users: Arc<dyn UserRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn EventNotifier>,
    pub audit: Arc<AuditRecorder>,
}

pub struct AppointmentRequestService {
    requests: Arc<dyn AppointmentRequestRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    tenants: Arc<dyn TenantRepository>,
    calendars: Arc<dyn CalendarRepository>,
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    notifier: Arc<dyn EventNotifier>,
    audit: Arc<AuditRecorder>,
    conflicts: ConflictChecker,
    request_ttl: Duration,
}

impl AppointmentRequestService {
    pub fn new(deps: RequestServiceDeps, request_ttl_days: i64) -> Self {
        Self {
            conflicts: ConflictChecker::new(deps.appointments.clone()),
            requests: deps.requests,
            appointments: deps.appointments,
            tenants: deps.tenants,
            calendars: deps.calendars,
            users: deps.users,
            mailer: deps.mailer,
            notifier: deps.notifier,
            audit: deps.audit,
            request_ttl: Duration::days(request_ttl_days),
        }
    }

    /// Client opens a new request; every tenant is told by mail.
    pub async fn create(
        &self,
        payload: NewAppointmentRequest,
        client_id: Uuid,
        actor: &ActorContext,
    ) -> Result<AppointmentRequest, DomainError> {
        info!(client_id = %client_id, "Creating appointment request");

        // 1. Build and validate
        let request = AppointmentRequest::new(payload, client_id, Utc::now(), self.request_ttl)?;

        // 2. Client exists and has the client role
        let client = self
            .users
            .find_by_id(client_id)
            .await?
            .ok_or(DomainError::ClientNotFound(client_id))?;
        if !client.is_client() {
            warn!(user_id = %client_id, "Only clients can create appointment requests");
            return Err(DomainError::NotAClient);
        }

        // 3. Persist
        let request = self.requests.create(&request).await?;

        // 4. Broadcast to tenants
        self.notify_tenants_of_new_request(&request, &client.name).await;

        // 5. Audit
        let mut actor = actor.clone();
        actor.actor_id = Some(client.id);
        actor.actor_email = Some(client.email.clone());
        actor.actor_name = Some(client.name.clone());
        let entry = NewAuditEntry::new(
            AuditAction::AppointmentRequestCreated,
            format!("Appointment request created: {}", request.title),
        )
        .actor(&actor)
        .resource(RESOURCE_REQUEST, request.id, Some(request.title.clone()))
        .metadata(serde_json::json!({
            "budget": request.budget,
            "design_images_count": request.design_images.len(),
        }));
        self.audit.log(entry).await;

        info!(request_id = %request.id, "Appointment request created");
        Ok(request)
    }

    /// Offset listing; `page = floor(offset / limit) + 1`.
    pub async fn find_all(
        &self,
        filter: &RequestFilter,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> Result<Paginated<AppointmentRequest>, DomainError> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_REQUEST_PAGE_SIZE)
            .min(inkbook_shared::constants::MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        if offset > MAX_LIST_OFFSET {
            return Err(DomainError::ValidationError(format!(
                "offset must not exceed {}",
                MAX_LIST_OFFSET
            )));
        }

        let data = self.requests.find_all(filter, limit, offset).await?;
        let total = self.requests.count(filter).await?;
        Ok(Paginated::from_offset(data, total, offset, limit))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<AppointmentRequest, DomainError> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or(DomainError::RequestNotFound(id))
    }

    pub async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<AppointmentRequest>, DomainError> {
        self.requests.find_by_client(client_id).await
    }

    /// Requests a tenant may still accept
    pub async fn find_available_for_tenant(&self, tenant_id: Uuid) -> Result<Vec<AppointmentRequest>, DomainError> {
        self.tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(DomainError::TenantNotFound(tenant_id))?;
        self.requests.find_available(Utc::now()).await
    }

    /// Tenant accepts. First tenant wins; re-accepting by the holder is a
    /// no-op that returns the stored request unchanged.
    pub async fn accept(
        &self,
        request_id: Uuid,
        tenant_id: Uuid,
        actor: &ActorContext,
    ) -> Result<AppointmentRequest, DomainError> {
        info!(request_id = %request_id, tenant_id = %tenant_id, "Tenant accepting request");

        // 1. Tenant exists
        let tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(DomainError::TenantNotFound(tenant_id))?;

        // 2. Actor belongs to the tenant
        self.ensure_member(&tenant, actor).await?;

        // 3. Load and decide
        let request = self.find_by_id(request_id).await?;
        let mut next = request.clone();
        let now = Utc::now();
        match next.accept(tenant_id, now) {
            Ok(AcceptOutcome::AlreadyAccepted) => {
                debug!(request_id = %request_id, "Request already accepted by this tenant");
                return Ok(request);
            }
            Ok(AcceptOutcome::Accepted) => {}
            Err(e) => {
                warn!(request_id = %request_id, tenant_id = %tenant_id, error = %e, "Accept rejected");
                return Err(e);
            }
        }

        // 4. Compare-and-set on PENDING
        let updated = match self.requests.update_if_status(&next, RequestStatus::Pending).await? {
            Some(updated) => updated,
            None => return self.resolve_lost_accept(request_id, tenant_id, now).await,
        };

        // 5. Tell the client
        self.notify_client_of_acceptance(&updated, &tenant).await;

        // 6. Audit
        let mut entry = NewAuditEntry::new(
            AuditAction::AppointmentRequestAccepted,
            format!("Appointment request accepted by tenant: {}", tenant.name),
        )
        .actor(actor)
        .resource(RESOURCE_REQUEST, updated.id, Some(updated.title.clone()))
        .tenant(tenant.id)
        .metadata(serde_json::json!({
            "accepted_by_tenant_id": tenant.id,
            "client_id": updated.client_id,
        }));
        entry.tenant_name = Some(tenant.name.clone());
        self.audit.log(entry).await;

        info!(request_id = %request_id, tenant_id = %tenant_id, "Request accepted");
        Ok(updated)
    }

    /// Someone else wrote between our read and our CAS.
    async fn resolve_lost_accept(
        &self,
        request_id: Uuid,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AppointmentRequest, DomainError> {
        let current = self.find_by_id(request_id).await?;
        let mut replay = current.clone();
        match replay.accept(tenant_id, now) {
            Ok(AcceptOutcome::AlreadyAccepted) => Ok(current),
            Ok(AcceptOutcome::Accepted) => Err(DomainError::RequestAlreadyAccepted),
            Err(e) => {
                warn!(request_id = %request_id, tenant_id = %tenant_id, error = %e, "Lost accept race");
                Err(e)
            }
        }
    }

    /// Authoring client withdraws a PENDING request.
    pub async fn cancel(
        &self,
        request_id: Uuid,
        client_id: Uuid,
        actor: &ActorContext,
    ) -> Result<AppointmentRequest, DomainError> {
        info!(request_id = %request_id, client_id = %client_id, "Client cancelling request");

        let request = self.find_by_id(request_id).await?;
        let mut next = request.clone();
        if let Err(e) = next.cancel(client_id, Utc::now()) {
            warn!(request_id = %request_id, error = %e, "Cancel rejected");
            return Err(e);
        }

        let updated = match self.requests.update_if_status(&next, RequestStatus::Pending).await? {
            Some(updated) => updated,
            None => {
                let current = self.find_by_id(request_id).await?;
                warn!(request_id = %request_id, status = %current.status, "Request changed before cancel");
                return Err(DomainError::RequestNotCancellable(current.status));
            }
        };

        let entry = NewAuditEntry::new(
            AuditAction::AppointmentRequestCancelled,
            format!("Appointment request cancelled: {}", updated.title),
        )
        .actor(actor)
        .resource(RESOURCE_REQUEST, updated.id, Some(updated.title.clone()))
        .metadata(serde_json::json!({ "cancelled_by": "client" }));
        self.audit.log(entry).await;

        Ok(updated)
    }

    /// Sweeps PENDING requests past their deadline. Returns how many moved
    /// to EXPIRED; a failure on one request does not stop the batch.
    pub async fn expire_requests(&self) -> Result<usize, DomainError> {
        let now = Utc::now();
        let candidates = self.requests.find_expired(now).await?;
        let mut expired = 0usize;

        for request in candidates {
            let mut next = request.clone();
            if let Err(e) = next.expire(now) {
                debug!(request_id = %request.id, error = %e, "Skipping request");
                continue;
            }

            match self.requests.update_if_status(&next, RequestStatus::Pending).await {
                Ok(Some(updated)) => {
                    expired += 1;
                    let entry = NewAuditEntry::new(
                        AuditAction::AppointmentRequestExpired,
                        format!("Appointment request expired: {}", updated.title),
                    )
                    .actor(&ActorContext::system())
                    .resource(RESOURCE_REQUEST, updated.id, Some(updated.title.clone()));
                    self.audit.log(entry).await;
                }
                Ok(None) => {
                    debug!(request_id = %request.id, "Request left PENDING before expiry");
                }
                Err(e) => {
                    error!(request_id = %request.id, error = %e, "Failed to expire request");
                }
            }
        }

        info!(count = expired, "Expired appointment requests");
        Ok(expired)
    }

    /// Turns an ACCEPTED request into a booked appointment on one of the
    /// accepting tenant's calendars.
    pub async fn convert_to_appointment(
        &self,
        request_id: Uuid,
        conversion: RequestConversion,
        actor: &ActorContext,
    ) -> Result<ConversionOutcome, DomainError> {
        info!(request_id = %request_id, calendar_id = %conversion.calendar_id, "Converting request");

        conversion.validate()?;

        // 1. Request must be ACCEPTED with a tenant
        let request = self.find_by_id(request_id).await?;
        let tenant_id = request.ensure_convertible().inspect_err(|e| {
            warn!(request_id = %request_id, error = %e, "Conversion rejected");
        })?;

        // 2. Calendar exists and belongs to the accepting tenant
        let calendar = self
            .calendars
            .find_by_id(conversion.calendar_id)
            .await?
            .ok_or(DomainError::CalendarNotFound(conversion.calendar_id))?;
        if !calendar.belongs_to(tenant_id) {
            warn!(calendar_id = %calendar.id, tenant_id = %tenant_id, "Calendar does not belong to accepted tenant");
            return Err(DomainError::CalendarTenantMismatch {
                calendar_id: calendar.id,
                tenant_id,
            });
        }

        // 3. Interval and availability
        validate_time_range(conversion.start_time, conversion.end_time)?;
        self.conflicts
            .ensure_available(calendar.id, conversion.start_time, conversion.end_time, None)
            .await?;

        // 4. Create the appointment
        let now = Utc::now();
        let appointment = Appointment::from_new(
            NewAppointment {
                title: request.title.clone(),
                description: request.description.clone(),
                start_time: conversion.start_time,
                end_time: conversion.end_time,
                status: Some(AppointmentStatus::Pending),
                deposit: Some(0.0),
                total_price: Some(conversion.total_price.unwrap_or(request.budget)),
                notes: conversion.notes.clone(),
                design_images: request.design_images.clone(),
                tenant_id,
                calendar_id: calendar.id,
                client_id: request.client_id,
                source_request_id: Some(request.id),
            },
            now,
        )?;
        let appointment = self.appointments.create(&appointment).await?;

        // 5. Close the request (CAS on ACCEPTED); undo the booking if we lost
        let mut next = request.clone();
        next.complete(appointment.id, now)?;
        let updated = match self.requests.update_if_status(&next, RequestStatus::Accepted).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard_appointment(appointment.id).await;
                let current = self.find_by_id(request_id).await?;
                warn!(request_id = %request_id, status = %current.status, "Request changed during conversion");
                return Err(DomainError::ConversionConflict(current.status));
            }
            Err(e) => {
                self.discard_appointment(appointment.id).await;
                return Err(e);
            }
        };

        // 6. Fan out, mail, audit
        self.notifier.emit_created(&appointment);
        self.notify_client_of_appointment(&updated, &appointment).await;

        let entry = NewAuditEntry::new(
            AuditAction::AppointmentCreatedFromRequest,
            format!("Appointment created from request: {}", request.title),
        )
        .actor(actor)
        .resource(RESOURCE_APPOINTMENT, appointment.id, Some(appointment.title.clone()))
        .tenant(tenant_id)
        .metadata(serde_json::json!({
            "from_request_id": request.id,
            "calendar_id": calendar.id,
        }));
        self.audit.log(entry).await;

        info!(request_id = %request_id, appointment_id = %appointment.id, "Request converted");
        Ok(ConversionOutcome {
            request: updated,
            appointment,
        })
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn ensure_member(&self, tenant: &Tenant, actor: &ActorContext) -> Result<(), DomainError> {
        let actor_id = actor.actor_id.ok_or(DomainError::ActorNotInTenant(tenant.id))?;
        if tenant.is_owned_by(actor_id) || self.tenants.is_member(tenant.id, actor_id).await? {
            return Ok(());
        }
        warn!(tenant_id = %tenant.id, actor_id = %actor_id, "Actor does not belong to tenant");
        Err(DomainError::ActorNotInTenant(tenant.id))
    }

    async fn discard_appointment(&self, appointment_id: Uuid) {
        if let Err(e) = self.appointments.delete(appointment_id).await {
            error!(appointment_id = %appointment_id, error = %e, "Failed to discard appointment after lost conversion");
        }
    }

    async fn send_quietly(&self, message: MailMessage) -> bool {
        let to = inkbook_shared::utils::mask_email(&message.to);
        match self.mailer.send_mail(message).await {
            Ok(_) => true,
            Err(e) => {
                error!(to = %to, error = %e, "Failed to send mail");
                false
            }
        }
    }

    async fn notify_tenants_of_new_request(&self, request: &AppointmentRequest, client_name: &str) {
        let contacts = match self.tenants.find_all_contacts().await {
            Ok(contacts) => contacts,
            Err(e) => {
                error!(error = %e, "Failed to load tenants for new request broadcast");
                return;
            }
        };

        let mut sent = 0usize;
        for contact in &contacts {
            if contact.owner_email.is_empty() {
                continue;
            }
            let message = MailMessage::template(
                contact.owner_email.clone(),
                format!("New appointment request: {}", request.title),
                MailTemplate::NewAppointmentRequest,
                serde_json::json!({
                    "tenant_name": contact.tenant_name,
                    "client_name": client_name,
                    "request_title": request.title,
                    "budget": request.budget,
                    "design_images_count": request.design_images.len(),
                }),
            );
            if self.send_quietly(message).await {
                sent += 1;
            }
        }

        info!(request_id = %request.id, tenants = contacts.len(), sent, "Notified tenants about new request");
    }

    async fn notify_client_of_acceptance(&self, request: &AppointmentRequest, tenant: &Tenant) {
        let client = match self.users.find_by_id(request.client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, "Failed to load client for acceptance notice");
                return;
            }
        };

        let message = MailMessage::template(
            client.email.clone(),
            "Your appointment request has been accepted",
            MailTemplate::AppointmentRequestAccepted,
            serde_json::json!({
                "client_name": client.name,
                "request_title": request.title,
                "tenant_name": tenant.name,
                "tenant_email": tenant.email,
                "tenant_phone": tenant.phone,
            }),
        );
        self.send_quietly(message).await;
    }

    async fn notify_client_of_appointment(&self, request: &AppointmentRequest, appointment: &Appointment) {
        let client = match self.users.find_by_id(request.client_id).await {
            Ok(Some(client)) => client,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, "Failed to load client for scheduling notice");
                return;
            }
        };
        let tenant_name = match self.tenants.find_by_id(appointment.tenant_id).await {
            Ok(tenant) => tenant.map(|t| t.name),
            Err(e) => {
                warn!(error = %e, "Failed to load tenant for scheduling notice");
                None
            }
        };

        let message = MailMessage::template(
            client.email.clone(),
            "Your appointment has been scheduled",
            MailTemplate::AppointmentScheduled,
            serde_json::json!({
                "client_name": client.name,
                "appointment_title": appointment.title,
                "start_time": appointment.start_time.to_rfc3339(),
                "end_time": appointment.end_time.to_rfc3339(),
                "tenant_name": tenant_name,
            }),
        );
        self.send_quietly(message).await;
    }
}
