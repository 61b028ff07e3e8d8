// ============================================================================
// InkBook Core - Appointment Service
// File: crates/inkbook-core/src/services/appointment_service.rs
// ============================================================================
//! Booking CRUD around the conflict checker.
//!
//! Every mutation runs read -> validate -> conflict check -> persist ->
//! notify -> audit. Notification and audit never fail the operation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use inkbook_shared::{Paginated, Pagination};

use crate::domain::{
    ActorContext, Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, AuditAction,
    EventChanges, NewAppointment, NewAuditEntry,
};
use crate::error::DomainError;
use crate::ports::EventNotifier;
use crate::repositories::{AppointmentRepository, CalendarRepository, TenantRepository, UserRepository};
use crate::services::{AuditRecorder, ConflictChecker};

pub(crate) const RESOURCE_APPOINTMENT: &str = "APPOINTMENT";

pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository>,
    tenants: Arc<dyn TenantRepository>,
    calendars: Arc<dyn CalendarRepository>,
    users: Arc<dyn UserRepository>,
    conflicts: ConflictChecker,
    notifier: Arc<dyn EventNotifier>,
    audit: Arc<AuditRecorder>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        tenants: Arc<dyn TenantRepository>,
        calendars: Arc<dyn CalendarRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn EventNotifier>,
        audit: Arc<AuditRecorder>,
    ) -> Self {
        Self {
            conflicts: ConflictChecker::new(appointments.clone()),
            appointments,
            tenants,
            calendars,
            users,
            notifier,
            audit,
        }
    }

    /// Book a new appointment
    pub async fn create(&self, payload: NewAppointment, actor: &ActorContext) -> Result<Appointment, DomainError> {
        info!(
            tenant_id = %payload.tenant_id,
            calendar_id = %payload.calendar_id,
            "Creating appointment"
        );

        // 1. Payload shape: start < end, lengths, non-negative prices
        payload.check()?;

        // 2. Tenant exists
        let tenant = self
            .tenants
            .find_by_id(payload.tenant_id)
            .await?
            .ok_or(DomainError::TenantNotFound(payload.tenant_id))?;

        // 3. Calendar exists and belongs to the tenant
        let calendar = self
            .calendars
            .find_by_id(payload.calendar_id)
            .await?
            .ok_or(DomainError::CalendarNotFound(payload.calendar_id))?;

        if !calendar.belongs_to(tenant.id) {
            warn!(calendar_id = %calendar.id, tenant_id = %tenant.id, "Calendar belongs to another tenant");
            return Err(DomainError::CalendarTenantMismatch {
                calendar_id: calendar.id,
                tenant_id: tenant.id,
            });
        }

        // 4. Client exists and has the client role
        let client = self
            .users
            .find_by_id(payload.client_id)
            .await?
            .ok_or(DomainError::ClientNotFound(payload.client_id))?;

        if !client.is_client() {
            warn!(user_id = %client.id, "Appointment client is not a CLIENT user");
            return Err(DomainError::NotAClient);
        }

        // 5. Slot must be free
        self.conflicts
            .ensure_available(calendar.id, payload.start_time, payload.end_time, None)
            .await?;

        // 6. Persist
        let appointment = Appointment::from_new(payload, Utc::now())?;
        let appointment = self.appointments.create(&appointment).await?;

        // 7. Fan out
        self.notifier.emit_created(&appointment);

        // 8. Audit
        let mut entry = NewAuditEntry::new(
            AuditAction::AppointmentCreated,
            format!("Appointment created: {}", appointment.title),
        )
        .actor(actor)
        .resource(RESOURCE_APPOINTMENT, appointment.id, Some(appointment.title.clone()))
        .tenant(appointment.tenant_id)
        .metadata(serde_json::json!({
            "calendar_id": appointment.calendar_id,
            "client_id": appointment.client_id,
            "start_time": appointment.start_time,
            "end_time": appointment.end_time,
        }));
        entry.tenant_name = Some(tenant.name);
        self.audit.log(entry).await;

        info!(appointment_id = %appointment.id, "Appointment created");
        Ok(appointment)
    }

    pub async fn find_all(
        &self,
        filter: &AppointmentFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Appointment>, DomainError> {
        let data = self.appointments.find_all(filter, pagination).await?;
        let total = self.appointments.count(filter).await?;
        Ok(Paginated::new(data, total, pagination))
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Appointment, DomainError> {
        self.appointments
            .find_by_id(id)
            .await?
            .ok_or(DomainError::AppointmentNotFound(id))
    }

    /// Partial update, reschedule or status change
    pub async fn update(
        &self,
        id: Uuid,
        changes: AppointmentChanges,
        actor: &ActorContext,
    ) -> Result<Appointment, DomainError> {
        info!(appointment_id = %id, "Updating appointment");

        // 1. Load current state
        let existing = self.find_one(id).await?;

        // 2. Apply in memory; validates the resulting interval
        let mut updated = existing.clone();
        updated.apply(&changes, Utc::now())?;

        // 3. Conflict check when the interval moved or a cancelled slot is reclaimed
        let rescheduled = updated.start_time != existing.start_time || updated.end_time != existing.end_time;
        let reclaims = !existing.status.blocks_calendar();
        if (rescheduled || reclaims) && updated.status.blocks_calendar() {
            self.conflicts
                .ensure_available(updated.calendar_id, updated.start_time, updated.end_time, Some(id))
                .await?;
        }

        // 4. Persist
        let updated = self.appointments.update(&updated).await?;

        // 5. Classify the change for events and audit
        let status_changed = changes.status.is_some() && existing.status != updated.status;
        let (action, verb) = if status_changed {
            self.notifier.emit_status_changed(&updated, existing.status);
            match updated.status {
                AppointmentStatus::Cancelled => (AuditAction::AppointmentCancelled, "cancelled"),
                AppointmentStatus::Confirmed => (AuditAction::AppointmentConfirmed, "confirmed"),
                AppointmentStatus::Completed => (AuditAction::AppointmentCompleted, "completed"),
                AppointmentStatus::Pending => (AuditAction::AppointmentUpdated, "updated"),
            }
        } else if rescheduled {
            self.notifier
                .emit_rescheduled(&updated, existing.start_time, existing.end_time);
            (AuditAction::AppointmentRescheduled, "rescheduled")
        } else {
            let diff = EventChanges {
                field: None,
                old_value: serde_json::to_value(&existing).unwrap_or_default(),
                new_value: serde_json::to_value(&changes).unwrap_or_default(),
            };
            self.notifier.emit_updated(&updated, Some(diff));
            (AuditAction::AppointmentUpdated, "updated")
        };

        // 6. Audit with before/after
        let entry = NewAuditEntry::new(action, format!("Appointment {}: {}", verb, updated.title))
            .actor(actor)
            .resource(RESOURCE_APPOINTMENT, updated.id, Some(updated.title.clone()))
            .tenant(updated.tenant_id)
            .values(serde_json::to_value(&existing).ok(), serde_json::to_value(&changes).ok());
        self.audit.log(entry).await;

        info!(appointment_id = %id, action = %action, "Appointment updated");
        Ok(updated)
    }

    /// Hard delete
    pub async fn remove(&self, id: Uuid, actor: &ActorContext) -> Result<(), DomainError> {
        info!(appointment_id = %id, "Deleting appointment");

        let appointment = self.find_one(id).await?;
        self.appointments.delete(id).await?;

        self.notifier.emit_deleted(&appointment);

        let entry = NewAuditEntry::new(
            AuditAction::AppointmentDeleted,
            format!("Appointment deleted: {}", appointment.title),
        )
        .actor(actor)
        .resource(RESOURCE_APPOINTMENT, appointment.id, Some(appointment.title.clone()))
        .tenant(appointment.tenant_id)
        .metadata(serde_json::json!({ "deleted_appointment": appointment }));
        self.audit.log(entry).await;

        Ok(())
    }

    pub async fn find_by_calendar(
        &self,
        calendar_id: Uuid,
        start: Option<chrono::DateTime<Utc>>,
        end: Option<chrono::DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, DomainError> {
        self.appointments.find_by_calendar(calendar_id, start, end).await
    }

    pub async fn find_upcoming(&self, tenant_id: Uuid, limit: u32) -> Result<Vec<Appointment>, DomainError> {
        self.appointments.find_upcoming(tenant_id, Utc::now(), limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Calendar, Tenant, User, UserType};
    use crate::ports::MockEventNotifier;
    use crate::repositories::{
        MockAppointmentRepository, MockAuditRepository, MockCalendarRepository, MockTenantRepository,
        MockUserRepository,
    };
    use chrono::{Duration, TimeZone};

    struct Fixture {
        tenant: Tenant,
        calendar: Calendar,
        client: User,
    }

    fn fixture() -> Fixture {
        let owner = Uuid::new_v4();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: "Black Lotus Studio".to_string(),
            description: None,
            address: None,
            phone: None,
            email: Some("studio@lotus.ink".to_string()),
            owner_id: owner,
            created_at: Utc::now(),
        };
        let calendar = Calendar {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            name: "Main chair".to_string(),
            description: None,
            color: None,
            created_at: Utc::now(),
        };
        let client = User::new("client@ink.test".into(), "Client".into(), UserType::Client, "h".into()).unwrap();
        Fixture { tenant, calendar, client }
    }

    fn payload(fx: &Fixture, start_hour: u32, end_hour: u32) -> NewAppointment {
        let day = Utc.with_ymd_and_hms(2031, 6, 1, 0, 0, 0).unwrap();
        NewAppointment {
            title: "Session".to_string(),
            description: None,
            start_time: day + Duration::hours(start_hour as i64),
            end_time: day + Duration::hours(end_hour as i64),
            status: None,
            deposit: None,
            total_price: Some(300.0),
            notes: None,
            design_images: vec![],
            tenant_id: fx.tenant.id,
            calendar_id: fx.calendar.id,
            client_id: fx.client.id,
            source_request_id: None,
        }
    }

    fn lookups(fx: &Fixture) -> (MockTenantRepository, MockCalendarRepository, MockUserRepository) {
        let mut tenants = MockTenantRepository::new();
        let tenant = fx.tenant.clone();
        tenants.expect_find_by_id().returning(move |_| Ok(Some(tenant.clone())));

        let mut calendars = MockCalendarRepository::new();
        let calendar = fx.calendar.clone();
        calendars.expect_find_by_id().returning(move |_| Ok(Some(calendar.clone())));

        let mut users = MockUserRepository::new();
        let client = fx.client.clone();
        users.expect_find_by_id().returning(move |_| Ok(Some(client.clone())));

        (tenants, calendars, users)
    }

    fn service(
        appointments: MockAppointmentRepository,
        lookups: (MockTenantRepository, MockCalendarRepository, MockUserRepository),
        notifier: MockEventNotifier,
        audit: MockAuditRepository,
    ) -> AppointmentService {
        AppointmentService::new(
            Arc::new(appointments),
            Arc::new(lookups.0),
            Arc::new(lookups.1),
            Arc::new(lookups.2),
            Arc::new(notifier),
            Arc::new(AuditRecorder::new(Arc::new(audit))),
        )
    }

    #[tokio::test]
    async fn test_create_persists_notifies_and_audits() {
        let fx = fixture();
        let mut appointments = MockAppointmentRepository::new();
        appointments.expect_find_conflicting().returning(|_, _, _, _| Ok(vec![]));
        appointments.expect_create().times(1).returning(|a| Ok(a.clone()));

        let mut notifier = MockEventNotifier::new();
        notifier.expect_emit_created().times(1).return_const(());

        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| e.action == AuditAction::AppointmentCreated && e.tenant_name.is_some())
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = service(appointments, lookups(&fx), notifier, audit);
        let created = svc.create(payload(&fx, 10, 11), &ActorContext::system()).await.unwrap();
        assert_eq!(created.status, AppointmentStatus::Pending);
        assert_eq!(created.calendar_id, fx.calendar.id);
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_interval_before_lookups() {
        let fx = fixture();
        let svc = service(
            MockAppointmentRepository::new(),
            (MockTenantRepository::new(), MockCalendarRepository::new(), MockUserRepository::new()),
            MockEventNotifier::new(),
            MockAuditRepository::new(),
        );
        let result = svc.create(payload(&fx, 11, 10), &ActorContext::system()).await;
        assert!(matches!(result, Err(DomainError::InvalidTimeRange)));
    }

    #[tokio::test]
    async fn test_create_conflict_writes_nothing() {
        let fx = fixture();
        let mut appointments = MockAppointmentRepository::new();
        let blocking = Appointment::from_new(payload(&fx, 10, 11), Utc::now()).unwrap();
        appointments
            .expect_find_conflicting()
            .returning(move |_, _, _, _| Ok(vec![blocking.clone()]));
        appointments.expect_create().never();

        let svc = service(appointments, lookups(&fx), MockEventNotifier::new(), MockAuditRepository::new());
        let result = svc.create(payload(&fx, 10, 12), &ActorContext::system()).await;
        assert!(matches!(result, Err(DomainError::TimeConflict)));
    }

    #[tokio::test]
    async fn test_create_calendar_of_other_tenant() {
        let mut fx = fixture();
        fx.calendar.tenant_id = Uuid::new_v4();
        let svc = service(
            MockAppointmentRepository::new(),
            lookups(&fx),
            MockEventNotifier::new(),
            MockAuditRepository::new(),
        );
        let result = svc.create(payload(&fx, 10, 11), &ActorContext::system()).await;
        assert!(matches!(result, Err(DomainError::CalendarTenantMismatch { .. })));
    }

    #[tokio::test]
    async fn test_create_requires_client_role() {
        let mut fx = fixture();
        fx.client.user_type = UserType::Artist;
        let svc = service(
            MockAppointmentRepository::new(),
            lookups(&fx),
            MockEventNotifier::new(),
            MockAuditRepository::new(),
        );
        let result = svc.create(payload(&fx, 10, 11), &ActorContext::system()).await;
        assert!(matches!(result, Err(DomainError::NotAClient)));
    }

    #[tokio::test]
    async fn test_create_survives_audit_failure() {
        let fx = fixture();
        let mut appointments = MockAppointmentRepository::new();
        appointments.expect_find_conflicting().returning(|_, _, _, _| Ok(vec![]));
        appointments.expect_create().returning(|a| Ok(a.clone()));

        let mut notifier = MockEventNotifier::new();
        notifier.expect_emit_created().return_const(());

        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .returning(|_| Err(DomainError::DatabaseError("audit table locked".into())));

        let svc = service(appointments, lookups(&fx), notifier, audit);
        assert!(svc.create(payload(&fx, 10, 11), &ActorContext::system()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_status_change_emits_status_event() {
        let fx = fixture();
        let existing = Appointment::from_new(payload(&fx, 10, 11), Utc::now()).unwrap();
        let id = existing.id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        appointments.expect_find_conflicting().never();
        appointments.expect_update().returning(|a| Ok(a.clone()));

        let mut notifier = MockEventNotifier::new();
        notifier
            .expect_emit_status_changed()
            .withf(|a, old| a.status == AppointmentStatus::Confirmed && *old == AppointmentStatus::Pending)
            .times(1)
            .return_const(());

        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| e.action == AuditAction::AppointmentConfirmed && e.old_values.is_some())
            .times(1)
            .returning(|e| Ok(e.clone()));

        let svc = service(
            appointments,
            (MockTenantRepository::new(), MockCalendarRepository::new(), MockUserRepository::new()),
            notifier,
            audit,
        );
        let changes = AppointmentChanges {
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        };
        let updated = svc.update(id, changes, &ActorContext::system()).await.unwrap();
        assert_eq!(updated.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_update_reschedule_excludes_self() {
        let fx = fixture();
        let existing = Appointment::from_new(payload(&fx, 10, 11), Utc::now()).unwrap();
        let id = existing.id;

        let mut appointments = MockAppointmentRepository::new();
        appointments
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        appointments
            .expect_find_conflicting()
            .withf(move |_, _, _, exclude| *exclude == Some(id))
            .times(1)
            .returning(|_, _, _, _| Ok(vec![]));
        appointments.expect_update().returning(|a| Ok(a.clone()));

        let mut notifier = MockEventNotifier::new();
        notifier.expect_emit_rescheduled().times(1).return_const(());

        let mut audit = MockAuditRepository::new();
        audit
            .expect_append()
            .withf(|e| e.action == AuditAction::AppointmentRescheduled)
            .returning(|e| Ok(e.clone()));

        let svc = service(
            appointments,
            (MockTenantRepository::new(), MockCalendarRepository::new(), MockUserRepository::new()),
            notifier,
            audit,
        );
        let day = Utc.with_ymd_and_hms(2031, 6, 1, 0, 0, 0).unwrap();
        let changes = AppointmentChanges {
            start_time: Some(day + Duration::minutes(10 * 60 + 30)),
            end_time: Some(day + Duration::minutes(11 * 60 + 30)),
            ..Default::default()
        };
        assert!(svc.update(id, changes, &ActorContext::system()).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_missing_appointment() {
        let mut appointments = MockAppointmentRepository::new();
        appointments.expect_find_by_id().returning(|_| Ok(None));
        appointments.expect_delete().never();

        let svc = service(
            appointments,
            (MockTenantRepository::new(), MockCalendarRepository::new(), MockUserRepository::new()),
            MockEventNotifier::new(),
            MockAuditRepository::new(),
        );
        let result = svc.remove(Uuid::new_v4(), &ActorContext::system()).await;
        assert!(matches!(result, Err(DomainError::AppointmentNotFound(_))));
    }
}
