// ============================================================================
// InkBook Core - Tenant Service
// File: crates/inkbook-core/src/services/tenant_service.rs
// ============================================================================
//! Studio onboarding: tenants, their staff and their calendars.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use inkbook_shared::{Paginated, Pagination};

use crate::domain::{ActorContext, AuditAction, Calendar, NewAuditEntry, NewCalendar, NewTenant, Tenant, User};
use crate::error::DomainError;
use crate::repositories::{CalendarRepository, TenantRepository, UserRepository};
use crate::services::AuditRecorder;

const RESOURCE_TENANT: &str = "TENANT";
const RESOURCE_CALENDAR: &str = "CALENDAR";

pub struct TenantService {
    tenants: Arc<dyn TenantRepository>,
    calendars: Arc<dyn CalendarRepository>,
    users: Arc<dyn UserRepository>,
    audit: Arc<AuditRecorder>,
}

impl TenantService {
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        calendars: Arc<dyn CalendarRepository>,
        users: Arc<dyn UserRepository>,
        audit: Arc<AuditRecorder>,
    ) -> Self {
        Self {
            tenants,
            calendars,
            users,
            audit,
        }
    }

    /// Creates a studio owned by `owner_id`, who must be ARTIST or ADMIN.
    pub async fn create(&self, input: NewTenant, owner_id: Uuid, actor: &ActorContext) -> Result<Tenant, DomainError> {
        self.staff_user(owner_id).await?;
        let tenant = Tenant::from_new(input, owner_id, Utc::now())?;
        let tenant = self.tenants.create(&tenant).await?;

        let entry = NewAuditEntry::new(AuditAction::TenantCreated, format!("Tenant created: {}", tenant.name))
            .actor(actor)
            .resource(RESOURCE_TENANT, tenant.id, Some(tenant.name.clone()))
            .tenant(tenant.id)
            .metadata(serde_json::json!({ "owner_id": owner_id }));
        self.audit.log(entry).await;

        info!(tenant_id = %tenant.id, owner_id = %owner_id, "Tenant created");
        Ok(tenant)
    }

    pub async fn find_all(&self, pagination: Pagination) -> Result<Paginated<Tenant>, DomainError> {
        let data = self.tenants.find_all(pagination).await?;
        let total = self.tenants.count().await?;
        Ok(Paginated::new(data, total, pagination))
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Tenant, DomainError> {
        self.tenants.find_by_id(id).await?.ok_or(DomainError::TenantNotFound(id))
    }

    /// Adds a staff member. Only the owner may do this.
    pub async fn add_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        actor_id: Uuid,
        actor: &ActorContext,
    ) -> Result<(), DomainError> {
        let tenant = self.find_one(tenant_id).await?;
        if !tenant.is_owned_by(actor_id) {
            warn!(tenant_id = %tenant_id, actor_id = %actor_id, "Member add rejected: not the owner");
            return Err(DomainError::NotTenantOwner(tenant_id));
        }
        let member = self.staff_user(user_id).await?;
        self.tenants.add_member(tenant_id, user_id).await?;

        let entry = NewAuditEntry::new(
            AuditAction::TenantMemberAdded,
            format!("{} joined {}", member.name, tenant.name),
        )
        .actor(actor)
        .resource(RESOURCE_TENANT, tenant.id, Some(tenant.name.clone()))
        .tenant(tenant.id)
        .metadata(serde_json::json!({ "member_id": user_id }));
        self.audit.log(entry).await;

        info!(tenant_id = %tenant_id, user_id = %user_id, "Tenant member added");
        Ok(())
    }

    /// Owner or member of the tenant may add calendars.
    pub async fn create_calendar(
        &self,
        tenant_id: Uuid,
        input: NewCalendar,
        actor_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Calendar, DomainError> {
        let tenant = self.find_one(tenant_id).await?;
        if !self.tenants.is_member(tenant_id, actor_id).await? {
            return Err(DomainError::ActorNotInTenant(tenant_id));
        }
        let calendar = Calendar::from_new(input, tenant_id, Utc::now())?;
        let calendar = self.calendars.create(&calendar).await?;

        let entry = NewAuditEntry::new(AuditAction::CalendarCreated, format!("Calendar created: {}", calendar.name))
            .actor(actor)
            .resource(RESOURCE_CALENDAR, calendar.id, Some(calendar.name.clone()))
            .tenant(tenant.id);
        self.audit.log(entry).await;

        info!(tenant_id = %tenant_id, calendar_id = %calendar.id, "Calendar created");
        Ok(calendar)
    }

    pub async fn list_calendars(&self, tenant_id: Uuid) -> Result<Vec<Calendar>, DomainError> {
        self.find_one(tenant_id).await?;
        self.calendars.find_by_tenant(tenant_id).await
    }

    async fn staff_user(&self, id: Uuid) -> Result<User, DomainError> {
        let user = self.users.find_by_id(id).await?.ok_or(DomainError::UserNotFound)?;
        if !user.is_staff() {
            return Err(DomainError::NotStaff);
        }
        Ok(user)
    }
}
