// ============================================================================
// InkBook Infrastructure - In-Memory Repositories
// File: crates/inkbook-infrastructure/src/memory/repositories.rs
// ============================================================================
//! Every check-then-write runs under a single write guard, so concurrent
//! bookings and request transitions serialize the same way the database
//! constraints make them serialize.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use inkbook_core::domain::{
    Appointment, AppointmentFilter, AppointmentRequest, AppointmentStatus, AuditEntry, AuditQuery,
    Calendar, RequestFilter, RequestStatus, Tenant, TenantContact, User, UserFilter,
};
use inkbook_core::error::DomainError;
use inkbook_core::repositories::{
    AppointmentRepository, AppointmentRequestRepository, AuditRepository, CalendarRepository,
    TenantRepository, UserRepository,
};
use inkbook_core::services::intervals_overlap;
use inkbook_shared::{Paginated, Pagination};

use super::{MemoryStore, State};

fn has_conflict(state: &State, candidate: &Appointment) -> bool {
    state.appointments.values().any(|existing| existing.conflicts_with(candidate))
}

/// Offsets past `usize::MAX` simply yield an empty page.
fn skip_count(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}

fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

// ============================================================================
// Appointments
// ============================================================================

#[async_trait]
impl AppointmentRepository for MemoryStore {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, DomainError> {
        let mut state = self.write();
        if appointment.status.blocks_calendar() && has_conflict(&state, appointment) {
            warn!("Rejected overlapping appointment on calendar {}", appointment.calendar_id);
            return Err(DomainError::TimeConflict);
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>, DomainError> {
        Ok(self.read().appointments.get(&id).cloned())
    }

    async fn find_all(
        &self,
        filter: &AppointmentFilter,
        pagination: Pagination,
    ) -> Result<Vec<Appointment>, DomainError> {
        let state = self.read();
        let mut items: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        items.sort_by_key(|a| a.start_time);

        Ok(items
            .into_iter()
            .skip(skip_count(pagination.offset()))
            .take(pagination.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &AppointmentFilter) -> Result<u64, DomainError> {
        let state = self.read();
        Ok(state.appointments.values().filter(|a| filter.matches(a)).count() as u64)
    }

    async fn find_by_calendar(
        &self,
        calendar_id: Uuid,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Appointment>, DomainError> {
        let state = self.read();
        let mut items: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.calendar_id == calendar_id)
            .filter(|a| start.is_none_or(|s| a.start_time >= s))
            .filter(|a| end.is_none_or(|e| a.end_time <= e))
            .cloned()
            .collect();
        items.sort_by_key(|a| a.start_time);
        Ok(items)
    }

    async fn find_upcoming(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Appointment>, DomainError> {
        let state = self.read();
        let mut items: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.tenant_id == tenant_id && a.is_upcoming(now))
            .cloned()
            .collect();
        items.sort_by_key(|a| a.start_time);
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn find_conflicting(
        &self,
        calendar_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, DomainError> {
        let state = self.read();
        Ok(state
            .appointments
            .values()
            .filter(|a| a.calendar_id == calendar_id)
            .filter(|a| a.status != AppointmentStatus::Cancelled)
            .filter(|a| exclude_id != Some(a.id))
            .filter(|a| intervals_overlap(a.start_time, a.end_time, start, end))
            .cloned()
            .collect())
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment, DomainError> {
        let mut state = self.write();
        if !state.appointments.contains_key(&appointment.id) {
            return Err(DomainError::AppointmentNotFound(appointment.id));
        }
        if appointment.status.blocks_calendar() && has_conflict(&state, appointment) {
            warn!("Rejected overlapping update of appointment {}", appointment.id);
            return Err(DomainError::TimeConflict);
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.write()
            .appointments
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::AppointmentNotFound(id))
    }
}

// ============================================================================
// Appointment requests
// ============================================================================

#[async_trait]
impl AppointmentRequestRepository for MemoryStore {
    async fn create(&self, request: &AppointmentRequest) -> Result<AppointmentRequest, DomainError> {
        self.write().requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AppointmentRequest>, DomainError> {
        Ok(self.read().requests.get(&id).cloned())
    }

    async fn find_all(
        &self,
        filter: &RequestFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AppointmentRequest>, DomainError> {
        let state = self.read();
        let mut items: Vec<AppointmentRequest> = state
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut items, |r| r.created_at);

        Ok(items
            .into_iter()
            .skip(skip_count(offset))
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &RequestFilter) -> Result<u64, DomainError> {
        let state = self.read();
        Ok(state.requests.values().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn find_by_client(&self, client_id: Uuid) -> Result<Vec<AppointmentRequest>, DomainError> {
        let state = self.read();
        let mut items: Vec<AppointmentRequest> = state
            .requests
            .values()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        newest_first(&mut items, |r| r.created_at);
        Ok(items)
    }

    async fn find_available(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentRequest>, DomainError> {
        let state = self.read();
        let mut items: Vec<AppointmentRequest> = state
            .requests
            .values()
            .filter(|r| r.can_be_accepted(now))
            .cloned()
            .collect();
        newest_first(&mut items, |r| r.created_at);
        Ok(items)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentRequest>, DomainError> {
        let state = self.read();
        let mut items: Vec<AppointmentRequest> = state
            .requests
            .values()
            .filter(|r| r.is_pending() && r.is_expired_at(now))
            .cloned()
            .collect();
        items.sort_by_key(|r| r.expires_at);
        Ok(items)
    }

    async fn update(&self, request: &AppointmentRequest) -> Result<AppointmentRequest, DomainError> {
        let mut state = self.write();
        match state.requests.get_mut(&request.id) {
            Some(stored) => {
                *stored = request.clone();
                Ok(request.clone())
            }
            None => Err(DomainError::RequestNotFound(request.id)),
        }
    }

    async fn update_if_status(
        &self,
        request: &AppointmentRequest,
        expected: RequestStatus,
    ) -> Result<Option<AppointmentRequest>, DomainError> {
        let mut state = self.write();
        let Some(stored) = state.requests.get_mut(&request.id) else {
            return Err(DomainError::RequestNotFound(request.id));
        };
        if stored.status != expected {
            debug!(
                "Request {} is {} rather than {}",
                request.id,
                stored.status.as_str(),
                expected.as_str()
            );
            return Ok(None);
        }
        stored.status = request.status;
        stored.accepted_by_tenant_id = request.accepted_by_tenant_id;
        stored.resulting_appointment_id = request.resulting_appointment_id;
        stored.updated_at = request.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.write()
            .requests
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::RequestNotFound(id))
    }
}

// ============================================================================
// Audit log
// ============================================================================

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditEntry, DomainError> {
        self.write().audit.push(entry.clone());
        Ok(entry.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuditEntry>, DomainError> {
        Ok(self.read().audit.iter().find(|e| e.id == id).cloned())
    }

    async fn find_by_resource(
        &self,
        resource_type: &str,
        resource_id: Uuid,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self
            .read()
            .audit
            .iter()
            .filter(|e| e.resource_type.as_deref() == Some(resource_type) && e.resource_id == Some(resource_id))
            .cloned()
            .collect())
    }

    async fn find_by_actor(&self, actor_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self
            .read()
            .audit
            .iter()
            .rev()
            .filter(|e| e.actor_id == Some(actor_id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_tenant(&self, tenant_id: Uuid, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self
            .read()
            .audit
            .iter()
            .rev()
            .filter(|e| e.tenant_id == Some(tenant_id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Paginated<AuditEntry>, DomainError> {
        let state = self.read();
        let matching: Vec<&AuditEntry> = state.audit.iter().rev().filter(|e| query.matches(e)).collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(skip_count(query.pagination.offset()))
            .take(query.pagination.limit as usize)
            .cloned()
            .collect();
        Ok(Paginated::new(page, total, query.pagination))
    }

    async fn find_security_events(&self, limit: u32) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self
            .read()
            .audit
            .iter()
            .rev()
            .filter(|e| e.is_security_event())
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Directory lookups
// ============================================================================

#[async_trait]
impl CalendarRepository for MemoryStore {
    async fn create(&self, calendar: &Calendar) -> Result<Calendar, DomainError> {
        let mut state = self.write();
        if !state.tenants.contains_key(&calendar.tenant_id) {
            return Err(DomainError::TenantNotFound(calendar.tenant_id));
        }
        state.calendars.insert(calendar.id, calendar.clone());
        Ok(calendar.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Calendar>, DomainError> {
        Ok(self.read().calendars.get(&id).cloned())
    }

    async fn find_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Calendar>, DomainError> {
        let state = self.read();
        let mut items: Vec<Calendar> = state
            .calendars
            .values()
            .filter(|c| c.belongs_to(tenant_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, DomainError> {
        let mut state = self.write();
        if !state.users.contains_key(&tenant.owner_id) {
            return Err(DomainError::UserNotFound);
        }
        state.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, DomainError> {
        Ok(self.read().tenants.get(&id).cloned())
    }

    async fn find_all(&self, pagination: Pagination) -> Result<Vec<Tenant>, DomainError> {
        let state = self.read();
        let mut items: Vec<Tenant> = state.tenants.values().cloned().collect();
        items.sort_by_key(|t| t.created_at);
        Ok(items
            .into_iter()
            .skip(skip_count(pagination.offset()))
            .take(pagination.limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.read().tenants.len() as u64)
    }

    async fn find_all_contacts(&self) -> Result<Vec<TenantContact>, DomainError> {
        let state = self.read();
        let mut tenants: Vec<&Tenant> = state.tenants.values().collect();
        tenants.sort_by_key(|t| t.created_at);

        Ok(tenants
            .into_iter()
            .filter_map(|t| {
                let owner = state.users.get(&t.owner_id)?;
                Some(TenantContact {
                    tenant_id: t.id,
                    tenant_name: t.name.clone(),
                    owner_email: owner.email.clone(),
                    owner_name: owner.name.clone(),
                })
            })
            .collect())
    }

    async fn is_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let state = self.read();
        let owner = state.tenants.get(&tenant_id).is_some_and(|t| t.is_owned_by(user_id));
        Ok(owner || state.members.contains(&(tenant_id, user_id)))
    }

    async fn add_member(&self, tenant_id: Uuid, user_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write();
        if !state.tenants.contains_key(&tenant_id) {
            return Err(DomainError::TenantNotFound(tenant_id));
        }
        if !state.users.contains_key(&user_id) {
            return Err(DomainError::UserNotFound);
        }
        state.members.insert((tenant_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim().to_lowercase();
        Ok(self.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        let mut state = self.write();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::EmailAlreadyExists(user.email.clone()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_all(&self, filter: &UserFilter, pagination: Pagination) -> Result<Vec<User>, DomainError> {
        let state = self.read();
        let mut items: Vec<User> = state.users.values().filter(|u| filter.matches(u)).cloned().collect();
        newest_first(&mut items, |u| u.created_at);
        Ok(items
            .into_iter()
            .skip(skip_count(pagination.offset()))
            .take(pagination.limit as usize)
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        Ok(self.read().users.values().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut state = self.write();
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user.clone())
            }
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.write();
        if !state.users.contains_key(&id) {
            return Err(DomainError::UserNotFound);
        }
        let referenced = state.tenants.values().any(|t| t.is_owned_by(id))
            || state.appointments.values().any(|a| a.client_id == id)
            || state.requests.values().any(|r| r.client_id == id);
        if referenced {
            warn!("Refused to delete user {} with studios or bookings", id);
            return Err(DomainError::UserInUse(id));
        }
        state.members.retain(|(_, member)| *member != id);
        state.users.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn appointment(calendar_id: Uuid, start_hour: i64, end_hour: i64) -> Appointment {
        let base = Utc::now() + Duration::days(3);
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            title: "Session".to_string(),
            description: None,
            start_time: base + Duration::hours(start_hour),
            end_time: base + Duration::hours(end_hour),
            status: AppointmentStatus::Pending,
            deposit: None,
            total_price: None,
            notes: None,
            design_images: vec![],
            tenant_id: Uuid::new_v4(),
            calendar_id,
            client_id: Uuid::new_v4(),
            source_request_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_overlap_but_allows_touching() {
        let store = MemoryStore::new();
        let calendar = Uuid::new_v4();

        AppointmentRepository::create(&store, &appointment(calendar, 10, 12)).await.unwrap();

        let overlapping = AppointmentRepository::create(&store, &appointment(calendar, 11, 13)).await;
        assert!(matches!(overlapping, Err(DomainError::TimeConflict)));

        AppointmentRepository::create(&store, &appointment(calendar, 12, 14)).await.unwrap();
        AppointmentRepository::create(&store, &appointment(Uuid::new_v4(), 11, 13)).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_appointments_release_the_slot() {
        let store = MemoryStore::new();
        let calendar = Uuid::new_v4();

        let mut first = appointment(calendar, 10, 12);
        AppointmentRepository::create(&store, &first).await.unwrap();
        first.status = AppointmentStatus::Cancelled;
        AppointmentRepository::update(&store, &first).await.unwrap();

        let hits = store
            .find_conflicting(calendar, first.start_time, first.end_time, None)
            .await
            .unwrap();
        assert!(hits.is_empty());
        AppointmentRepository::create(&store, &appointment(calendar, 10, 12)).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_creates_admit_one() {
        let store = Arc::new(MemoryStore::new());
        let calendar = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let candidate = appointment(calendar, 9, 11);
            handles.push(tokio::spawn(async move {
                AppointmentRepository::create(store.as_ref(), &candidate).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_update_if_status_is_compare_and_set() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut request = AppointmentRequest {
            id: Uuid::new_v4(),
            title: "Sleeve".to_string(),
            description: None,
            budget: 500.0,
            design_images: vec![],
            preferences: None,
            status: RequestStatus::Pending,
            expires_at: now + Duration::days(7),
            client_id: Uuid::new_v4(),
            accepted_by_tenant_id: None,
            resulting_appointment_id: None,
            created_at: now,
            updated_at: now,
        };
        AppointmentRequestRepository::create(&store, &request).await.unwrap();

        request.status = RequestStatus::Accepted;
        request.accepted_by_tenant_id = Some(Uuid::new_v4());
        let first = store.update_if_status(&request, RequestStatus::Pending).await.unwrap();
        assert!(first.is_some());

        request.accepted_by_tenant_id = Some(Uuid::new_v4());
        let second = store.update_if_status(&request, RequestStatus::Pending).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_audit_orderings() {
        use inkbook_core::domain::{AuditAction, NewAuditEntry};

        let store = MemoryStore::new();
        let resource = Uuid::new_v4();
        let first = AuditEntry::from_new(
            NewAuditEntry::new(AuditAction::AppointmentCreated, "created").resource("APPOINTMENT", resource, None),
            Utc::now(),
        );
        let second = AuditEntry::from_new(
            NewAuditEntry::new(AuditAction::AppointmentUpdated, "updated").resource("APPOINTMENT", resource, None),
            Utc::now(),
        );
        store.append(&first).await.unwrap();
        store.append(&second).await.unwrap();

        let trail = store.find_by_resource("APPOINTMENT", resource).await.unwrap();
        assert_eq!(trail[0].id, first.id);

        let page = store.query(&AuditQuery::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].id, second.id);
    }

    #[tokio::test]
    async fn test_delete_user_refused_while_owning_a_studio() {
        use inkbook_core::domain::{NewTenant, UserType};

        let store = MemoryStore::new();
        let owner = User::new("owner@ink.test".into(), "Owner".into(), UserType::Artist, "h".into()).unwrap();
        let staff = User::new("staff@ink.test".into(), "Staff".into(), UserType::Artist, "h".into()).unwrap();
        UserRepository::create(&store, &owner).await.unwrap();
        UserRepository::create(&store, &staff).await.unwrap();
        let tenant = Tenant::from_new(
            NewTenant {
                name: "Black Anchor".into(),
                description: None,
                address: None,
                phone: None,
                email: None,
            },
            owner.id,
            Utc::now(),
        )
        .unwrap();
        TenantRepository::create(&store, &tenant).await.unwrap();
        TenantRepository::add_member(&store, tenant.id, staff.id).await.unwrap();
        TenantRepository::add_member(&store, tenant.id, staff.id).await.unwrap();
        assert!(store.is_member(tenant.id, staff.id).await.unwrap());

        let refused = UserRepository::delete(&store, owner.id).await;
        assert!(matches!(refused, Err(DomainError::UserInUse(id)) if id == owner.id));

        UserRepository::delete(&store, staff.id).await.unwrap();
        assert!(!store.is_member(tenant.id, staff.id).await.unwrap());
        assert_eq!(UserRepository::count(&store, &UserFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_listing_skips_past_the_end() {
        use inkbook_core::domain::UserType;

        let store = MemoryStore::new();
        for i in 0..3 {
            let user = User::new(format!("u{i}@ink.test"), format!("U{i}"), UserType::Client, "h".into()).unwrap();
            UserRepository::create(&store, &user).await.unwrap();
        }
        let page = Pagination::new(Some(u32::MAX), Some(100), 10);
        let users = UserRepository::find_all(&store, &UserFilter::default(), page).await.unwrap();
        assert!(users.is_empty());
    }
}
