//! In-memory adapters
//!
//! `MemoryStore` implements every repository trait over one shared state.
//! Used for local runs (`database.driver = "memory"`) and scenario tests.

mod repositories;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use inkbook_core::domain::{Appointment, AppointmentRequest, AuditEntry, Calendar, Tenant, User};

#[derive(Debug, Default)]
pub(crate) struct State {
    pub users: HashMap<Uuid, User>,
    pub tenants: HashMap<Uuid, Tenant>,
    pub members: HashSet<(Uuid, Uuid)>,
    pub calendars: HashMap<Uuid, Calendar>,
    pub appointments: HashMap<Uuid, Appointment>,
    pub requests: HashMap<Uuid, AppointmentRequest>,
    /// Insertion order is chronological order.
    pub audit: Vec<AuditEntry>,
}

/// Thread-safe in-memory store. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("Initializing in-memory store");
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.state.write().users.insert(user.id, user);
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.state.write().tenants.insert(tenant.id, tenant);
    }

    pub fn add_member(&self, tenant_id: Uuid, user_id: Uuid) {
        self.state.write().members.insert((tenant_id, user_id));
    }

    pub fn insert_calendar(&self, calendar: Calendar) {
        self.state.write().calendars.insert(calendar.id, calendar);
    }

    /// Number of audit entries recorded so far
    pub fn audit_len(&self) -> usize {
        self.state.read().audit.len()
    }

    pub(crate) fn read(&self) -> parking_lot::RwLockReadGuard<'_, State> {
        self.state.read()
    }

    pub(crate) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, State> {
        self.state.write()
    }
}
