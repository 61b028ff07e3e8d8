//! Shared application state

use std::sync::Arc;

use axum::extract::FromRef;

use inkbook_core::ports::Mailer;
use inkbook_core::repositories::{
    AppointmentRepository, AppointmentRequestRepository, AuditRepository, CalendarRepository, TenantRepository,
    UserRepository,
};
use inkbook_core::services::{
    AppointmentRequestService, AppointmentService, AuditRecorder, AuthService, RequestServiceDeps, TenantService,
    UserService,
};
use inkbook_security::JwtService;
use inkbook_shared::config::{BookingSettings, RealtimeSettings};

use crate::realtime::{RealtimeNotifier, RoomRegistry};

/// Storage and transport adapters the services are built on
#[derive(Clone)]
pub struct Adapters {
    pub users: Arc<dyn UserRepository>,
    pub tenants: Arc<dyn TenantRepository>,
    pub calendars: Arc<dyn CalendarRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub requests: Arc<dyn AppointmentRequestRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct AppState {
    pub appointments: Arc<AppointmentService>,
    pub requests: Arc<AppointmentRequestService>,
    pub audit: Arc<AuditRecorder>,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub tenants: Arc<TenantService>,
    pub jwt: Arc<JwtService>,
    pub rooms: Arc<RoomRegistry>,
    pub upcoming_default_limit: u32,
}

impl AppState {
    pub fn build(
        adapters: Adapters,
        jwt: Arc<JwtService>,
        booking: &BookingSettings,
        realtime: &RealtimeSettings,
    ) -> Self {
        let rooms = Arc::new(RoomRegistry::new(realtime.queue_capacity));
        let notifier = Arc::new(RealtimeNotifier::new(rooms.clone()));
        let audit = Arc::new(AuditRecorder::new(adapters.audit.clone()));

        let appointments = Arc::new(AppointmentService::new(
            adapters.appointments.clone(),
            adapters.tenants.clone(),
            adapters.calendars.clone(),
            adapters.users.clone(),
            notifier.clone(),
            audit.clone(),
        ));

        let tenants = Arc::new(TenantService::new(
            adapters.tenants.clone(),
            adapters.calendars.clone(),
            adapters.users.clone(),
            audit.clone(),
        ));

        let requests = Arc::new(AppointmentRequestService::new(
            RequestServiceDeps {
                requests: adapters.requests,
                appointments: adapters.appointments,
                tenants: adapters.tenants,
                calendars: adapters.calendars,
                users: adapters.users.clone(),
                mailer: adapters.mailer,
                notifier,
                audit: audit.clone(),
            },
            booking.request_ttl_days,
        ));

        let users = Arc::new(UserService::new(adapters.users.clone(), audit.clone()));
        let auth = Arc::new(AuthService::new(adapters.users, jwt.clone(), audit.clone()));

        Self {
            appointments,
            requests,
            audit,
            auth,
            users,
            tenants,
            jwt,
            rooms,
            upcoming_default_limit: booking.upcoming_default_limit,
        }
    }
}

impl FromRef<AppState> for Arc<RoomRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.rooms.clone()
    }
}

impl FromRef<AppState> for Arc<JwtService> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
