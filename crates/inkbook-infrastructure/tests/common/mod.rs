//! Shared fixtures: a seeded memory store wired into the real services.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use inkbook_core::domain::{
    ActorContext, Appointment, AppointmentStatus, Calendar, EventChanges, MailMessage, MailReceipt,
    NewAppointment, NewAppointmentRequest, Tenant, User, UserType,
};
use inkbook_core::error::DomainError;
use inkbook_core::ports::{EventNotifier, Mailer};
use inkbook_core::services::{AppointmentRequestService, AppointmentService, AuditRecorder, RequestServiceDeps};
use inkbook_infrastructure::MemoryStore;

/// Captures emitted events as `(event name, appointment id)`
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(&'static str, Uuid)>>,
}

impl RecordingNotifier {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|(name, _)| *name).collect()
    }
}

impl EventNotifier for RecordingNotifier {
    fn emit_created(&self, appointment: &Appointment) {
        self.events.lock().push(("appointment:created", appointment.id));
    }

    fn emit_updated(&self, appointment: &Appointment, _changes: Option<EventChanges>) {
        self.events.lock().push(("appointment:updated", appointment.id));
    }

    fn emit_deleted(&self, appointment: &Appointment) {
        self.events.lock().push(("appointment:deleted", appointment.id));
    }

    fn emit_status_changed(&self, appointment: &Appointment, _old_status: AppointmentStatus) {
        self.events.lock().push(("appointment:status_changed", appointment.id));
    }

    fn emit_rescheduled(&self, appointment: &Appointment, _old_start: DateTime<Utc>, _old_end: DateTime<Utc>) {
        self.events.lock().push(("appointment:rescheduled", appointment.id));
    }
}

/// Captures outgoing mail; can be switched to fail every send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent_to(&self, address: &str) -> usize {
        self.sent.lock().iter().filter(|m| m.to == address).count()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_mail(&self, message: MailMessage) -> Result<MailReceipt, DomainError> {
        if self.fail {
            return Err(DomainError::NotificationError("smtp unavailable".into()));
        }
        self.sent.lock().push(message);
        Ok(MailReceipt {
            message_id: Some(Uuid::new_v4().to_string()),
            accepted_at: Utc::now(),
        })
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub mailer: Arc<RecordingMailer>,
    pub audit: Arc<AuditRecorder>,
    pub appointments: Arc<AppointmentService>,
    pub requests: Arc<AppointmentRequestService>,
    pub client: User,
    pub owner_a: User,
    pub owner_b: User,
    pub tenant_a: Tenant,
    pub tenant_b: Tenant,
    pub calendar_a: Calendar,
    pub calendar_b: Calendar,
    /// Anchor for scheduling, two days out on the hour
    pub base: DateTime<Utc>,
}

fn user(email: &str, name: &str, user_type: UserType) -> User {
    User::new(email.into(), name.into(), user_type, "not-a-real-hash".into()).unwrap()
}

fn tenant(name: &str, owner: &User) -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        name: name.into(),
        description: None,
        address: None,
        phone: Some("+1 555 0100".into()),
        email: Some(owner.email.clone()),
        owner_id: owner.id,
        created_at: Utc::now(),
    }
}

fn calendar(tenant: &Tenant, name: &str) -> Calendar {
    Calendar {
        id: Uuid::new_v4(),
        tenant_id: tenant.id,
        name: name.into(),
        description: None,
        color: None,
        created_at: Utc::now(),
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let mailer = Arc::new(mailer);
        let audit = Arc::new(AuditRecorder::new(store.clone()));

        let client = user("client@ink.test", "Sam Client", UserType::Client);
        let owner_a = user("owner.a@ink.test", "Alex Artist", UserType::Artist);
        let owner_b = user("owner.b@ink.test", "Blair Artist", UserType::Artist);
        let tenant_a = tenant("Black Anchor", &owner_a);
        let tenant_b = tenant("Red Lotus", &owner_b);
        let calendar_a = calendar(&tenant_a, "Main chair");
        let calendar_b = calendar(&tenant_b, "Main chair");

        for u in [&client, &owner_a, &owner_b] {
            store.insert_user(u.clone());
        }
        store.insert_tenant(tenant_a.clone());
        store.insert_tenant(tenant_b.clone());
        store.insert_calendar(calendar_a.clone());
        store.insert_calendar(calendar_b.clone());

        let appointments = Arc::new(AppointmentService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifier.clone(),
            audit.clone(),
        ));
        let requests = Arc::new(AppointmentRequestService::new(
            RequestServiceDeps {
                requests: store.clone(),
                appointments: store.clone(),
                tenants: store.clone(),
                calendars: store.clone(),
                users: store.clone(),
                mailer: mailer.clone(),
                notifier: notifier.clone(),
                audit: audit.clone(),
            },
            7,
        ));

        let base = (Utc::now() + Duration::days(2))
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        Self {
            store,
            notifier,
            mailer,
            audit,
            appointments,
            requests,
            client,
            owner_a,
            owner_b,
            tenant_a,
            tenant_b,
            calendar_a,
            calendar_b,
            base,
        }
    }

    pub fn at(&self, hour: i64, minute: i64) -> DateTime<Utc> {
        self.base + Duration::hours(hour) + Duration::minutes(minute)
    }

    pub fn actor_a(&self) -> ActorContext {
        ActorContext::user(self.owner_a.id).with_email(self.owner_a.email.clone())
    }

    pub fn actor_b(&self) -> ActorContext {
        ActorContext::user(self.owner_b.id).with_email(self.owner_b.email.clone())
    }

    pub fn client_actor(&self) -> ActorContext {
        ActorContext::user(self.client.id).with_email(self.client.email.clone())
    }

    pub fn booking(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> NewAppointment {
        NewAppointment {
            title: "Fine line session".into(),
            description: Some("Forearm piece".into()),
            start_time: start,
            end_time: end,
            status: None,
            deposit: Some(50.0),
            total_price: Some(300.0),
            notes: None,
            design_images: vec![],
            tenant_id: self.tenant_a.id,
            calendar_id: self.calendar_a.id,
            client_id: self.client.id,
            source_request_id: None,
        }
    }

    pub fn request_payload(&self, budget: f64) -> NewAppointmentRequest {
        NewAppointmentRequest {
            title: "Koi sleeve".into(),
            description: Some("Full sleeve, colour".into()),
            budget,
            design_images: vec!["https://img.ink.test/koi-1.png".into(), "https://img.ink.test/koi-2.png".into()],
            preferences: Some(serde_json::json!({ "style": "japanese" })),
        }
    }
}
