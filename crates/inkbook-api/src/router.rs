//! Route table

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::handlers::{appointment_requests, appointments, audit, auth, health, tenants, users, ws};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
        .route("/verify-email", post(auth::verify_email));

    let user_routes = Router::new()
        .route("/", get(users::list))
        .route("/statistics", get(users::statistics))
        .route("/me", get(users::me))
        .route(
            "/{id}",
            get(users::get_one).patch(users::update).delete(users::remove),
        );

    let tenant_routes = Router::new()
        .route("/", post(tenants::create).get(tenants::list))
        .route("/{id}", get(tenants::get_one))
        .route("/{id}/members", post(tenants::add_member))
        .route("/{id}/calendars", post(tenants::create_calendar).get(tenants::calendars));

    let appointment_routes = Router::new()
        .route("/", post(appointments::create).get(appointments::list))
        .route("/calendar/{calendar_id}", get(appointments::by_calendar))
        .route("/tenant/{tenant_id}/upcoming", get(appointments::upcoming))
        .route(
            "/{id}",
            get(appointments::get_one)
                .patch(appointments::update)
                .delete(appointments::remove),
        );

    let request_routes = Router::new()
        .route("/", post(appointment_requests::create).get(appointment_requests::list))
        .route("/mine", get(appointment_requests::mine))
        .route("/expire", post(appointment_requests::expire))
        .route("/available/{tenant_id}", get(appointment_requests::available))
        .route("/{id}", get(appointment_requests::get_one))
        .route("/{id}/accept", patch(appointment_requests::accept))
        .route("/{id}/cancel", patch(appointment_requests::cancel))
        .route("/{id}/convert-to-appointment", post(appointment_requests::convert));

    let audit_routes = Router::new()
        .route("/", get(audit::query))
        .route("/security", get(audit::security_events))
        .route("/resource/{resource_type}/{resource_id}", get(audit::by_resource))
        .route("/actor/{actor_id}", get(audit::by_actor))
        .route("/tenant/{tenant_id}", get(audit::by_tenant))
        .route("/{id}", get(audit::get_one));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/tenants", tenant_routes)
        .nest("/appointments", appointment_routes)
        .nest("/appointment-requests", request_routes)
        .nest("/audit", audit_routes);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ws/appointments", get(ws::ws_handler))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default().include_headers(false)))
        .with_state(state)
}
