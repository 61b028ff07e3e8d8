//! Appointment request lifecycle against the in-memory store

mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use inkbook_core::domain::{
    AppointmentRequest, AppointmentStatus, AuditAction, AuditQuery, RequestFilter, RequestStatus,
};
use inkbook_core::error::{DomainError, ErrorKind};
use inkbook_core::repositories::AppointmentRequestRepository;
use inkbook_core::services::RequestConversion;
use inkbook_infrastructure::ExpirySweeper;

use common::{Harness, RecordingMailer};

fn conversion(h: &Harness, calendar_id: Uuid) -> RequestConversion {
    RequestConversion {
        calendar_id,
        start_time: h.at(10, 0),
        end_time: h.at(14, 0),
        total_price: None,
        notes: Some("Bring reference prints".into()),
    }
}

/// Inserts a PENDING request whose deadline is already behind us
async fn overdue_request(h: &Harness, title: &str) -> AppointmentRequest {
    let created = Utc::now() - Duration::days(8);
    let request = AppointmentRequest {
        id: Uuid::new_v4(),
        title: title.into(),
        description: None,
        budget: 200.0,
        design_images: vec![],
        preferences: None,
        status: RequestStatus::Pending,
        expires_at: Utc::now() - Duration::minutes(1),
        client_id: h.client.id,
        accepted_by_tenant_id: None,
        resulting_appointment_id: None,
        created_at: created,
        updated_at: created,
    };
    AppointmentRequestRepository::create(h.store.as_ref(), &request)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_full_request_scenario() {
    let h = Harness::new();

    // Client opens the request; every tenant owner is mailed.
    let request = h
        .requests
        .create(h.request_payload(800.0), h.client.id, &h.client_actor())
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    let ttl = request.expires_at - request.created_at;
    assert_eq!(ttl, Duration::days(7));
    assert_eq!(h.mailer.sent_to(&h.owner_a.email), 1);
    assert_eq!(h.mailer.sent_to(&h.owner_b.email), 1);

    // Tenant A wins.
    let accepted = h
        .requests
        .accept(request.id, h.tenant_a.id, &h.actor_a())
        .await
        .unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
    assert_eq!(accepted.accepted_by_tenant_id, Some(h.tenant_a.id));

    // Tenant B is too late.
    let late = h.requests.accept(request.id, h.tenant_b.id, &h.actor_b()).await;
    assert!(matches!(late, Err(DomainError::RequestAlreadyAccepted)));
    assert_eq!(late.unwrap_err().kind(), ErrorKind::Conflict);

    // The client can no longer withdraw.
    let cancel = h.requests.cancel(request.id, h.client.id, &h.client_actor()).await;
    assert!(matches!(
        cancel,
        Err(DomainError::RequestNotCancellable(RequestStatus::Accepted))
    ));

    // Tenant A schedules it.
    let outcome = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, h.calendar_a.id), &h.actor_a())
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Completed);
    assert_eq!(outcome.request.resulting_appointment_id, Some(outcome.appointment.id));

    let appointment = outcome.appointment;
    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.total_price, Some(800.0));
    assert_eq!(appointment.deposit, Some(0.0));
    assert_eq!(appointment.design_images, request.design_images);
    assert_eq!(appointment.source_request_id, Some(request.id));
    assert_eq!(appointment.client_id, h.client.id);
    assert_eq!(appointment.tenant_id, h.tenant_a.id);

    assert_eq!(h.notifier.names(), vec!["appointment:created"]);
    // Acceptance notice plus scheduled notice.
    assert_eq!(h.mailer.sent_to(&h.client.email), 2);

    let trail = h.audit.find_by_resource("APPOINTMENT_REQUEST", request.id).await.unwrap();
    let actions: Vec<AuditAction> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![AuditAction::AppointmentRequestCreated, AuditAction::AppointmentRequestAccepted]
    );
    let converted = h
        .audit
        .find_by_resource("APPOINTMENT", appointment.id)
        .await
        .unwrap();
    assert_eq!(converted[0].action, AuditAction::AppointmentCreatedFromRequest);
}

#[tokio::test]
async fn test_reaccept_by_holder_is_a_no_op() {
    let h = Harness::new();
    let request = h
        .requests
        .create(h.request_payload(300.0), h.client.id, &h.client_actor())
        .await
        .unwrap();

    let first = h.requests.accept(request.id, h.tenant_a.id, &h.actor_a()).await.unwrap();
    let audit_after_first = h.store.audit_len();

    let again = h.requests.accept(request.id, h.tenant_a.id, &h.actor_a()).await.unwrap();
    assert_eq!(again.status, RequestStatus::Accepted);
    assert_eq!(again.updated_at, first.updated_at);
    assert_eq!(h.store.audit_len(), audit_after_first);
    assert_eq!(h.mailer.sent_to(&h.client.email), 1);
}

#[tokio::test]
async fn test_accept_after_deadline_fails_without_sweep() {
    let h = Harness::new();
    let request = overdue_request(&h, "Tiny star").await;

    let err = h
        .requests
        .accept(request.id, h.tenant_a.id, &h.actor_a())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RequestExpired));

    let stored = h.requests.find_by_id(request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_accept_requires_tenant_membership() {
    let h = Harness::new();
    let request = h
        .requests
        .create(h.request_payload(300.0), h.client.id, &h.client_actor())
        .await
        .unwrap();

    let err = h
        .requests
        .accept(request.id, h.tenant_a.id, &h.actor_b())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ActorNotInTenant(_)));

    // A staff member added to the tenant may accept for it.
    h.store.add_member(h.tenant_a.id, h.owner_b.id);
    assert!(h.requests.accept(request.id, h.tenant_a.id, &h.actor_b()).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_accepts_have_one_winner() {
    let h = Harness::new();
    let request = h
        .requests
        .create(h.request_payload(500.0), h.client.id, &h.client_actor())
        .await
        .unwrap();

    let a = {
        let requests = h.requests.clone();
        let (id, tenant, actor) = (request.id, h.tenant_a.id, h.actor_a());
        tokio::spawn(async move { requests.accept(id, tenant, &actor).await })
    };
    let b = {
        let requests = h.requests.clone();
        let (id, tenant, actor) = (request.id, h.tenant_b.id, h.actor_b());
        tokio::spawn(async move { requests.accept(id, tenant, &actor).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(DomainError::RequestAlreadyAccepted))));

    let stored = h.requests.find_by_id(request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
}

#[tokio::test]
async fn test_cancel_rules() {
    let h = Harness::new();
    let request = h
        .requests
        .create(h.request_payload(150.0), h.client.id, &h.client_actor())
        .await
        .unwrap();

    let stranger = h
        .requests
        .cancel(request.id, h.owner_a.id, &h.actor_a())
        .await
        .unwrap_err();
    assert!(matches!(stranger, DomainError::NotRequestOwner));
    assert_eq!(stranger.kind(), ErrorKind::Unauthorized);

    let cancelled = h
        .requests
        .cancel(request.id, h.client.id, &h.client_actor())
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);

    let again = h.requests.cancel(request.id, h.client.id, &h.client_actor()).await;
    assert!(matches!(again, Err(DomainError::RequestNotCancellable(RequestStatus::Cancelled))));
}

#[tokio::test]
async fn test_expire_requests_counts_exactly_and_leaves_others() {
    let h = Harness::new();
    let overdue_one = overdue_request(&h, "Overdue one").await;
    let overdue_two = overdue_request(&h, "Overdue two").await;

    let live = h
        .requests
        .create(h.request_payload(100.0), h.client.id, &h.client_actor())
        .await
        .unwrap();
    let accepted = h
        .requests
        .create(h.request_payload(100.0), h.client.id, &h.client_actor())
        .await
        .unwrap();
    h.requests.accept(accepted.id, h.tenant_a.id, &h.actor_a()).await.unwrap();

    assert_eq!(h.requests.expire_requests().await.unwrap(), 2);

    for id in [overdue_one.id, overdue_two.id] {
        assert_eq!(h.requests.find_by_id(id).await.unwrap().status, RequestStatus::Expired);
    }
    assert_eq!(h.requests.find_by_id(live.id).await.unwrap().status, RequestStatus::Pending);
    assert_eq!(h.requests.find_by_id(accepted.id).await.unwrap().status, RequestStatus::Accepted);

    // Nothing left to sweep.
    assert_eq!(h.requests.expire_requests().await.unwrap(), 0);

    let expired_audit = h
        .audit
        .query(&AuditQuery {
            action: Some(AuditAction::AppointmentRequestExpired),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(expired_audit.total, 2);
    assert!(expired_audit.data.iter().all(|e| e.actor_type == "SYSTEM"));
}

#[tokio::test]
async fn test_sweeper_run_once_uses_the_service() {
    let h = Harness::new();
    overdue_request(&h, "Overdue").await;

    let sweeper = ExpirySweeper::new(h.requests.clone(), StdDuration::from_secs(60));
    assert_eq!(sweeper.run_once().await, 1);
    assert_eq!(sweeper.run_once().await, 0);
}

#[tokio::test]
async fn test_convert_requires_accepted_request() {
    let h = Harness::new();
    let request = h
        .requests
        .create(h.request_payload(400.0), h.client.id, &h.client_actor())
        .await
        .unwrap();

    let err = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, h.calendar_a.id), &h.actor_a())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RequestNotAccepted(RequestStatus::Pending)));
    assert!(h.notifier.names().is_empty());
}

#[tokio::test]
async fn test_convert_calendar_checks() {
    let h = Harness::new();
    let request = h
        .requests
        .create(h.request_payload(400.0), h.client.id, &h.client_actor())
        .await
        .unwrap();
    h.requests.accept(request.id, h.tenant_a.id, &h.actor_a()).await.unwrap();

    let unknown = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, Uuid::new_v4()), &h.actor_a())
        .await
        .unwrap_err();
    assert!(matches!(unknown, DomainError::CalendarNotFound(_)));
    assert_eq!(unknown.kind(), ErrorKind::NotFound);

    let foreign = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, h.calendar_b.id), &h.actor_a())
        .await
        .unwrap_err();
    assert!(matches!(foreign, DomainError::CalendarTenantMismatch { .. }));
    assert_eq!(foreign.kind(), ErrorKind::Validation);

    let stored = h.requests.find_by_id(request.id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
}

#[tokio::test]
async fn test_convert_respects_price_override_and_conflicts() {
    let h = Harness::new();
    h.appointments
        .create(h.booking(h.at(12, 0), h.at(13, 0)), &h.actor_a())
        .await
        .unwrap();

    let request = h
        .requests
        .create(h.request_payload(900.0), h.client.id, &h.client_actor())
        .await
        .unwrap();
    h.requests.accept(request.id, h.tenant_a.id, &h.actor_a()).await.unwrap();

    // 10:00-14:00 runs over the existing noon booking.
    let clash = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, h.calendar_a.id), &h.actor_a())
        .await;
    assert!(matches!(clash, Err(DomainError::TimeConflict)));

    let mut free = conversion(&h, h.calendar_a.id);
    free.start_time = h.at(14, 0);
    free.end_time = h.at(17, 0);
    free.total_price = Some(0.0);
    let outcome = h
        .requests
        .convert_to_appointment(request.id, free, &h.actor_a())
        .await
        .unwrap();
    assert_eq!(outcome.appointment.total_price, Some(0.0));

    let again = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, h.calendar_a.id), &h.actor_a())
        .await;
    assert!(matches!(
        again,
        Err(DomainError::RequestNotAccepted(RequestStatus::Completed))
    ));
}

#[tokio::test]
async fn test_mail_failures_never_fail_the_flow() {
    let h = Harness::with_mailer(RecordingMailer::failing());

    let request = h
        .requests
        .create(h.request_payload(250.0), h.client.id, &h.client_actor())
        .await
        .unwrap();
    let accepted = h
        .requests
        .accept(request.id, h.tenant_a.id, &h.actor_a())
        .await
        .unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);

    let outcome = h
        .requests
        .convert_to_appointment(request.id, conversion(&h, h.calendar_a.id), &h.actor_a())
        .await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_only_clients_open_requests() {
    let h = Harness::new();
    let err = h
        .requests
        .create(h.request_payload(100.0), h.owner_a.id, &h.actor_a())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotAClient));
}

#[tokio::test]
async fn test_listing_is_offset_paginated_newest_first() {
    let h = Harness::new();
    for budget in [100.0, 200.0, 300.0] {
        h.requests
            .create(h.request_payload(budget), h.client.id, &h.client_actor())
            .await
            .unwrap();
        tokio::time::sleep(StdDuration::from_millis(2)).await;
    }

    let filter = RequestFilter {
        client_id: Some(h.client.id),
        ..Default::default()
    };
    let page = h.requests.find_all(&filter, Some(2), Some(2)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.page, 2);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].budget, 100.0);

    let available = h.requests.find_available_for_tenant(h.tenant_b.id).await.unwrap();
    assert_eq!(available.len(), 3);
}
