mod common;

use clubhouse::{config::Settings, domain::*, error::AppError};
use common::{event_request, insert_member, points_of, test_context, workshop_request};
use uuid::Uuid;

fn assert_bad_request<T: std::fmt::Debug>(result: Result<T, AppError>, expected: &str) {
    match result {
        Err(AppError::BadRequest(message)) => assert_eq!(message, expected),
        other => panic!("expected \"{}\", got {:?}", expected, other),
    }
}

#[tokio::test]
async fn test_capacity_rejects_then_admits_after_cancel() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let event = ctx.activity_service
        .create_event(event_request("Rust Meetup", Some(3)), Uuid::new_v4())
        .await?;

    let mut members = Vec::new();
    for n in 0..4 {
        members.push(insert_member(&pool, n, None).await?);
    }

    for member in &members[..3] {
        let registration = ctx.registration_service
            .register(ActivityKind::Event, event.id, member.id)
            .await?;
        assert_eq!(registration.status, RegistrationStatus::Confirmed);
    }

    let fourth = ctx.registration_service
        .register(ActivityKind::Event, event.id, members[3].id)
        .await;
    assert_bad_request(fourth, "Event is full");

    let cancelled = ctx.registration_service
        .cancel(ActivityKind::Event, event.id, members[0].id)
        .await?;
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);

    let admitted = ctx.registration_service
        .register(ActivityKind::Event, event.id, members[3].id)
        .await?;
    assert_eq!(admitted.status, RegistrationStatus::Confirmed);

    Ok(())
}

#[tokio::test]
async fn test_fifty_first_registration_is_full() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let event = ctx.activity_service
        .create_event(event_request("Hackathon Kickoff", Some(50)), Uuid::new_v4())
        .await?;

    for n in 0..50 {
        let member = insert_member(&pool, n, None).await?;
        ctx.registration_service
            .register(ActivityKind::Event, event.id, member.id)
            .await?;
    }

    let latecomer = insert_member(&pool, 50, None).await?;
    let result = ctx.registration_service
        .register(ActivityKind::Event, event.id, latecomer.id)
        .await;
    assert_bad_request(result, "Event is full");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_registration_rejected() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let member = insert_member(&pool, 1, None).await?;

    // No capacity limit at all
    let event = ctx.activity_service
        .create_event(event_request("Open House", None), Uuid::new_v4())
        .await?;
    ctx.registration_service.register(ActivityKind::Event, event.id, member.id).await?;
    let again = ctx.registration_service.register(ActivityKind::Event, event.id, member.id).await;
    assert_bad_request(again, "Already registered for this event");

    // Duplicate check runs before the capacity check
    let small = ctx.activity_service
        .create_event(event_request("Fireside Chat", Some(1)), Uuid::new_v4())
        .await?;
    ctx.registration_service.register(ActivityKind::Event, small.id, member.id).await?;
    let again = ctx.registration_service.register(ActivityKind::Event, small.id, member.id).await;
    assert_bad_request(again, "Already registered for this event");

    Ok(())
}

#[tokio::test]
async fn test_unpublished_event_not_found() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let member = insert_member(&pool, 1, None).await?;

    let mut request = event_request("Planning Session", None);
    request.is_published = false;
    let event = ctx.activity_service.create_event(request, Uuid::new_v4()).await?;

    let result = ctx.registration_service.register(ActivityKind::Event, event.id, member.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_attendance_via_qr_token_awards_points() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let member = insert_member(&pool, 1, None).await?;
    let event = ctx.activity_service
        .create_event(event_request("Demo Day", Some(10)), Uuid::new_v4())
        .await?;

    ctx.registration_service.register(ActivityKind::Event, event.id, member.id).await?;
    assert_eq!(points_of(&ctx, member.id).await?, 5);

    let qr = ctx.registration_service
        .attendance_qr(ActivityKind::Event, event.id, member.id)
        .await?;
    assert!(qr.svg.contains("<svg"));
    assert!(qr.data_url.starts_with("data:image/svg+xml;base64,"));

    let attended = ctx.registration_service
        .mark_attendance(ActivityKind::Event, &qr.token)
        .await?;
    assert_eq!(attended.status, RegistrationStatus::Attended);
    assert!(attended.attended_at.is_some());
    assert_eq!(points_of(&ctx, member.id).await?, 15);

    let twice = ctx.registration_service.mark_attendance(ActivityKind::Event, &qr.token).await;
    assert_bad_request(twice, "Attendance already recorded");

    let forged = format!("{}.{}", attended.id, "00".repeat(32));
    let result = ctx.registration_service.mark_attendance(ActivityKind::Event, &forged).await;
    assert_bad_request(result, "Invalid attendance code");

    Ok(())
}

#[tokio::test]
async fn test_workshop_approval_flow() -> anyhow::Result<()> {
    let (pool, ctx) = test_context(&Settings::default()).await?;
    let member = insert_member(&pool, 1, None).await?;
    let workshop = ctx.activity_service
        .create_workshop(workshop_request("Embedded Rust", Some(5), true), Uuid::new_v4())
        .await?;

    let pending = ctx.registration_service
        .register(ActivityKind::Workshop, workshop.id, member.id)
        .await?;
    assert_eq!(pending.status, RegistrationStatus::Pending);

    let early = ctx.registration_service
        .attendance_qr(ActivityKind::Workshop, workshop.id, member.id)
        .await;
    assert_bad_request(early, "Registration is awaiting approval");

    let confirmed = ctx.registration_service.confirm(workshop.id, member.id).await?;
    assert_eq!(confirmed.status, RegistrationStatus::Confirmed);

    let qr = ctx.registration_service
        .attendance_qr(ActivityKind::Workshop, workshop.id, member.id)
        .await?;

    // A workshop code is not accepted at the event scanner
    let wrong_kind = ctx.registration_service.mark_attendance(ActivityKind::Event, &qr.token).await;
    assert_bad_request(wrong_kind, "Attendance code is not for this event");

    ctx.registration_service.mark_attendance(ActivityKind::Workshop, &qr.token).await?;
    assert_eq!(points_of(&ctx, member.id).await?, 5 + 30);

    let roster = ctx.registration_service
        .list_for_activity(ActivityKind::Workshop, workshop.id)
        .await?;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].member_email, "member1@example.com");

    Ok(())
}
