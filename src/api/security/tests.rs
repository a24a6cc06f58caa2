use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::{AssessmentKind, EnrollmentRole};
use crate::test_support;

struct ExamSession {
    course_id: String,
    assessment_id: String,
    session_id: String,
    student_token: String,
    instructor_token: String,
}

async fn seed_exam_session(
    ctx: &test_support::TestContext,
    alert_threshold: i32,
    auto_suspend: bool,
) -> ExamSession {
    let instructor =
        test_support::insert_user(ctx.state.db(), "teach20", "Instructor", "teach-pass").await;
    let student =
        test_support::insert_user(ctx.state.db(), "study20", "Student", "study-pass").await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Networks", &instructor.id)
            .await;
    test_support::enroll(ctx.state.db(), &course.id, &student.id, EnrollmentRole::Student).await;
    let module = test_support::insert_module(ctx.state.db(), &course.id, "Final").await;
    let assessment = test_support::insert_assessment(
        ctx.state.db(),
        &module.id,
        &instructor.id,
        AssessmentKind::Exam,
        60.0,
        3,
    )
    .await;
    test_support::insert_single_choice_question(ctx.state.db(), &assessment.id, 1, 0).await;
    test_support::insert_exam_configuration(
        ctx.state.db(),
        &assessment.id,
        3,
        alert_threshold,
        auto_suspend,
    )
    .await;

    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/assessments/{}/attempts", course.id, assessment.id),
            Some(&student_token),
            None,
        ))
        .await
        .expect("start attempt");
    let status = response.status();
    let started = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {started}");

    ExamSession {
        course_id: course.id,
        assessment_id: assessment.id,
        session_id: started["session_id"].as_str().expect("session id").to_string(),
        student_token,
        instructor_token: test_support::bearer_token(&instructor.id, ctx.state.settings()),
    }
}

fn event_payload(severity: &str) -> serde_json::Value {
    json!({
        "event_type": "tab_switch",
        "description": "Browser tab lost focus",
        "severity": severity,
        "metadata": {"tab_count": 2}
    })
}

async fn record_event(
    ctx: &test_support::TestContext,
    session: &ExamSession,
    token: &str,
    payload: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/security/sessions/{}/events", session.session_id),
            Some(token),
            Some(payload),
        ))
        .await
        .expect("record event");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn high_severity_events_are_flagged_for_review() {
    let ctx = test_support::setup_test_context().await;
    let session = seed_exam_session(&ctx, 3, false).await;

    let (status, recorded) =
        record_event(&ctx, &session, &session.student_token, event_payload("high")).await;
    assert_eq!(status, StatusCode::CREATED, "response: {recorded}");
    assert_eq!(recorded["event"]["flagged_for_review"], true);
    assert_eq!(recorded["event"]["auto_resolved"], false);
    assert_eq!(recorded["attempt_suspended"], false);

    let (status, recorded) =
        record_event(&ctx, &session, &session.student_token, event_payload("low")).await;
    assert_eq!(status, StatusCode::CREATED, "response: {recorded}");
    assert_eq!(recorded["event"]["flagged_for_review"], false);
}

#[tokio::test]
async fn session_owner_is_enforced() {
    let ctx = test_support::setup_test_context().await;
    let session = seed_exam_session(&ctx, 3, false).await;

    let outsider =
        test_support::insert_user(ctx.state.db(), "study21", "Outsider", "study-pass").await;
    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());

    let (status, body) =
        record_event(&ctx, &session, &outsider_token, event_payload("low")).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "response: {body}");
}

#[tokio::test]
async fn ended_session_rejects_new_events() {
    let ctx = test_support::setup_test_context().await;
    let session = seed_exam_session(&ctx, 3, false).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!(
                "/api/v1/courses/{}/assessments/{}/attempts/submit",
                session.course_id, session.assessment_id
            ),
            Some(&session.student_token),
            Some(json!({"responses": []})),
        ))
        .await
        .expect("submit attempt");
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) =
        record_event(&ctx, &session, &session.student_token, event_payload("low")).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
}

#[tokio::test]
async fn event_flood_auto_suspends_the_attempt() {
    let ctx = test_support::setup_test_context().await;
    let session = seed_exam_session(&ctx, 2, true).await;

    for _ in 0..2 {
        let (status, recorded) =
            record_event(&ctx, &session, &session.student_token, event_payload("medium")).await;
        assert_eq!(status, StatusCode::CREATED, "response: {recorded}");
        assert_eq!(recorded["attempt_suspended"], false);
    }

    // Third event pushes the count past alert_threshold = 2.
    let (status, recorded) =
        record_event(&ctx, &session, &session.student_token, event_payload("medium")).await;
    assert_eq!(status, StatusCode::CREATED, "response: {recorded}");
    assert_eq!(recorded["attempt_suspended"], true);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/security/sessions/{}/events", session.session_id),
            Some(&session.instructor_token),
            None,
        ))
        .await
        .expect("list events");
    let status = response.status();
    let events = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {events}");
    let events = events.as_array().expect("event list");
    assert_eq!(events.len(), 4);
    let synthetic = events
        .iter()
        .find(|event| event["event_type"] == "auto_suspension")
        .expect("auto_suspension event");
    assert_eq!(synthetic["severity"], "high");
    assert_eq!(synthetic["flagged_for_review"], true);

    let attempt_status: String = sqlx::query_scalar(
        "SELECT a.status::text FROM attempts a
         JOIN security_sessions s ON s.attempt_id = a.id
         WHERE s.id = $1",
    )
    .bind(&session.session_id)
    .fetch_one(ctx.state.db())
    .await
    .expect("attempt row");
    assert_eq!(attempt_status, "abandoned");
}

#[tokio::test]
async fn instructor_can_resolve_an_event() {
    let ctx = test_support::setup_test_context().await;
    let session = seed_exam_session(&ctx, 3, false).await;

    let (status, recorded) =
        record_event(&ctx, &session, &session.student_token, event_payload("high")).await;
    assert_eq!(status, StatusCode::CREATED, "response: {recorded}");
    let event_id = recorded["event"]["id"].as_str().expect("event id").to_string();

    let resolve_uri = format!("/api/v1/security/events/{event_id}/resolve");

    // The session owner is not a reviewer.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &resolve_uri,
            Some(&session.student_token),
            None,
        ))
        .await
        .expect("resolve as student");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &resolve_uri,
            Some(&session.instructor_token),
            None,
        ))
        .await
        .expect("resolve event");
    let status = response.status();
    let resolved = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {resolved}");
    assert_eq!(resolved["auto_resolved"], true);
    assert_eq!(resolved["flagged_for_review"], false);
}

#[tokio::test]
async fn session_closed_mid_request_rejects_the_event() {
    let ctx = test_support::setup_test_context().await;
    let session = seed_exam_session(&ctx, 3, false).await;

    // Hold the session row lock so the request passes the initial read and
    // then queues behind a concurrent close, exactly the submission race.
    let mut tx = ctx.state.db().begin().await.expect("begin");
    crate::repositories::security_sessions::lock(&mut *tx, &session.session_id)
        .await
        .expect("lock session")
        .expect("session exists");

    let app = ctx.app.clone();
    let request = test_support::json_request(
        Method::POST,
        &format!("/api/v1/security/sessions/{}/events", session.session_id),
        Some(&session.student_token),
        Some(event_payload("low")),
    );
    let pending = tokio::spawn(async move { app.oneshot(request).await.expect("record event") });

    // Give the request time to reach the row lock, then close the session.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    crate::repositories::security_sessions::end_session(
        &mut *tx,
        &session.session_id,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("end session");
    tx.commit().await.expect("commit");

    let response = pending.await.expect("join");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");

    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM security_events WHERE session_id = $1")
        .bind(&session.session_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("event count");
    assert_eq!(events, 0, "no event may land in a closed session");
}
