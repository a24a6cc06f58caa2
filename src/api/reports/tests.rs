use axum::http::{Method, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::types::{AssessmentKind, EnrollmentRole};
use crate::repositories;
use crate::test_support;

async fn insert_completed_attempt(
    pool: &sqlx::PgPool,
    assessment_id: &str,
    user_id: &str,
    enrollment_id: &str,
    attempt_number: i32,
    score: f64,
    passed: bool,
) {
    let now = primitive_now_utc();
    let attempt = repositories::attempts::create(
        pool,
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            assessment_id,
            user_id,
            enrollment_id,
            attempt_number,
            started_at: now,
            max_score: 5.0,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("create attempt")
    .expect("attempt inserted");
    repositories::attempts::complete(pool, &attempt.id, score, 5.0, passed, now, 120)
        .await
        .expect("complete attempt");
}

#[tokio::test]
async fn course_results_aggregate_completed_attempts() {
    let ctx = test_support::setup_test_context().await;

    let instructor =
        test_support::insert_user(ctx.state.db(), "teach30", "Instructor", "teach-pass").await;
    let alice = test_support::insert_user(ctx.state.db(), "alice", "Alice", "alice-pass").await;
    let bob = test_support::insert_user(ctx.state.db(), "bob", "Bob", "bob-pass").await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Statistics", &instructor.id)
            .await;
    let alice_enrollment =
        test_support::enroll(ctx.state.db(), &course.id, &alice.id, EnrollmentRole::Student).await;
    let bob_enrollment =
        test_support::enroll(ctx.state.db(), &course.id, &bob.id, EnrollmentRole::Student).await;
    let module = test_support::insert_module(ctx.state.db(), &course.id, "Unit 1").await;
    let assessment = test_support::insert_assessment(
        ctx.state.db(),
        &module.id,
        &instructor.id,
        AssessmentKind::Quiz,
        60.0,
        3,
    )
    .await;

    let db = ctx.state.db();
    insert_completed_attempt(db, &assessment.id, &alice.id, &alice_enrollment, 1, 40.0, false)
        .await;
    insert_completed_attempt(db, &assessment.id, &alice.id, &alice_enrollment, 2, 80.0, true)
        .await;
    insert_completed_attempt(db, &assessment.id, &bob.id, &bob_enrollment, 1, 60.0, true).await;

    let token = test_support::bearer_token(&instructor.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/results", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("course results");

    let status = response.status();
    let results = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {results}");
    assert_eq!(results["course_id"], course.id.as_str());

    let assessments = results["assessments"].as_array().expect("assessments");
    assert_eq!(assessments.len(), 1);
    let summary = &assessments[0];
    assert_eq!(summary["assessment_id"], assessment.id.as_str());
    assert_eq!(summary["completed_attempts"], 3);
    assert_eq!(summary["pass_rate"], 66.67);
    assert_eq!(summary["average_score"], 60.0);
    assert_eq!(summary["suspicious_attempts"], 0);

    let best = summary["best_attempts"].as_array().expect("best attempts");
    assert_eq!(best.len(), 2);
    assert_eq!(best[0]["user_id"], alice.id.as_str());
    assert_eq!(best[0]["attempt_number"], 2);
    assert_eq!(best[0]["score"], 80.0);
    assert_eq!(best[1]["user_id"], bob.id.as_str());
}

#[tokio::test]
async fn results_can_be_narrowed_to_one_assessment() {
    let ctx = test_support::setup_test_context().await;

    let instructor =
        test_support::insert_user(ctx.state.db(), "teach31", "Instructor", "teach-pass").await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Statistics", &instructor.id)
            .await;
    let module = test_support::insert_module(ctx.state.db(), &course.id, "Unit 1").await;
    let first = test_support::insert_assessment(
        ctx.state.db(),
        &module.id,
        &instructor.id,
        AssessmentKind::Quiz,
        60.0,
        3,
    )
    .await;
    test_support::insert_assessment(
        ctx.state.db(),
        &module.id,
        &instructor.id,
        AssessmentKind::Quiz,
        50.0,
        3,
    )
    .await;

    let token = test_support::bearer_token(&instructor.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/results?assessment_id={}", course.id, first.id),
            Some(&token),
            None,
        ))
        .await
        .expect("filtered results");

    let status = response.status();
    let results = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {results}");
    let assessments = results["assessments"].as_array().expect("assessments");
    assert_eq!(assessments.len(), 1);
    assert_eq!(assessments[0]["assessment_id"], first.id.as_str());
    assert_eq!(assessments[0]["completed_attempts"], 0);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!(
                "/api/v1/courses/{}/results?assessment_id={}",
                course.id,
                Uuid::new_v4()
            ),
            Some(&token),
            None,
        ))
        .await
        .expect("missing assessment");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn students_cannot_read_course_results() {
    let ctx = test_support::setup_test_context().await;

    let instructor =
        test_support::insert_user(ctx.state.db(), "teach32", "Instructor", "teach-pass").await;
    let student =
        test_support::insert_user(ctx.state.db(), "study30", "Student", "study-pass").await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Statistics", &instructor.id)
            .await;
    test_support::enroll(ctx.state.db(), &course.id, &student.id, EnrollmentRole::Student).await;

    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/results", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("course results");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
