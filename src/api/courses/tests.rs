use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::EnrollmentRole;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn course_creator_becomes_instructor() {
    let ctx = test_support::setup_test_context().await;

    let user =
        test_support::insert_user(ctx.state.db(), "founder01", "Founder", "founder-pass").await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({"title": "Discrete Mathematics", "description": "Proofs and graphs"})),
        ))
        .await
        .expect("create course");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let course_id = created["id"].as_str().expect("course id").to_string();
    assert_eq!(created["title"], "Discrete Mathematics");

    let enrollment =
        repositories::enrollments::find_for_user_course(ctx.state.db(), &user.id, &course_id)
            .await
            .expect("find enrollment")
            .expect("creator enrollment");
    assert_eq!(enrollment.role, EnrollmentRole::Instructor);

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/courses", Some(&token), None))
        .await
        .expect("list courses");
    let status = response.status();
    let listed = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {listed}");
    assert_eq!(listed.as_array().expect("courses").len(), 1);
}

#[tokio::test]
async fn instructor_manages_modules_and_enrollments() {
    let ctx = test_support::setup_test_context().await;

    let instructor =
        test_support::insert_user(ctx.state.db(), "teach40", "Instructor", "teach-pass").await;
    let student =
        test_support::insert_user(ctx.state.db(), "study40", "Student", "study-pass").await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Compilers", &instructor.id)
            .await;
    let token = test_support::bearer_token(&instructor.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/modules", course.id),
            Some(&token),
            Some(json!({"title": "Lexing", "order_index": 0})),
        ))
        .await
        .expect("create module");
    let status = response.status();
    let module = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {module}");
    assert_eq!(module["title"], "Lexing");

    let enroll_uri = format!("/api/v1/courses/{}/enrollments", course.id);
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &enroll_uri,
            Some(&token),
            Some(json!({"user_id": student.id, "role": "student"})),
        ))
        .await
        .expect("enroll student");
    let status = response.status();
    let enrolled = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {enrolled}");
    assert_eq!(enrolled["user_id"], student.id.as_str());
    assert_eq!(enrolled["role"], "student");

    // Second enrollment of the same user is rejected.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &enroll_uri,
            Some(&token),
            Some(json!({"user_id": student.id, "role": "student"})),
        ))
        .await
        .expect("enroll again");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, &enroll_uri, Some(&token), None))
        .await
        .expect("list enrollments");
    let status = response.status();
    let listing = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {listing}");
    assert_eq!(listing["total"], 2);
    assert_eq!(listing["items"].as_array().expect("items").len(), 2);
}

#[tokio::test]
async fn outsiders_cannot_read_a_course() {
    let ctx = test_support::setup_test_context().await;

    let instructor =
        test_support::insert_user(ctx.state.db(), "teach41", "Instructor", "teach-pass").await;
    let outsider =
        test_support::insert_user(ctx.state.db(), "study41", "Outsider", "study-pass").await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Compilers", &instructor.id)
            .await;

    let token = test_support::bearer_token(&outsider.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get course");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn platform_admin_sees_any_course() {
    let ctx = test_support::setup_test_context().await;

    let instructor =
        test_support::insert_user(ctx.state.db(), "teach42", "Instructor", "teach-pass").await;
    let admin =
        test_support::insert_platform_admin(ctx.state.db(), "admin40", "Admin", "admin-pass")
            .await;
    let course =
        test_support::create_course_with_instructor(ctx.state.db(), "Compilers", &instructor.id)
            .await;

    let token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get course as admin");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["id"], course.id.as_str());
}
