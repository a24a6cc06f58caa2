use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
async fn signup_returns_token_and_rejects_duplicates() {
    let ctx = test_support::setup_test_context().await;

    let payload = json!({
        "username": "newstudent",
        "full_name": "New Student",
        "password": "first-password"
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(payload.clone()),
        ))
        .await
        .expect("signup");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["token_type"], "bearer");
    assert_eq!(created["user"]["username"], "newstudent");
    assert!(created["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(created["user"].get("hashed_password").is_none());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(payload),
        ))
        .await
        .expect("duplicate signup");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_verifies_credentials() {
    let ctx = test_support::setup_test_context().await;

    test_support::insert_user(ctx.state.db(), "loginuser", "Login User", "right-password").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "loginuser", "password": "wrong-password"})),
        ))
        .await
        .expect("bad login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "loginuser", "password": "right-password"})),
        ))
        .await
        .expect("login");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["user"]["username"], "loginuser");
}

#[tokio::test]
async fn token_endpoint_accepts_form_credentials() {
    let ctx = test_support::setup_test_context().await;

    test_support::insert_user(ctx.state.db(), "formuser", "Form User", "form-password").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=formuser&password=form-password"))
        .expect("request");

    let response = ctx.app.oneshot(request).await.expect("token");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["token_type"], "bearer");
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let ctx = test_support::setup_test_context().await;

    let user = test_support::insert_user(ctx.state.db(), "meuser", "Me User", "me-password").await;
    let token = test_support::bearer_token(&user.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", Some(&token), None))
        .await
        .expect("me");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["id"], user.id.as_str());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/auth/me",
            Some("not-a-token"),
            None,
        ))
        .await
        .expect("me without valid token");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_users_cannot_log_in() {
    let ctx = test_support::setup_test_context().await;

    let user = test_support::insert_user(ctx.state.db(), "dormant", "Dormant", "dormant-pass")
        .await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(&user.id)
        .execute(ctx.state.db())
        .await
        .expect("deactivate user");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"username": "dormant", "password": "dormant-pass"})),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
