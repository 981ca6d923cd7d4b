mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{id_of, TestApp, ADMIN_EMAIL, PASSWORD};
use packworkx_api::models::UserRole;
use serde_json::json;

#[tokio::test]
async fn protected_routes_need_a_bearer_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/companies", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_MISSING");

    let (status, _) = app
        .request(
            Method::GET,
            "/api/v1/companies",
            None,
            Some("not-a-real-token"),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_INVALID_CREDENTIALS");

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "nobody@packworkx.test", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_is_case_insensitive_on_email() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": ADMIN_EMAIL.to_uppercase(), "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn staff_can_move_stock_but_not_manage_companies() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Staffed Boxes").await;
    let sku_id = app.create_sku(company_id, "Carton").await;
    let staff = app.token_for(UserRole::Staff, Some(company_id)).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "name": "Staff Made Co" })),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTH_INSUFFICIENT_PERMISSIONS");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/inventory/adjust",
            Some(json!({
                "company_id": company_id,
                "sku_id": sku_id,
                "quantity_change": 12,
                "reason": "opening stock",
            })),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app
        .request(Method::GET, "/api/v1/companies", None, Some(&staff))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn managers_cannot_administer_users() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Managed Boxes").await;
    let manager = app.token_for(UserRole::Manager, Some(company_id)).await;

    let (status, _) = app
        .request(Method::GET, "/api/v1/users", None, Some(&manager))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/clients",
            Some(json!({ "company_id": company_id, "name": "Manager's Client" })),
            Some(&manager),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn non_admin_users_need_a_company() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post(
            "/api/v1/users",
            json!({
                "name": "Floating Staff",
                "email": "floating@packworkx.test",
                "password": PASSWORD,
                "role": "staff",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_user_email_conflicts() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post(
            "/api/v1/users",
            json!({
                "name": "Second Admin",
                "email": ADMIN_EMAIL.to_uppercase(),
                "password": PASSWORD,
                "role": "admin",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn deactivated_users_cannot_log_in() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Leavers Ltd").await;
    let (status, body) = app
        .post(
            "/api/v1/users",
            json!({
                "company_id": company_id,
                "name": "Leaving Staff",
                "email": "leaver@packworkx.test",
                "password": PASSWORD,
                "role": "staff",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let user_id = id_of(&body["data"]);
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = app.delete(&format!("/api/v1/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "leaver@packworkx.test", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTH_USER_INACTIVE");
}

#[tokio::test]
async fn request_id_is_echoed_on_success_and_error() {
    let app = TestApp::new().await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/v1/companies")
                .header("x-request-id", "req-corrugated-1")
                .header("authorization", format!("Bearer {}", app.token()))
                .body(Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-corrugated-1")
    );

    let response = app
        .send(
            Request::builder()
                .uri(format!("/api/v1/companies/{}", uuid::Uuid::new_v4()))
                .header("x-request-id", "req-corrugated-2")
                .header("authorization", format!("Bearer {}", app.token()))
                .body(Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(body["request_id"], "req-corrugated-2");
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let response = app
        .send(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
