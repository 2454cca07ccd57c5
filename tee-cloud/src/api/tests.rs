use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::create_router;
use crate::config::Config;
use crate::state::AppState;
use crate::store::MemoryStore;

const DAY: &str = "2026-05-02";

fn test_config() -> Config {
    Config {
        database_url: None,
        http_port: 0,
        environment: "development".into(),
        jwt_secret: "router-test-secret".into(),
        admin_username: "starter".into(),
        admin_password: "pro-shop-42".into(),
        course_utc_offset_minutes: 0,
        default_course: "Main Course".into(),
    }
}

fn app() -> Router {
    let state = AppState::with_store(Arc::new(MemoryStore::new()), &test_config()).unwrap();
    create_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({"username": "starter", "password": "pro-shop-42"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "admin");
    body["token"].as_str().unwrap().to_string()
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"name": username, "username": username, "password": "sand-wedge"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["member"]["username"], username);
    body["token"].as_str().unwrap().to_string()
}

async fn generate(app: &Router, admin: &str, capacity: i32) -> Vec<Value> {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/admin/days/generate",
        Some(admin),
        Some(json!({"date": DAY, "capacity": capacity})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["course"], "Main Course");

    let (status, sheet) = send(
        app,
        Method::GET,
        &format!("/api/tee-sheet?date={DAY}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    sheet["slots"].as_array().unwrap().clone()
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn book_list_and_cancel_through_the_api() {
    let app = app();
    let admin = admin_token(&app).await;
    let slots = generate(&app, &admin, 2).await;
    assert_eq!(slots.len(), 22);
    let slot_id = slots[0]["id"].as_str().unwrap().to_string();

    let alice = register(&app, "alice").await;

    let (status, booking) = send(
        &app,
        Method::POST,
        &format!("/api/slots/{slot_id}/book"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{booking}");
    assert_eq!(booking["spot_no"], 1);
    assert_eq!(booking["status"], "booked");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/slots/{slot_id}/book"),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5002);

    let (status, detail) = send(
        &app,
        Method::GET,
        &format!("/api/slots/{slot_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["available"], 1);
    assert_eq!(
        detail["spots"],
        json!([{"spot_no": 1, "booked": true}, {"spot_no": 2, "booked": false}])
    );

    let (_, mine) = send(&app, Method::GET, "/api/bookings", Some(&alice), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["booking_id"], booking_id.as_str());

    let cancel = format!("/api/bookings/{booking_id}/cancel");
    let (status, body) = send(&app, Method::POST, &cancel, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], true);
    let (status, body) = send(&app, Method::POST, &cancel, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelled"], false);

    let (_, mine) = send(&app, Method::GET, "/api/bookings", Some(&alice), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn full_slot_returns_conflict() {
    let app = app();
    let admin = admin_token(&app).await;
    let slot_id = generate(&app, &admin, 2).await[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let book = format!("/api/slots/{slot_id}/book");

    let a = register(&app, "anna").await;
    let b = register(&app, "bernhard").await;
    let c = register(&app, "colin").await;

    assert_eq!(send(&app, Method::POST, &book, Some(&a), None).await.1["spot_no"], 1);
    assert_eq!(send(&app, Method::POST, &book, Some(&b), None).await.1["spot_no"], 2);

    let (status, body) = send(&app, Method::POST, &book, Some(&c), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 5003);

    let (_, sheet) = send(
        &app,
        Method::GET,
        &format!("/api/tee-sheet?date={DAY}&course=Main%20Course"),
        None,
        None,
    )
    .await;
    assert_eq!(sheet["slots"][0]["available"], 0);
    assert_eq!(sheet["course"], "Main Course");
}

#[tokio::test]
async fn routes_enforce_roles() {
    let app = app();
    let admin = admin_token(&app).await;
    let member = register(&app, "marshal").await;

    let (status, body) = send(&app, Method::GET, "/api/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, body) = send(&app, Method::GET, "/api/bookings", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);

    let (status, body) = send(&app, Method::GET, "/api/bookings", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2002);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/days/generate",
        Some(&member),
        Some(json!({"date": DAY})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let app = app();
    register(&app, "nelly").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "NELLY", "password": "wrong-club"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "NELLY", "password": "sand-wedge"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "member");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/login",
        None,
        Some(json!({"username": "starter", "password": "guess"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_is_rate_limited() {
    let app = app();
    let payload = json!({"name": "Spam", "username": "spam", "password": "short"});

    for _ in 0..3 {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/register",
            None,
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 3004);
    }
    let (status, body) = send(&app, Method::POST, "/api/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], 1008);
}

#[tokio::test]
async fn admin_schedule_errors() {
    let app = app();
    let admin = admin_token(&app).await;
    let create = json!({"starts_at": "2026-05-02T07:00:00Z", "capacity": 3});

    let (status, slot) = send(
        &app,
        Method::POST,
        "/api/admin/slots",
        Some(&admin),
        Some(create.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{slot}");
    assert_eq!(slot["course"], "Main Course");
    assert_eq!(slot["capacity"], 3);
    assert!(slot["created_by_member_id"].is_null());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/slots",
        Some(&admin),
        Some(create),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4002);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/slots",
        Some(&admin),
        Some(json!({"starts_at": "2026-05-02T08:00:00Z", "capacity": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4003);

    let delete = format!("/api/admin/slots/{}", slot["id"].as_str().unwrap());
    assert_eq!(send(&app, Method::DELETE, &delete, Some(&admin), None).await.0, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &delete, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn reset_clears_the_day() {
    let app = app();
    let admin = admin_token(&app).await;
    assert_eq!(generate(&app, &admin, 4).await.len(), 22);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/days/reset",
        Some(&admin),
        Some(json!({"date": DAY, "course": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 22);

    let (_, sheet) = send(
        &app,
        Method::GET,
        &format!("/api/tee-sheet?date={DAY}"),
        None,
        None,
    )
    .await;
    assert!(sheet["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tee_sheet_rejects_bad_dates_and_unknown_slots() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/tee-sheet?date=02/05/2026",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/slots/00000000-0000-0000-0000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let app = app();
    let admin = admin_token(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/slots",
        Some(&admin),
        Some(json!({"capacity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
    assert!(body["details"]["reason"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .body(Body::from("name=x"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 2);
}
