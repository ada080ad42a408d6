// crates/backend-lib/tests/api.rs
//! End-to-end tests driving the router over in-process requests.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use backend_lib::config::Settings;
use backend_lib::model::Event;
use backend_lib::router::create_router;
use backend_lib::store::{MemoryStore, Store};
use backend_lib::AppState;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn test_app() -> (Router, Arc<AppState<MemoryStore>>) {
    let state = Arc::new(AppState::new(MemoryStore::new(), Settings::default()));
    (create_router(state.clone()), state)
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
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn register_body(username: &str) -> Value {
    json!({
        "email": format!("{username}@example.com"),
        "username": username,
        "password": "Password123",
        "password2": "Password123",
        "first_name": "Test",
        "last_name": "User",
    })
}

/// Register a user and return an access token for them
async fn signup_and_login(app: &Router, username: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/register",
        None,
        Some(register_body(username)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": username, "password": "Password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access"].as_str().unwrap().to_string()
}

fn event_body(start: DateTime<Utc>, end: DateTime<Utc>, capacity: Option<u32>) -> Value {
    json!({
        "name": "Test Event",
        "description": "This is a test event",
        "start_date": start.to_rfc3339(),
        "end_date": end.to_rfc3339(),
        "capacity": capacity,
    })
}

async fn create_event(app: &Router, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/events/", Some(token), Some(body)).await
}

/// Insert an event directly into the store, bypassing the validator.
/// Lets tests seed events that could no longer be created, e.g. ones
/// already started.
async fn seed_event(
    state: &AppState<MemoryStore>,
    created_by: Uuid,
    start: DateTime<Utc>,
) -> Event {
    let now = Utc::now();
    state
        .store
        .insert_event(Event {
            id: Uuid::new_v4(),
            name: "Seeded Event".to_string(),
            description: "Inserted directly".to_string(),
            start_date: start,
            end_date: start + Duration::days(1),
            capacity: None,
            created_by,
            attendees: HashSet::new(),
            published_date: now,
            updated_date: now,
        })
        .await
        .unwrap()
}

fn field_error_codes(body: &Value) -> Vec<(String, String)> {
    body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["field"].as_str().unwrap().to_string(),
                e["code"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let (app, _state) = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(register_body("newuser")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "newuser");
    assert_eq!(body["message"], "User registered successfully");
    // the password never appears in the response
    assert!(body["user"].get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "newuser", "password": "Password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].as_str().is_some());
    assert!(body["refresh"].as_str().is_some());
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let (app, _state) = test_app();

    let mut body = register_body("weakuser");
    body["password"] = json!("password1"); // no uppercase
    body["password2"] = json!("password1");

    let (status, body) = send(&app, Method::POST, "/api/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let codes = field_error_codes(&body);
    assert!(codes.contains(&("password".to_string(), "PASSWORD_REQUIREMENTS".to_string())));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let (app, _state) = test_app();
    signup_and_login(&app, "original").await;

    let mut body = register_body("different");
    body["email"] = json!("original@example.com");

    let (status, body) = send(&app, Method::POST, "/api/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let codes = field_error_codes(&body);
    assert!(codes.contains(&("email".to_string(), "EMAIL_EXISTS".to_string())));
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, _state) = test_app();
    signup_and_login(&app, "loginuser").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "loginuser", "password": "WrongPassword1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "nobody", "password": "Password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let (app, _state) = test_app();
    signup_and_login(&app, "refresher").await;

    let (_, login) = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({"username": "refresher", "password": "Password123"})),
    )
    .await;
    let refresh = login["refresh"].as_str().unwrap().to_string();

    let (status, pair) = send(
        &app,
        Method::POST,
        "/api/token/refresh",
        None,
        Some(json!({"refresh": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = pair["access"].as_str().unwrap();

    // the fresh access token authenticates
    let (status, _) = send(&app, Method::GET, "/api/events/", Some(new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // the used refresh token is dead
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/token/refresh",
        None,
        Some(json!({"refresh": refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_events_require_authentication() {
    let (app, _state) = test_app();

    let (status, _) = send(&app, Method::GET, "/api/events/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/events/", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list_events() {
    let (app, _state) = test_app();
    let token = signup_and_login(&app, "creator").await;
    let now = Utc::now();

    let (status, created) = create_event(
        &app,
        &token,
        event_body(now + Duration::days(3), now + Duration::days(4), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Test Event");
    assert_eq!(created["created_by"], "creator");
    assert_eq!(created["attendees"], json!([]));

    let (status, listed) = send(&app, Method::GET, "/api/events/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["name"], "Test Event");
}

#[tokio::test]
async fn test_list_excludes_started_events() {
    let (app, state) = test_app();
    let token = signup_and_login(&app, "lister").await;
    let owner = state.store.user_by_username("lister").await.unwrap();

    let now = Utc::now();
    seed_event(&state, owner.id, now - Duration::days(1)).await;
    seed_event(&state, owner.id, now + Duration::days(1)).await;

    let (status, listed) = send(&app, Method::GET, "/api/events/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_past_event_rejected() {
    let (app, _state) = test_app();
    let token = signup_and_login(&app, "pastcreator").await;
    let now = Utc::now();

    let (status, body) = create_event(
        &app,
        &token,
        event_body(now - Duration::days(3), now - Duration::days(2), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let codes = field_error_codes(&body);
    assert!(codes.contains(&("start_date".to_string(), "START_DATE_IN_PAST".to_string())));
}

#[tokio::test]
async fn test_create_event_end_before_start_rejected() {
    let (app, _state) = test_app();
    let token = signup_and_login(&app, "ordercreator").await;
    let now = Utc::now();

    let (status, body) = create_event(
        &app,
        &token,
        event_body(now + Duration::days(2), now + Duration::days(1), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let codes = field_error_codes(&body);
    assert!(codes.contains(&("end_date".to_string(), "END_DATE_BEFORE_START".to_string())));
}

#[tokio::test]
async fn test_capacity_limits_roster() {
    let (app, _state) = test_app();
    let token_a = signup_and_login(&app, "usera").await;
    let token_b = signup_and_login(&app, "userb").await;
    let now = Utc::now();

    let (status, created) = create_event(
        &app,
        &token_a,
        event_body(now + Duration::days(1), now + Duration::days(2), Some(1)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let uri = format!("/api/events/{id}/register/");
    let (status, body) = send(&app, Method::POST, &uri, Some(&token_a), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Registered");

    let (status, body) = send(&app, Method::POST, &uri, Some(&token_b), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "CAPACITY_REACHED");
}

#[tokio::test]
async fn test_register_for_past_event_rejected() {
    let (app, state) = test_app();
    let token = signup_and_login(&app, "latecomer").await;
    let owner = state.store.user_by_username("latecomer").await.unwrap();

    let event = seed_event(&state, owner.id, Utc::now() - Duration::days(1)).await;

    let uri = format!("/api/events/{}/register/", event.id);
    let (status, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "EVENT_IN_PAST");
}

#[tokio::test]
async fn test_unregister_is_idempotent() {
    let (app, _state) = test_app();
    let token = signup_and_login(&app, "flaky").await;
    let now = Utc::now();

    let (_, created) = create_event(
        &app,
        &token,
        event_body(now + Duration::days(1), now + Duration::days(2), None),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let register_uri = format!("/api/events/{id}/register/");
    let (status, _) = send(&app, Method::POST, &register_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let unregister_uri = format!("/api/events/{id}/unregister/");
    let (status, body) = send(&app, Method::POST, &unregister_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Unregistered");

    // a second unregister is still a success
    let (status, _) = send(&app, Method::POST, &unregister_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_only_owner_can_delete() {
    let (app, _state) = test_app();
    let owner_token = signup_and_login(&app, "owner").await;
    let other_token = signup_and_login(&app, "intruder").await;
    let now = Utc::now();

    let (_, created) = create_event(
        &app,
        &owner_token,
        event_body(now + Duration::days(1), now + Duration::days(2), None),
    )
    .await;
    let uri = format!("/api/events/{}/", created["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&other_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_owner_can_patch() {
    let (app, _state) = test_app();
    let owner_token = signup_and_login(&app, "editor").await;
    let other_token = signup_and_login(&app, "meddler").await;
    let now = Utc::now();

    let (_, created) = create_event(
        &app,
        &owner_token,
        event_body(now + Duration::days(1), now + Duration::days(2), None),
    )
    .await;
    let uri = format!("/api/events/{}/", created["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&other_token),
        Some(json!({"name": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, patched) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&owner_token),
        Some(json!({"name": "Renamed Event"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["name"], "Renamed Event");
}

#[tokio::test]
async fn test_patch_rejects_negative_capacity() {
    let (app, _state) = test_app();
    let token = signup_and_login(&app, "capacitor").await;
    let now = Utc::now();

    let (_, created) = create_event(
        &app,
        &token,
        event_body(now + Duration::days(1), now + Duration::days(2), Some(5)),
    )
    .await;
    let uri = format!("/api/events/{}/", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"capacity": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let codes = field_error_codes(&body);
    assert!(codes.contains(&("capacity".to_string(), "CAPACITY_NOT_POSITIVE".to_string())));
}

#[tokio::test]
async fn test_registered_attendees_appear_in_response() {
    let (app, _state) = test_app();
    let token = signup_and_login(&app, "attendee").await;
    let now = Utc::now();

    let (_, created) = create_event(
        &app,
        &token,
        event_body(now + Duration::days(1), now + Duration::days(2), None),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let register_uri = format!("/api/events/{id}/register/");
    send(&app, Method::POST, &register_uri, Some(&token), None).await;

    let detail_uri = format!("/api/events/{id}/");
    let (status, detail) = send(&app, Method::GET, &detail_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["attendees"], json!(["attendee"]));
}
