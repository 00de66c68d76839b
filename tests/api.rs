use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use health_tracker::{
    auth::TokenAuth,
    errors::AppError,
    llm::{ChatCompletion, ChatMessage},
    models::AppData,
    router, AppState, JsonFileStore,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

const TOKEN: &str = "api-token";

#[derive(Default)]
struct CannedAssistant {
    calls: Mutex<usize>,
}

#[async_trait]
impl ChatCompletion for CannedAssistant {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, AppError> {
        *self.calls.lock().unwrap() += 1;
        Ok("Tetap semangat!".to_string())
    }
}

fn test_app() -> (Router, Arc<CannedAssistant>) {
    let path = std::env::temp_dir().join(format!("health_tracker_api_{}.json", Uuid::new_v4()));
    let store = JsonFileStore::new(path, AppData::default());
    let assistant = Arc::new(CannedAssistant::default());
    let auth = TokenAuth::new(HashMap::from([(TOKEN.to_string(), "alice".to_string())]));
    let state = AppState::new(Arc::new(store), assistant.clone(), auth);
    (router(state), assistant)
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn sleep_command_shows_up_in_summary() {
    let (app, assistant) = test_app();

    let (status, reply) = send(
        &app,
        request(Method::POST, "/api/chat", Some(json!({ "message": "catat tidur 8 jam" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["action"], "Data tidur berhasil ditambahkan");
    assert_eq!(*assistant.calls.lock().unwrap(), 0);

    let (status, summary) = send(&app, request(Method::GET, "/api/summary", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["sleep_hours"], 8.0);
    assert_eq!(summary["mood"], "-");
}

#[tokio::test]
async fn free_text_goes_to_the_assistant() {
    let (app, assistant) = test_app();

    let (status, reply) = send(
        &app,
        request(Method::POST, "/api/chat", Some(json!({ "message": "tips tidur nyenyak?" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["response"], "Tetap semangat!");
    assert!(reply.get("action").is_none());
    assert_eq!(*assistant.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn invalid_input_is_a_bad_request() {
    let (app, _) = test_app();

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/chat", Some(json!({ "message": "tambah 0 air" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("greater than zero"));

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/chat", Some(json!({ "message": "   " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/logs", Some(json!({ "kind": "water" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        request(Method::PUT, "/api/logs/not-a-uuid", Some(json!({ "kind": "steps", "steps": 3 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_token_is_rejected_before_any_work() {
    let (app, assistant) = test_app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "message": "halo" }).to_string()))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No authorization header");
    assert_eq!(*assistant.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn history_and_stats_reflect_logged_entries() {
    let (app, _) = test_app();

    for body in [
        json!({ "kind": "water", "amount_ml": 300 }),
        json!({ "kind": "water", "amount_ml": 200 }),
        json!({ "kind": "steps", "steps": 4200 }),
        json!({ "kind": "mood", "mood": "good", "notes": "fresh" }),
    ] {
        let (status, _) = send(&app, request(Method::POST, "/api/logs", Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, history) = send(&app, request(Method::GET, "/api/history", None)).await;
    assert_eq!(status, StatusCode::OK);
    let days = history.as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["entries"].as_array().unwrap().len(), 4);

    let (status, stats) = send(&app, request(Method::GET, "/api/stats", None)).await;
    assert_eq!(status, StatusCode::OK);
    let points = stats["last_7_days"].as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["water_ml"], 500);
    assert_eq!(points[6]["steps"], 4200);
    assert_eq!(stats["averages"]["days_logged"], 1);
}

#[tokio::test]
async fn chat_messages_and_profile_round_trip() {
    let (app, _) = test_app();

    let (status, turn) = send(
        &app,
        request(
            Method::POST,
            "/api/chat/messages",
            Some(json!({ "role": "user", "content": "halo" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(turn["role"], "user");

    let (_, turns) = send(&app, request(Method::GET, "/api/chat/messages", None)).await;
    assert_eq!(turns.as_array().unwrap().len(), 1);

    let (status, profile) = send(
        &app,
        request(Method::PUT, "/api/profile", Some(json!({ "full_name": "Alice" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["full_name"], "Alice");

    let (_, profile) = send(&app, request(Method::GET, "/api/profile", None)).await;
    assert_eq!(profile["user_id"], "alice");
    assert_eq!(profile["full_name"], "Alice");
}
