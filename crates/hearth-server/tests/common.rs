#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use hearth_db::{open_database, DbRuntimeSettings};
use hearth_server::{app, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

pub const TOPIC: &str = "output_room_event";
pub const ROOM: &str = "!hall:example.org";

pub struct TestServer {
    _dir: TempDir,
    pub state: AppState,
    pub app: Router,
}

/// Builds the full router over a file-backed database in a temp dir.
pub fn test_server() -> TestServer {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("hearth.db");
    let pool = open_database(path.to_str().unwrap(), DbRuntimeSettings::default())
        .expect("should open database");
    let state = AppState::new(pool, TOPIC, 64);
    let app = app(state.clone());
    TestServer {
        _dir: dir,
        state,
        app,
    }
}

impl TestServer {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, headers, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = self
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        (status, body)
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send(post_json(uri, &body)).await;
        (status, body)
    }

    pub async fn input(&self, batch: Value) -> (StatusCode, Value) {
        self.post("/api/roomserver/inputRoomEvents", batch).await
    }
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn message_event(event_id: &str, depth: i64) -> Value {
    json!({
        "event_id": event_id,
        "room_id": ROOM,
        "sender": "@alice:example.org",
        "type": "m.room.message",
        "content": { "body": "hi" },
        "depth": depth,
        "prev_events": [],
        "origin_server_ts": 1_700_000_000_000_i64
    })
}

pub fn member_event(event_id: &str, user_id: &str, membership: &str, depth: i64) -> Value {
    json!({
        "event_id": event_id,
        "room_id": ROOM,
        "sender": user_id,
        "type": "m.room.member",
        "state_key": user_id,
        "content": { "membership": membership },
        "depth": depth,
        "prev_events": [],
        "origin_server_ts": 1_700_000_000_000_i64
    })
}

pub fn room_batch(events: Vec<Value>) -> Value {
    json!({
        "input_room_events": events
            .into_iter()
            .map(|event| json!({ "kind": "new", "event": event }))
            .collect::<Vec<_>>()
    })
}
