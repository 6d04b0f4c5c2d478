mod common;

use axum::http::StatusCode;
use common::*;

const BOB: &str = "/api/rooms/!hall:example.org/members/@bob:example.org/membership";

#[tokio::test]
async fn unknown_member_is_not_found() {
    let server = test_server();
    let (status, body) = server.get(BOB).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("@bob:example.org"));
}

#[tokio::test]
async fn latest_candidate_state_wins() {
    let server = test_server();
    let (status, _) = server
        .input(room_batch(vec![
            member_event("$join", "@bob:example.org", "join", 5),
            member_event("$leave", "@bob:example.org", "leave", 7),
        ]))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, record) = server.get(&format!("{BOB}?states=join,leave")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["membership"], "leave");
    assert_eq!(record["event_id"], "$leave");
    assert_eq!(record["topological_pos"], 7);

    let (status, record) = server.get(&format!("{BOB}?states=join")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["event_id"], "$join");

    let (status, _) = server.get(&format!("{BOB}?states=ban,invite")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_state_is_a_bad_request() {
    let server = test_server();
    let (status, body) = server.get(&format!("{BOB}?states=join,lurking")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lurking"));
}

#[tokio::test]
async fn purge_removes_membership_history() {
    let server = test_server();
    server
        .input(room_batch(vec![
            member_event("$join", "@bob:example.org", "join", 1),
            message_event("$msg", 2),
        ]))
        .await;

    let (status, body) = server
        .post("/api/admin/rooms/!hall:example.org/purge", serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room_id"], ROOM);
    assert_eq!(body["events"], 2);
    assert_eq!(body["memberships"], 1);

    let (status, _) = server.get(BOB).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = server
        .get("/api/stream/output_room_event?key=!hall:example.org")
        .await;
    let last = page["records"].as_array().unwrap().last().unwrap();
    assert_eq!(last["event"]["type"], "purge_room");
    assert_eq!(last["event"]["room_id"], ROOM);
}

#[tokio::test]
async fn purging_an_unknown_room_succeeds() {
    let server = test_server();
    let (status, body) = server
        .post("/api/admin/rooms/!nowhere:example.org/purge", serde_json::json!({}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"], 0);
    assert_eq!(body["memberships"], 0);
}
