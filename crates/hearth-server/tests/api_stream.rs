mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use futures_util::StreamExt;
use hearth_types::{OutputEvent, RequestContext};
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn stream_pages_forward_and_filters_by_room() {
    let server = test_server();
    for i in 1..=4 {
        let (status, _) = server
            .input(room_batch(vec![message_event(&format!("$m{i}"), i)]))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    server
        .state
        .publisher()
        .write_output_events(
            &RequestContext::background(),
            "!other:example.org",
            &[OutputEvent::PurgeRoom {
                room_id: "!other:example.org".to_string(),
            }],
        )
        .unwrap();

    let (status, page) = server
        .get("/api/stream/output_room_event?since=1&limit=2")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 2);
    assert_eq!(page["records"][0]["offset"], 2);
    assert_eq!(page["records"][1]["offset"], 3);
    assert_eq!(page["next_since"], 3);

    let (_, page) = server
        .get("/api/stream/output_room_event?key=!hall:example.org")
        .await;
    let ids: Vec<&str> = page["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["event"]["event"]["event_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["$m1", "$m2", "$m3", "$m4"]);

    let (_, page) = server.get("/api/stream/some_other_topic").await;
    assert_eq!(page["count"], 0);
    assert_eq!(page["next_since"], 0);
}

#[tokio::test]
async fn negative_offset_is_a_bad_request() {
    let server = test_server();
    let (status, _) = server.get("/api/stream/output_room_event?since=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn live_stream_delivers_committed_records() {
    let server = test_server();
    let response = server
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/stream/output_room_event/live?key=!hall:example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();

    let publisher = server.state.publisher().clone();
    let ctx = RequestContext::background();
    // Filtered out by key.
    publisher
        .write_output_events(
            &ctx,
            "!other:example.org",
            &[OutputEvent::PurgeRoom {
                room_id: "!other:example.org".to_string(),
            }],
        )
        .unwrap();
    publisher
        .write_output_events(
            &ctx,
            ROOM,
            &[OutputEvent::PurgeRoom {
                room_id: ROOM.to_string(),
            }],
        )
        .unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("live record should arrive")
        .expect("stream should stay open")
        .unwrap();
    let text = String::from_utf8(chunk.to_vec()).unwrap();
    assert!(text.contains("event: purge_room"), "got: {text}");
    assert!(text.contains("id: 2"), "got: {text}");
    assert!(text.contains(ROOM), "got: {text}");
}
