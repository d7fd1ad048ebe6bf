//! Hub integration tests
//!
//! Each test spawns its own hub on a loopback port; no external services
//! are needed.
//!
//! Run with: cargo test -p integration-tests --test hub_tests

use integration_tests::{dispatches, test_config, TestServer};
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// HTTP surface
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/health").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_presence_rejects_blank_user() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/presence/%20").await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Presence
// ============================================================================

#[tokio::test]
async fn test_hello_carries_heartbeat_interval() {
    let config = test_config(&[("HEARTBEAT_INTERVAL_MS", "1500"), ("HEARTBEAT_TIMEOUT_MS", "6000")]).unwrap();
    let server = TestServer::start_with_config(config).await.unwrap();

    let client = server.connect(None).await.unwrap();
    assert_eq!(client.hello, json!({ "heartbeat_interval": 1500 }));
}

#[tokio::test]
async fn test_connect_announces_user_online() {
    let server = TestServer::start().await.unwrap();
    let mut watcher = server.connect(None).await.unwrap();

    let _u1 = server.connect(Some("U1")).await.unwrap();

    let frame = watcher.next_dispatch("UserOnline").await.unwrap();
    assert_eq!(frame["d"], "U1");
    assert_eq!(frame["s"], 1);

    let presence = server.presence("U1").await.unwrap();
    assert_eq!(presence["IsOnline"], true);
    assert!(presence["ConnectionId"].is_string());
}

#[tokio::test]
async fn test_header_identity() {
    let server = TestServer::start().await.unwrap();

    let _u9 = server.connect_with_header("x-user-id", "U9").await.unwrap();

    server.wait_for_online("U9", true).await.unwrap();
}

#[tokio::test]
async fn test_disconnect_announces_user_offline() {
    let server = TestServer::start().await.unwrap();
    let mut u2 = server.connect(Some("U2")).await.unwrap();
    let u1 = server.connect(Some("U1")).await.unwrap();
    u2.next_dispatch("UserOnline").await.unwrap();

    u1.close().await.unwrap();

    let frame = u2.next_dispatch("UserOffline").await.unwrap();
    assert_eq!(frame["d"], "U1");
    server.wait_for_online("U1", false).await.unwrap();
    server.wait_for_online("U2", true).await.unwrap();
}

#[tokio::test]
async fn test_anonymous_connection_is_invisible() {
    let server = TestServer::start().await.unwrap();
    let mut watcher = server.connect(Some("U1")).await.unwrap();
    watcher.sync().await.unwrap();

    let mut anon = server.connect(None).await.unwrap();
    anon.join(5).await.unwrap();
    anon.typing(5).await.unwrap();
    anon.message(5, "hello").await.unwrap();
    anon.sync().await.unwrap();

    let seen = watcher.sync().await.unwrap();
    assert_eq!(dispatches(&seen, "UserOnline").count(), 0);

    // Anonymous clients stay connected and can still listen in
    watcher.join(5).await.unwrap();
    watcher.message(5, "hi").await.unwrap();
    let frame = anon.next_dispatch("ReceiveMessage").await.unwrap();
    assert_eq!(frame["d"]["SenderId"], "U1");
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test]
async fn test_typing_reaches_room_members_only() {
    let server = TestServer::start().await.unwrap();
    let mut u1 = server.connect(Some("U1")).await.unwrap();
    let mut u2 = server.connect(Some("U2")).await.unwrap();
    let mut outsider = server.connect(Some("U3")).await.unwrap();

    u1.join(3).await.unwrap();
    u2.join(3).await.unwrap();
    u1.sync().await.unwrap();
    u2.sync().await.unwrap();
    outsider.sync().await.unwrap();

    u1.typing(3).await.unwrap();
    let frame = u2.next_dispatch("UserTyping").await.unwrap();
    assert_eq!(frame["d"], json!({ "ChatId": 3, "UserId": "U1", "IsTyping": true }));

    let presence = server.presence("U1").await.unwrap();
    assert_eq!(presence["IsTyping"], true);
    assert_eq!(presence["ChatId"], 3);

    u1.stop_typing(3).await.unwrap();
    let frame = u2.next_dispatch("UserTyping").await.unwrap();
    assert_eq!(frame["d"]["IsTyping"], false);
    assert_eq!(server.presence("U1").await.unwrap()["IsTyping"], false);

    let seen = outsider.sync().await.unwrap();
    assert_eq!(dispatches(&seen, "UserTyping").count(), 0);
}

#[tokio::test]
async fn test_disconnect_while_typing_clears_state() {
    let server = TestServer::start().await.unwrap();
    let mut u1 = server.connect(Some("U1")).await.unwrap();

    u1.join(5).await.unwrap();
    u1.typing(5).await.unwrap();
    u1.sync().await.unwrap();
    assert_eq!(server.presence("U1").await.unwrap()["IsTyping"], true);

    u1.close().await.unwrap();

    server.wait_for_online("U1", false).await.unwrap();
    let presence = server.presence("U1").await.unwrap();
    assert_eq!(presence["IsTyping"], false);
    assert!(presence.get("ChatId").is_none());
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_message_goes_to_its_room_only() {
    let server = TestServer::start().await.unwrap();
    let mut sender = server.connect(Some("U1")).await.unwrap();
    let mut member = server.connect(Some("U2")).await.unwrap();
    let mut elsewhere = server.connect(Some("U3")).await.unwrap();

    sender.join(5).await.unwrap();
    member.join(5).await.unwrap();
    elsewhere.join(6).await.unwrap();
    for client in [&mut sender, &mut member, &mut elsewhere] {
        client.sync().await.unwrap();
    }

    sender.message(5, "hello").await.unwrap();

    let frame = member.next_dispatch("ReceiveMessage").await.unwrap();
    let d = &frame["d"];
    assert_eq!(d["ChatId"], 5);
    assert_eq!(d["Message"], "hello");
    assert_eq!(d["SenderId"], "U1");
    assert!(d["Timestamp"].is_string());

    // The sender is a room member too
    let echo = sender.next_dispatch("ReceiveMessage").await.unwrap();
    assert_eq!(echo["d"]["Message"], "hello");

    let seen = elsewhere.sync().await.unwrap();
    assert_eq!(dispatches(&seen, "ReceiveMessage").count(), 0);
}

#[tokio::test]
async fn test_left_room_receives_nothing() {
    let server = TestServer::start().await.unwrap();
    let mut sender = server.connect(Some("U1")).await.unwrap();
    let mut leaver = server.connect(Some("U2")).await.unwrap();

    sender.join(7).await.unwrap();
    leaver.join(7).await.unwrap();
    leaver.leave(7).await.unwrap();
    sender.sync().await.unwrap();
    leaver.sync().await.unwrap();

    sender.message(7, "anyone?").await.unwrap();
    sender.next_dispatch("ReceiveMessage").await.unwrap();

    let seen = leaver.sync().await.unwrap();
    assert_eq!(dispatches(&seen, "ReceiveMessage").count(), 0);
}

#[tokio::test]
async fn test_blank_message_is_dropped() {
    let server = TestServer::start().await.unwrap();
    let mut sender = server.connect(Some("U1")).await.unwrap();
    sender.join(5).await.unwrap();

    sender.message(5, "   ").await.unwrap();

    let seen = sender.sync().await.unwrap();
    assert_eq!(dispatches(&seen, "ReceiveMessage").count(), 0);
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_malformed_frame_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(Some("U1")).await.unwrap();
    server.wait_for_online("U1", true).await.unwrap();

    client.send_raw("not json").await.unwrap();

    assert_eq!(client.expect_close_code().await.unwrap(), 4002);
    server.wait_for_online("U1", false).await.unwrap();
}

#[tokio::test]
async fn test_binary_frame_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(None).await.unwrap();

    client.send_binary(vec![1, 2, 3]).await.unwrap();

    assert_eq!(client.expect_close_code().await.unwrap(), 4002);
}

#[tokio::test]
async fn test_server_op_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let mut client = server.connect(None).await.unwrap();

    client.send(10, json!({ "heartbeat_interval": 1 })).await.unwrap();

    assert_eq!(client.expect_close_code().await.unwrap(), 4001);
}

#[tokio::test]
async fn test_silent_connection_times_out() {
    let config = test_config(&[("HEARTBEAT_INTERVAL_MS", "100"), ("HEARTBEAT_TIMEOUT_MS", "300")]).unwrap();
    let server = TestServer::start_with_config(config).await.unwrap();
    let mut client = server.connect(Some("U1")).await.unwrap();

    assert_eq!(client.expect_close_code().await.unwrap(), 4009);
    server.wait_for_online("U1", false).await.unwrap();
}
