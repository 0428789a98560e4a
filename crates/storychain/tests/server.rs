//! End-to-end tests: a real server, real WebSocket clients.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use storychain::WELCOME_MESSAGE;
use storychain::prelude::*;
use storychain_ai::FALLBACK_TWIST;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Mock provider
// =========================================================================

/// Answers every request with the same text.
struct Scripted(&'static str);

impl ContentProvider for Scripted {
    async fn generate_twist(&self, _story: &str) -> Result<String, ContentError> {
        Ok(self.0.to_owned())
    }

    async fn suggest_next_player(&self, _names: &[String]) -> Result<String, ContentError> {
        Ok(self.0.to_owned())
    }

    async fn generate_prompt(&self, _story: &str, _names: &[String]) -> Result<String, ContentError> {
        Ok(self.0.to_owned())
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on random ports and returns it before `run`, so the
/// caller can grab the router too.
async fn build_server<P: ContentProvider>(
    provider: P,
    auto_twists: bool,
) -> StorychainServer<P, storychain_protocol::JsonCodec> {
    StorychainServerBuilder::new()
        .bind("127.0.0.1:0")
        .http_bind("127.0.0.1:0")
        .auto_twists(auto_twists)
        .content_timeout(Duration::from_millis(500))
        .build(provider)
        .await
        .expect("server should build")
}

fn spawn_server<P: ContentProvider>(server: StorychainServer<P, storychain_protocol::JsonCodec>) -> String {
    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn start_server() -> String {
    spawn_server(build_server(OfflineProvider, false).await)
}

/// Connects and consumes the welcome event.
async fn connect(addr: &str) -> ClientWs {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    match recv(&mut ws).await {
        ServerEvent::Connected { .. } => {}
        other => panic!("expected connected, got {other:?}"),
    }
    ws
}

async fn send(ws: &mut ClientWs, command: Value) {
    ws.send(Message::Text(command.to_string().into()))
        .await
        .expect("send");
}

async fn recv(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("event should arrive in time")
        .expect("stream open")
        .expect("frame ok");
    serde_json::from_slice(&msg.into_data()).expect("decode event")
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "expected no event, got {result:?}");
}

fn expect_error(event: ServerEvent, expected_kind: &str) {
    match event {
        ServerEvent::Error { kind, .. } => assert_eq!(kind, expected_kind),
        other => panic!("expected {expected_kind} error, got {other:?}"),
    }
}

/// `ada` creates `code`, `grace` joins it. Both queues are drained.
async fn two_player_room(addr: &str, code: &str, max_rounds: u32, ai_mode: &str) -> (ClientWs, ClientWs) {
    let mut ada = connect(addr).await;
    send(
        &mut ada,
        json!({
            "type": "create_room",
            "roomId": code,
            "creator": { "id": "ada", "name": "Ada" },
            "maxRounds": max_rounds,
            "aiMode": ai_mode,
        }),
    )
    .await;
    assert!(matches!(recv(&mut ada).await, ServerEvent::RoomCreated { .. }));

    let mut grace = connect(addr).await;
    send(
        &mut grace,
        json!({ "type": "join_room", "roomId": code, "player": { "id": "grace", "name": "Grace" } }),
    )
    .await;
    assert!(matches!(recv(&mut grace).await, ServerEvent::JoinedRoom { .. }));
    assert!(matches!(recv(&mut ada).await, ServerEvent::PlayerJoined { .. }));

    (ada, grace)
}

async fn submit(ws: &mut ClientWs, player: &str, content: &str) {
    send(
        ws,
        json!({ "type": "submit_turn", "playerId": player, "content": content }),
    )
    .await;
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connect_receives_welcome() {
    let addr = start_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();

    match recv(&mut ws).await {
        ServerEvent::Connected { message, .. } => assert_eq!(message, WELCOME_MESSAGE),
        other => panic!("expected connected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_room_replies_room_created() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        json!({
            "type": "create_room",
            "roomId": "abc123",
            "creator": { "id": "ada", "name": "Ada" },
            "max_rounds": 3,
        }),
    )
    .await;

    match recv(&mut ws).await {
        ServerEvent::RoomCreated { room } => {
            assert_eq!(room.id.as_str(), "ABC123");
            assert_eq!(room.max_rounds, 3);
            assert_eq!(room.ai_mode, AiMode::ManualOnly);
            assert_eq!(room.players.len(), 1);
            assert_eq!(room.current_player.unwrap().name, "Ada");
        }
        other => panic!("expected room_created, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_room_invalid_settings_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({ "type": "create_room", "maxRounds": 0 })).await;
    expect_error(recv(&mut ws).await, "invalid_settings");

    send(&mut ws, json!({ "type": "create_room", "aiMode": "sometimes" })).await;
    expect_error(recv(&mut ws).await, "invalid_settings");
}

#[tokio::test]
async fn test_join_broadcasts_to_others_only() {
    let addr = start_server().await;
    let mut ada = connect(&addr).await;
    send(
        &mut ada,
        json!({ "type": "create_room", "roomId": "JOIN01", "creator": { "id": "ada", "name": "Ada" } }),
    )
    .await;
    recv(&mut ada).await;

    let mut grace = connect(&addr).await;
    send(
        &mut grace,
        json!({ "type": "join_room", "room_id": "join01", "player": { "id": "grace", "name": "Grace" } }),
    )
    .await;

    match recv(&mut grace).await {
        ServerEvent::JoinedRoom { player, room } => {
            assert_eq!(player.id.as_str(), "grace");
            assert_eq!(room.players.len(), 2);
        }
        other => panic!("expected joined_room, got {other:?}"),
    }
    match recv(&mut ada).await {
        ServerEvent::PlayerJoined { player, .. } => assert_eq!(player.name, "Grace"),
        other => panic!("expected player_joined, got {other:?}"),
    }
    assert_silent(&mut grace).await;
}

#[tokio::test]
async fn test_join_missing_room_not_found() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        json!({ "type": "join_room", "roomId": "NOPE00", "player": { "name": "Ada" } }),
    )
    .await;

    expect_error(recv(&mut ws).await, "room_not_found");
}

#[tokio::test]
async fn test_join_second_room_already_in_room() {
    let addr = start_server().await;
    let (mut ada, _grace) = two_player_room(&addr, "FIRST1", 5, "manual_only").await;

    let mut other = connect(&addr).await;
    send(&mut other, json!({ "type": "create_room", "roomId": "OTHER1" })).await;
    recv(&mut other).await;

    send(
        &mut ada,
        json!({ "type": "join_room", "roomId": "OTHER1", "player": { "id": "ada", "name": "Ada" } }),
    )
    .await;
    expect_error(recv(&mut ada).await, "already_in_room");
}

#[tokio::test]
async fn test_submit_turn_broadcasts_to_everyone() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "TURN01", 5, "manual_only").await;

    submit(&mut ada, "ada", "Once upon a time").await;

    for ws in [&mut ada, &mut grace] {
        match recv(ws).await {
            ServerEvent::StoryUpdated {
                story_part,
                progress,
                room,
            } => {
                assert_eq!(story_part.content(), "Once upon a time");
                assert!(!progress.round_complete);
                assert_eq!(room.current_player.unwrap().id.as_str(), "grace");
            }
            other => panic!("expected story_updated, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_submit_out_of_turn_errors_only_sender() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "TURN02", 5, "manual_only").await;

    submit(&mut grace, "grace", "Me first!").await;

    expect_error(recv(&mut grace).await, "not_your_turn");
    assert_silent(&mut ada).await;
}

#[tokio::test]
async fn test_submit_blank_content_empty_content() {
    let addr = start_server().await;
    let (mut ada, _grace) = two_player_room(&addr, "TURN03", 5, "manual_only").await;

    submit(&mut ada, "ada", "   ").await;

    expect_error(recv(&mut ada).await, "empty_content");
}

#[tokio::test]
async fn test_submit_without_joining_not_in_room() {
    let addr = start_server().await;
    let (_ada, _grace) = two_player_room(&addr, "TURN04", 5, "manual_only").await;
    let mut stranger = connect(&addr).await;

    send(
        &mut stranger,
        json!({ "type": "add_story_part", "roomId": "TURN04", "playerId": "ada", "content": "Hijack" }),
    )
    .await;

    expect_error(recv(&mut stranger).await, "not_in_room");
}

#[tokio::test]
async fn test_final_round_broadcasts_story_finished() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "DONE01", 1, "manual_only").await;

    submit(&mut ada, "ada", "The start.").await;
    recv(&mut ada).await;
    recv(&mut grace).await;

    submit(&mut grace, "grace", "The end.").await;

    for ws in [&mut ada, &mut grace] {
        match recv(ws).await {
            ServerEvent::StoryUpdated { progress, room, .. } => {
                assert!(progress.finished);
                assert!(!room.is_active);
            }
            other => panic!("expected story_updated, got {other:?}"),
        }
        match recv(ws).await {
            ServerEvent::StoryFinished {
                final_round, story, ..
            } => {
                assert_eq!(final_round, 1);
                assert_eq!(story.len(), 2);
            }
            other => panic!("expected story_finished, got {other:?}"),
        }
    }

    submit(&mut ada, "ada", "Encore!").await;
    expect_error(recv(&mut ada).await, "game_finished");
}

#[tokio::test]
async fn test_shuffle_broadcasts_players_shuffled() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "SHUF01", 5, "manual_only").await;

    send(&mut grace, json!({ "type": "shuffle_players" })).await;

    for ws in [&mut ada, &mut grace] {
        match recv(ws).await {
            ServerEvent::PlayersShuffled { room } => {
                assert_eq!(room.players.len(), 2);
                assert_eq!(room.current_turn, 0);
            }
            other => panic!("expected players_shuffled, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_shuffle_from_outside_room_replies_room_info() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "SHUF02", 5, "manual_only").await;
    let mut outsider = connect(&addr).await;

    send(&mut outsider, json!({ "type": "shuffle_players", "roomId": "shuf02" })).await;

    match recv(&mut outsider).await {
        ServerEvent::RoomInfo { room } => {
            assert_eq!(room.id.as_str(), "SHUF02");
            assert_eq!(room.players.len(), 2);
            assert_eq!(room.current_turn, 0);
        }
        other => panic!("expected room_info, got {other:?}"),
    }
    for ws in [&mut ada, &mut grace] {
        assert!(matches!(recv(ws).await, ServerEvent::PlayersShuffled { .. }));
    }
}

#[tokio::test]
async fn test_create_without_creator_seats_anonymous_player() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({ "type": "create_room", "roomId": "ANON01" })).await;
    match recv(&mut ws).await {
        ServerEvent::RoomCreated { room } => {
            assert_eq!(room.players.len(), 1);
            assert_eq!(room.players[0].name, "Anonymous");
        }
        other => panic!("expected room_created, got {other:?}"),
    }

    // The connection acts as the seated anonymous player.
    send(&mut ws, json!({ "type": "submit_turn", "content": "Nobody knows who wrote this." })).await;
    match recv(&mut ws).await {
        ServerEvent::StoryUpdated { story_part, .. } => {
            assert_eq!(story_part.content(), "Nobody knows who wrote this.");
        }
        other => panic!("expected story_updated, got {other:?}"),
    }

    send(&mut ws, json!({ "type": "leave_room" })).await;
    match recv(&mut ws).await {
        ServerEvent::LeftRoom { room_deleted, .. } => assert!(room_deleted),
        other => panic!("expected left_room, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_twist_offline_uses_fallback() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "TWST01", 5, "manual_only").await;

    send(&mut ada, json!({ "type": "add_ai_twist" })).await;

    for ws in [&mut ada, &mut grace] {
        match recv(ws).await {
            ServerEvent::AutomatedTwistAdded { twist, room } => {
                assert_eq!(twist.content(), FALLBACK_TWIST);
                assert!(!twist.is_human());
                assert_eq!(room.story.len(), 1);
            }
            other => panic!("expected automated_twist_added, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_completed_round_injects_automatic_twist() {
    let addr = spawn_server(build_server(Scripted("A dragon lands."), true).await);
    let (mut ada, mut grace) = two_player_room(&addr, "AUTO01", 3, "every_round").await;

    submit(&mut ada, "ada", "Knights gather.").await;
    recv(&mut ada).await;
    recv(&mut grace).await;

    submit(&mut grace, "grace", "The sky darkens.").await;

    for ws in [&mut ada, &mut grace] {
        match recv(ws).await {
            ServerEvent::StoryUpdated { progress, .. } => {
                assert!(progress.round_complete);
                assert!(progress.automated_twist_eligible);
            }
            other => panic!("expected story_updated, got {other:?}"),
        }
        match recv(ws).await {
            ServerEvent::AutomatedTwistAdded { twist, .. } => {
                assert_eq!(twist.content(), "A dragon lands.");
                assert_eq!(twist.round(), 2);
            }
            other => panic!("expected automated_twist_added, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_leave_notifies_remaining_players() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "LEAV01", 5, "manual_only").await;

    send(&mut grace, json!({ "type": "leave_room" })).await;

    match recv(&mut grace).await {
        ServerEvent::LeftRoom { room_deleted, .. } => assert!(!room_deleted),
        other => panic!("expected left_room, got {other:?}"),
    }
    match recv(&mut ada).await {
        ServerEvent::PlayerLeft { player_id, room } => {
            assert_eq!(player_id.as_str(), "grace");
            assert_eq!(room.players.len(), 1);
        }
        other => panic!("expected player_left, got {other:?}"),
    }

    // Left connections hear nothing further from the room.
    submit(&mut ada, "ada", "Alone now.").await;
    recv(&mut ada).await;
    assert_silent(&mut grace).await;
}

#[tokio::test]
async fn test_leave_closing_round_injects_automatic_twist() {
    let addr = spawn_server(build_server(Scripted("The bridge collapses."), true).await);
    let (mut ada, mut grace) = two_player_room(&addr, "LEAV03", 3, "every_round").await;
    let mut lin = connect(&addr).await;
    send(
        &mut lin,
        json!({ "type": "join_room", "roomId": "LEAV03", "player": { "id": "lin", "name": "Lin" } }),
    )
    .await;
    recv(&mut lin).await;
    recv(&mut ada).await;
    recv(&mut grace).await;

    submit(&mut ada, "ada", "Ada writes.").await;
    submit(&mut grace, "grace", "Grace writes.").await;
    for ws in [&mut ada, &mut grace, &mut lin] {
        recv(ws).await;
        recv(ws).await;
    }

    send(&mut lin, json!({ "type": "leave_room" })).await;
    assert!(matches!(recv(&mut lin).await, ServerEvent::LeftRoom { .. }));

    match recv(&mut ada).await {
        ServerEvent::PlayerLeft { room, .. } => {
            assert_eq!(room.current_round, 2);
            assert_eq!(room.players.len(), 2);
        }
        other => panic!("expected player_left, got {other:?}"),
    }
    match recv(&mut ada).await {
        ServerEvent::AutomatedTwistAdded { twist, .. } => {
            assert_eq!(twist.content(), "The bridge collapses.");
            assert_eq!(twist.round(), 2);
        }
        other => panic!("expected automated_twist_added, got {other:?}"),
    }
}

#[tokio::test]
async fn test_last_leave_deletes_room() {
    let addr = start_server().await;
    let mut ada = connect(&addr).await;
    send(
        &mut ada,
        json!({ "type": "create_room", "roomId": "SOLO01", "creator": { "id": "ada", "name": "Ada" } }),
    )
    .await;
    recv(&mut ada).await;

    send(&mut ada, json!({ "type": "leave_room", "roomId": "SOLO01", "playerId": "ada" })).await;
    match recv(&mut ada).await {
        ServerEvent::LeftRoom {
            room_id,
            room_deleted,
            message,
        } => {
            assert_eq!(room_id.as_str(), "SOLO01");
            assert!(room_deleted);
            assert!(message.contains("deleted"));
        }
        other => panic!("expected left_room, got {other:?}"),
    }

    send(&mut ada, json!({ "type": "get_room_info", "roomId": "SOLO01" })).await;
    expect_error(recv(&mut ada).await, "room_not_found");
}

#[tokio::test]
async fn test_disconnect_keeps_player_seated() {
    let addr = start_server().await;
    let (mut ada, grace) = two_player_room(&addr, "DROP01", 5, "manual_only").await;

    drop(grace);
    tokio::time::sleep(Duration::from_millis(50)).await;

    send(&mut ada, json!({ "type": "get_players" })).await;
    match recv(&mut ada).await {
        ServerEvent::PlayersList { players, current_turn, .. } => {
            assert_eq!(players.len(), 2);
            assert_eq!(current_turn, 0);
        }
        other => panic!("expected players_list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_queries_reply_directly() {
    let addr = start_server().await;
    let (mut ada, mut grace) = two_player_room(&addr, "QURY01", 5, "manual_only").await;
    submit(&mut ada, "ada", "It was a dark night.").await;
    recv(&mut ada).await;
    recv(&mut grace).await;

    send(&mut ada, json!({ "type": "get_story_history" })).await;
    match recv(&mut ada).await {
        ServerEvent::StoryHistory { story, .. } => assert_eq!(story.len(), 1),
        other => panic!("expected story_history, got {other:?}"),
    }

    send(&mut ada, json!({ "type": "get_current_turn" })).await;
    match recv(&mut ada).await {
        ServerEvent::CurrentTurn { current_player, .. } => {
            assert_eq!(current_player.unwrap().id.as_str(), "grace");
        }
        other => panic!("expected current_turn, got {other:?}"),
    }

    send(&mut ada, json!({ "type": "list_rooms" })).await;
    match recv(&mut ada).await {
        ServerEvent::RoomList { rooms } => {
            let room = rooms.iter().find(|r| r.id.as_str() == "QURY01").unwrap();
            assert_eq!(room.player_count, 2);
        }
        other => panic!("expected room_list, got {other:?}"),
    }

    send(&mut ada, json!({ "type": "ai_suggest_next_player" })).await;
    assert!(matches!(
        recv(&mut ada).await,
        ServerEvent::AiPlayerSuggestion { .. }
    ));

    send(&mut ada, json!({ "type": "generate_prompt" })).await;
    assert!(matches!(recv(&mut ada).await, ServerEvent::StoryPrompt { .. }));

    // None of that reached the other player.
    assert_silent(&mut grace).await;
}

#[tokio::test]
async fn test_bad_frames_answered_and_survived() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    expect_error(recv(&mut ws).await, "invalid_message");

    send(&mut ws, json!({ "type": "fly_to_moon" })).await;
    expect_error(recv(&mut ws).await, "unknown_command");

    send(&mut ws, json!({ "roomId": "ABC123" })).await;
    expect_error(recv(&mut ws).await, "invalid_message");

    // Still serving.
    send(&mut ws, json!({ "type": "list_rooms" })).await;
    assert!(matches!(recv(&mut ws).await, ServerEvent::RoomList { .. }));
}

#[tokio::test]
async fn test_http_submission_reaches_ws_subscribers() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    let server = build_server(OfflineProvider, false).await;
    let router = server.router();
    let addr = spawn_server(server);
    let (mut ada, mut grace) = two_player_room(&addr, "MIXD01", 5, "manual_only").await;

    let request = Request::builder()
        .method("POST")
        .uri("/rooms/MIXD01/story")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "playerId": "ada", "content": "Sent over HTTP." }).to_string(),
        ))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for ws in [&mut ada, &mut grace] {
        match recv(ws).await {
            ServerEvent::StoryUpdated { story_part, .. } => {
                assert_eq!(story_part.content(), "Sent over HTTP.");
            }
            other => panic!("expected story_updated, got {other:?}"),
        }
    }
}
