use chorus_core::{ClientMessage, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_create_room_assigns_code_and_id() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);

    let host = server.create_room("host").await;

    assert_eq!(host.room_code.as_str(), "AAAAAA");
    assert_eq!(host.participant_id.as_str(), "u1");
    assert_eq!(server.room_size("AAAAAA").await, Some(1));
}

#[tokio::test]
async fn test_join_returns_members_excluding_joiner() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let host = server.create_room("host").await;

    let (_, response) = server.join("AAAAAA", "guest").await;

    let ServerMessage::RoomJoined {
        participant_id,
        members,
        room_code,
    } = response
    else {
        panic!("expected room-joined, got {:?}", response);
    };
    assert_eq!(room_code.as_str(), "AAAAAA");
    assert_eq!(participant_id.as_str(), "u2");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, host.participant_id);
    assert_eq!(members[0].display_name.as_str(), "host");
}

#[tokio::test]
async fn test_join_unknown_room_reports_not_found() {
    init_tracing();
    let server = TestServer::start(&[]);

    let (_, response) = server.join("NOPE42", "guest").await;

    assert_eq!(
        response,
        ServerMessage::Error {
            error: "Room not found".into()
        }
    );
    assert!(server.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_display_names_are_sanitized() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    server.create_room("  <script>a-really-long-display-name</script>").await;

    let rooms = server.snapshot().await;
    let name = rooms[0].members[0].display_name.as_str().to_owned();

    assert!(name.chars().count() <= 20);
    assert!(!name.contains('<'));
}

#[tokio::test]
async fn test_rejoin_from_same_socket_gets_fresh_id() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let host = server.create_room("host").await;
    let guest = server.join_ok("AAAAAA", "guest").await;

    server
        .send(
            guest.connection,
            ClientMessage::JoinRoom {
                room_code: "AAAAAA".into(),
                display_name: "guest".into(),
            },
        )
        .await;
    server.snapshot().await;

    let Some(ServerMessage::RoomJoined { participant_id, members, .. }) =
        server.signaling.messages_for(guest.connection).last().cloned()
    else {
        panic!("expected second room-joined");
    };

    assert_ne!(participant_id, guest.participant_id);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, host.participant_id);
    assert_eq!(server.room_size("AAAAAA").await, Some(2));
}
