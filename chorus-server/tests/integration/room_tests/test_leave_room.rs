use chorus_core::{ClientMessage, ServerMessage};

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_leave_twice_equals_leave_once() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let host = server.create_room("host").await;
    let guest = server.join_ok("AAAAAA", "guest").await;
    server.signaling.clear();

    for _ in 0..2 {
        server
            .send(
                guest.connection,
                ClientMessage::LeaveRoom {
                    room_code: "AAAAAA".into(),
                },
            )
            .await;
    }
    server.snapshot().await;

    assert_eq!(
        server.signaling.messages_for(host.connection),
        vec![ServerMessage::UserLeft {
            id: guest.participant_id.clone()
        }]
    );
    assert_eq!(server.room_size("AAAAAA").await, Some(1));
}

#[tokio::test]
async fn test_last_leave_destroys_room_immediately() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA", "BBBBBB"]);
    let host = server.create_room("host").await;

    server
        .send(
            host.connection,
            ClientMessage::LeaveRoom {
                room_code: "AAAAAA".into(),
            },
        )
        .await;

    assert!(server.snapshot().await.is_empty());
    let (_, response) = server.join("AAAAAA", "late").await;
    assert_eq!(
        response,
        ServerMessage::Error {
            error: "Room not found".into()
        }
    );
}

#[tokio::test]
async fn test_leave_for_other_room_is_ignored() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let host = server.create_room("host").await;

    server
        .send(
            host.connection,
            ClientMessage::LeaveRoom {
                room_code: "BBBBBB".into(),
            },
        )
        .await;

    assert_eq!(server.room_size("AAAAAA").await, Some(1));
}
