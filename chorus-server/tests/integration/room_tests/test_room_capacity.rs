use chorus_core::ServerMessage;
use chorus_server::ServerConfig;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_eleventh_join_is_rejected() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let host = server.create_room("host").await;
    for i in 0..9 {
        server.join_ok("AAAAAA", &format!("p{i}")).await;
    }
    assert_eq!(server.room_size("AAAAAA").await, Some(10));
    server.signaling.clear();

    let (late, response) = server.join("AAAAAA", "late").await;

    assert_eq!(
        response,
        ServerMessage::Error {
            error: "Room is full (max 10 users)".into()
        }
    );
    assert_eq!(server.room_size("AAAAAA").await, Some(10));
    // Nobody heard about the rejected joiner.
    assert!(server.signaling.messages_for(host.connection).is_empty());
    assert_eq!(server.signaling.messages_for(late).len(), 1);
}

#[tokio::test]
async fn test_capacity_is_configurable() {
    init_tracing();
    let config = ServerConfig {
        max_room_size: 2,
        ..ServerConfig::default()
    };
    let server = TestServer::start_with(config, &["AAAAAA"]);
    server.create_room("host").await;
    server.join_ok("AAAAAA", "second").await;

    let (_, response) = server.join("AAAAAA", "third").await;

    assert_eq!(
        response,
        ServerMessage::Error {
            error: "Room is full (max 2 users)".into()
        }
    );
}

#[tokio::test]
async fn test_room_frees_a_seat_after_leave() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    server.create_room("host").await;
    let mut sockets = Vec::new();
    for i in 0..9 {
        sockets.push(server.join_ok("AAAAAA", &format!("p{i}")).await);
    }

    server.disconnect(sockets[3].connection).await;

    let joined = server.join_ok("AAAAAA", "late").await;
    assert_eq!(joined.room_code.as_str(), "AAAAAA");
    assert_eq!(server.room_size("AAAAAA").await, Some(10));
}
