use chorus_core::{ParticipantId, RoomCode, Signal};

use crate::integration::init_tracing;
use crate::utils::{Outbound, TestServer};

#[tokio::test]
async fn test_signal_to_departed_peer_is_dropped() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let u1 = server.create_room("one").await;
    let u2 = server.join_ok("AAAAAA", "two").await;
    server.disconnect(u2.connection).await;
    server.signaling.clear();

    server.offer(&u1, &u2.participant_id, "late offer").await;

    assert!(server.signaling.all().is_empty());
}

#[tokio::test]
async fn test_signal_to_unknown_id_is_dropped() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let u1 = server.create_room("one").await;
    server.join_ok("AAAAAA", "two").await;
    server.signaling.clear();

    server
        .offer(&u1, &ParticipantId::from("nobody"), "offer")
        .await;

    assert!(server.signaling.all().is_empty());
}

#[tokio::test]
async fn test_signal_is_not_relayed_across_rooms() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA", "BBBBBB"]);
    let a = server.create_room("a").await;
    let b = server.create_room("b").await;
    server.signaling.clear();

    // Right target id, but the target lives in another room.
    server.offer(&a, &b.participant_id, "offer").await;

    // Claiming the other room's code does not help either.
    let cross = Signal::offer(
        a.participant_id.clone(),
        b.participant_id.clone(),
        RoomCode::parse("BBBBBB").unwrap(),
        "offer".into(),
    );
    server.send(a.connection, cross.into()).await;
    server.snapshot().await;

    assert!(
        !server
            .signaling
            .all()
            .iter()
            .any(|o| matches!(o, Outbound::Frame { connection, .. } if *connection == b.connection))
    );
}

#[tokio::test]
async fn test_signal_from_socket_outside_any_room_is_dropped() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let u1 = server.create_room("one").await;
    let stranger = server.connect();
    server.signaling.clear();

    let signal = Signal::offer(
        ParticipantId::from("stranger"),
        u1.participant_id.clone(),
        u1.room_code.clone(),
        "offer".into(),
    );
    server.send(stranger, signal.into()).await;
    server.snapshot().await;

    assert!(server.signaling.all().is_empty());
}
