use chorus_core::{ServerMessage, Signal};

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_offer_and_answer_reach_their_targets_verbatim() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let u1 = server.create_room("one").await;
    let u2 = server.join_ok("AAAAAA", "two").await;
    server.signaling.clear();

    server.offer(&u1, &u2.participant_id, "v=0 offer").await;

    let Some(ServerMessage::Offer(offer)) = server.signaling.messages_for(u2.connection).pop() else {
        panic!("u2 did not receive the offer");
    };
    assert_eq!(offer.from_id, u1.participant_id);
    assert_eq!(offer.target_id, u2.participant_id);
    assert_eq!(offer.payload.sdp, "v=0 offer");
    assert!(server.signaling.messages_for(u1.connection).is_empty());

    let answer = Signal::answer(
        u2.participant_id.clone(),
        u1.participant_id.clone(),
        u2.room_code.clone(),
        "v=0 answer".into(),
    );
    server.send(u2.connection, answer.into()).await;
    server.snapshot().await;

    let Some(ServerMessage::Answer(answer)) = server.signaling.messages_for(u1.connection).pop() else {
        panic!("u1 did not receive the answer");
    };
    assert_eq!(answer.from_id, u2.participant_id);
    assert_eq!(answer.payload.sdp, "v=0 answer");
}

#[tokio::test]
async fn test_ice_candidates_are_forwarded() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let u1 = server.create_room("one").await;
    let u2 = server.join_ok("AAAAAA", "two").await;
    server.signaling.clear();

    server
        .candidate(&u2, &u1.participant_id, "candidate:1 1 udp 1 10.0.0.2 4000 typ host")
        .await;

    let Some(ServerMessage::IceCandidate(ice)) = server.signaling.messages_for(u1.connection).pop()
    else {
        panic!("u1 did not receive the candidate");
    };
    assert_eq!(ice.from_id, u2.participant_id);
    assert_eq!(ice.payload.sdp_mid.as_deref(), Some("0"));
}

#[tokio::test]
async fn test_sender_identity_is_stamped_by_server() {
    init_tracing();
    let server = TestServer::start(&["AAAAAA"]);
    let u1 = server.create_room("one").await;
    let u2 = server.join_ok("AAAAAA", "two").await;
    let u3 = server.join_ok("AAAAAA", "three").await;
    server.signaling.clear();

    // u3 claims to be u1.
    let spoofed = Signal::offer(
        u1.participant_id.clone(),
        u2.participant_id.clone(),
        u3.room_code.clone(),
        "sdp".into(),
    );
    server.send(u3.connection, spoofed.into()).await;
    server.snapshot().await;

    let Some(ServerMessage::Offer(offer)) = server.signaling.messages_for(u2.connection).pop() else {
        panic!("u2 did not receive the offer");
    };
    assert_eq!(offer.from_id, u3.participant_id);
}
