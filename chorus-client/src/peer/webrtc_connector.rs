use crate::error::ClientError;
use crate::peer::{IceState, LinkEvent, PeerConnection, PeerConnector};
use async_trait::async_trait;
use chorus_core::{IceCandidate, ParticipantId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;

fn peer_error(e: webrtc::Error) -> ClientError {
    ClientError::Peer(e.to_string())
}

fn ice_state(state: RTCIceConnectionState) -> Option<IceState> {
    Some(match state {
        RTCIceConnectionState::New => IceState::New,
        RTCIceConnectionState::Checking => IceState::Checking,
        RTCIceConnectionState::Connected => IceState::Connected,
        RTCIceConnectionState::Completed => IceState::Completed,
        RTCIceConnectionState::Disconnected => IceState::Disconnected,
        RTCIceConnectionState::Failed => IceState::Failed,
        RTCIceConnectionState::Closed => IceState::Closed,
        RTCIceConnectionState::Unspecified => return None,
    })
}

/// Creates audio peer connections with the `webrtc` crate.
pub struct WebRtcConnector {
    api: API,
    ice_servers: Vec<String>,
}

impl WebRtcConnector {
    pub fn new(ice_servers: Vec<String>) -> anyhow::Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api, ice_servers })
    }

    fn rtc_config(&self) -> RTCConfiguration {
        let ice_servers = if self.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: self.ice_servers.clone(),
                ..Default::default()
            }]
        };

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PeerConnector for WebRtcConnector {
    async fn connect(
        &self,
        remote: &ParticipantId,
        epoch: u64,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Result<Arc<dyn PeerConnection>, ClientError> {
        let pc = Arc::new(
            self.api
                .new_peer_connection(self.rtc_config())
                .await
                .map_err(peer_error)?,
        );

        // No local track is ever added, so this side only receives audio.
        pc.add_transceiver_from_kind(RTPCodecType::Audio, None)
            .await
            .map_err(peer_error)?;

        let state_tx = events.clone();
        let state_remote = remote.clone();
        pc.on_ice_connection_state_change(Box::new(move |s: RTCIceConnectionState| {
            let tx = state_tx.clone();
            let remote = state_remote.clone();

            Box::pin(async move {
                let Some(state) = ice_state(s) else { return };
                let _ = tx.send(LinkEvent::IceStateChanged {
                    remote,
                    epoch,
                    state,
                });
            })
        }));

        let ice_tx = events;
        let ice_remote = remote.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let remote = ice_remote.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(LinkEvent::LocalCandidate {
                    remote,
                    epoch,
                    candidate: IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                    },
                });
            })
        }));

        Ok(Arc::new(WebRtcPeer { pc }))
    }
}

struct WebRtcPeer {
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerConnection for WebRtcPeer {
    async fn create_offer(&self) -> Result<String, ClientError> {
        let offer = self.pc.create_offer(None).await.map_err(peer_error)?;
        self.pc
            .set_local_description(offer.clone())
            .await
            .map_err(peer_error)?;
        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, ClientError> {
        let offer = RTCSessionDescription::offer(sdp).map_err(peer_error)?;
        self.pc
            .set_remote_description(offer)
            .await
            .map_err(peer_error)?;

        let answer = self.pc.create_answer(None).await.map_err(peer_error)?;
        self.pc
            .set_local_description(answer.clone())
            .await
            .map_err(peer_error)?;
        Ok(answer.sdp)
    }

    async fn accept_answer(&self, sdp: String) -> Result<(), ClientError> {
        let answer = RTCSessionDescription::answer(sdp).map_err(peer_error)?;
        self.pc
            .set_remote_description(answer)
            .await
            .map_err(peer_error)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), ClientError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.pc.add_ice_candidate(init).await.map_err(peer_error)
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            debug!("Peer connection close: {}", e);
        }
    }
}
