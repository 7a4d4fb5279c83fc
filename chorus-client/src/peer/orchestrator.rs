use crate::error::ClientError;
use crate::peer::{
    IceState, InitiatorRole, LinkEvent, PeerConnection, PeerConnector, PeerLink, SignalSender,
    SignalingState,
};
use chorus_core::{IceCandidate, ParticipantId, RoomCode, Signal, SignalingError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Connectivity change of one link, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    pub remote: ParticipantId,
    pub state: IceState,
    pub label: &'static str,
}

impl LinkStatus {
    pub fn new(remote: ParticipantId, state: IceState) -> Self {
        Self {
            remote,
            state,
            label: state.label(),
        }
    }
}

#[derive(Debug, Clone)]
struct LocalIdentity {
    id: ParticipantId,
    room_code: RoomCode,
}

/// Owns one `PeerLink` per remote participant and drives each through negotiation.
///
/// Negotiation steps run as spawned tasks and come back through the `LinkEvent`
/// receiver returned by [`PeerLinkOrchestrator::new`]; feed those into
/// [`PeerLinkOrchestrator::handle_link_event`].
pub struct PeerLinkOrchestrator {
    local: Option<LocalIdentity>,
    links: HashMap<ParticipantId, PeerLink>,
    connector: Arc<dyn PeerConnector>,
    signals: Arc<dyn SignalSender>,
    events_tx: mpsc::UnboundedSender<LinkEvent>,
    next_epoch: u64,
    max_negotiation_attempts: u32,
    answer_timeout: Duration,
}

impl PeerLinkOrchestrator {
    pub fn new(
        connector: Arc<dyn PeerConnector>,
        signals: Arc<dyn SignalSender>,
        max_negotiation_attempts: u32,
        answer_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            local: None,
            links: HashMap::new(),
            connector,
            signals,
            events_tx,
            next_epoch: 0,
            max_negotiation_attempts,
            answer_timeout,
        };
        (orchestrator, events_rx)
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local.as_ref().map(|l| &l.id)
    }

    pub fn link(&self, remote: &ParticipantId) -> Option<&PeerLink> {
        self.links.get(remote)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn remote_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<_> = self.links.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Adopts a new local identity. Links made under the old one are closed.
    pub async fn set_local(&mut self, id: ParticipantId, room_code: RoomCode) {
        self.close_all().await;
        self.local = Some(LocalIdentity { id, room_code });
    }

    /// Creates the link to `remote` unless one exists; returns whether it did.
    /// On the offering side negotiation starts immediately.
    pub async fn ensure_link(&mut self, remote: &ParticipantId) -> Result<bool, ClientError> {
        let local = self.local.clone().ok_or(ClientError::NotInRoom)?;
        if *remote == local.id || self.links.contains_key(remote) {
            return Ok(false);
        }

        let link = self.open_link(&local.id, remote).await?;
        let role = link.role;
        info!("Link to {} opened as {:?} (epoch {})", remote, role, link.epoch);
        self.links.insert(remote.clone(), link);

        if role == InitiatorRole::Offerer {
            self.start_offer(remote);
        }
        Ok(true)
    }

    /// Closes the link to one departed participant.
    pub async fn remove_link(&mut self, remote: &ParticipantId) -> bool {
        match self.links.remove(remote) {
            Some(link) => {
                info!("Link to {} closed", remote);
                link.connection.close().await;
                true
            }
            None => false,
        }
    }

    /// Converges on `present`: links to absent ids are closed, missing ones are created.
    pub async fn sync(&mut self, present: &[ParticipantId]) {
        let stale: Vec<_> = self
            .links
            .keys()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect();
        for id in stale {
            self.remove_link(&id).await;
        }

        for id in present {
            if let Err(e) = self.ensure_link(id).await {
                error!("Could not open link to {}: {}", id, e);
            }
        }
    }

    /// Drops every link and recreates links to `present` under a new local identity.
    pub async fn rebuild(&mut self, id: ParticipantId, room_code: RoomCode, present: &[ParticipantId]) {
        self.set_local(id, room_code).await;
        self.sync(present).await;
    }

    pub async fn close_all(&mut self) {
        for (remote, link) in self.links.drain() {
            debug!("Closing link to {}", remote);
            link.connection.close().await;
        }
    }

    /// Closes everything and forgets the local identity.
    pub async fn reset(&mut self) {
        self.close_all().await;
        self.local = None;
    }

    /// Applies one inbound negotiation message. Errors are protocol anomalies the
    /// caller is expected to log and drop.
    pub async fn handle_signal(&mut self, signal: Signal) -> Result<(), ClientError> {
        let local = self.local.as_ref().ok_or(SignalingError::NotInRoom)?;

        if signal.room_code() != &local.room_code {
            return Err(SignalingError::RoomMismatch {
                expected: local.room_code.clone(),
                got: signal.room_code().clone(),
            }
            .into());
        }
        if signal.target_id() != &local.id {
            return Err(SignalingError::PeerNotFound(signal.target_id().clone()).into());
        }

        let remote = signal.from_id().clone();
        if !self.links.contains_key(&remote) {
            return Err(SignalingError::PeerNotFound(remote).into());
        }

        debug!("{} from {}", signal.kind(), remote);
        match signal {
            Signal::Offer(m) => self.on_offer(remote, m.payload.sdp).await,
            Signal::Answer(m) => self.on_answer(remote, m.payload.sdp),
            Signal::IceCandidate(m) => self.on_remote_candidate(remote, m.payload),
        }
    }

    /// Applies a completion or transport report. Returns the new status when the
    /// link's connectivity label changed.
    pub async fn handle_link_event(&mut self, event: LinkEvent) -> Option<LinkStatus> {
        match event {
            LinkEvent::IceStateChanged {
                remote,
                epoch,
                state,
            } => {
                let link = self.links.get_mut(&remote).filter(|l| l.epoch == epoch)?;
                if link.ice_state == state {
                    return None;
                }
                info!("{} ice {} -> {}", remote, link.ice_state, state);
                link.ice_state = state;
                if state.is_connected() {
                    link.attempts = 0;
                }
                Some(LinkStatus::new(remote, state))
            }

            LinkEvent::LocalCandidate {
                remote,
                epoch,
                candidate,
            } => {
                self.links.get(&remote).filter(|l| l.epoch == epoch)?;
                let local = self.local.clone()?;
                self.send_signal(Signal::ice_candidate(
                    local.id,
                    remote,
                    local.room_code,
                    candidate,
                ));
                None
            }

            LinkEvent::OfferCreated {
                remote,
                epoch,
                token,
                result,
            } => {
                if !self.is_current(&remote, epoch, token) {
                    debug!("Discarding stale offer for {}", remote);
                    return None;
                }
                match result {
                    Ok(sdp) => {
                        let local = self.local.clone()?;
                        self.send_signal(Signal::offer(
                            local.id,
                            remote.clone(),
                            local.room_code,
                            sdp,
                        ));
                        self.arm_answer_timeout(remote, epoch, token);
                        None
                    }
                    Err(e) => self.recover(&remote, e).await,
                }
            }

            LinkEvent::AnswerCreated {
                remote,
                epoch,
                token,
                result,
            } => {
                if !self.is_current(&remote, epoch, token) {
                    debug!("Discarding stale answer for {}", remote);
                    return None;
                }
                if let Some(link) = self.links.get_mut(&remote) {
                    link.answer_pending = false;
                }
                match result {
                    Ok(sdp) => {
                        self.remote_description_applied(&remote);
                        let local = self.local.clone()?;
                        self.send_signal(Signal::answer(local.id, remote, local.room_code, sdp));
                        None
                    }
                    Err(e) => self.recover(&remote, e).await,
                }
            }

            LinkEvent::AnswerApplied {
                remote,
                epoch,
                token,
                result,
            } => {
                if !self.is_current(&remote, epoch, token) {
                    return None;
                }
                match result {
                    Ok(()) => {
                        self.remote_description_applied(&remote);
                        None
                    }
                    Err(e) => self.recover(&remote, e).await,
                }
            }

            LinkEvent::AnswerTimedOut {
                remote,
                epoch,
                token,
            } => {
                let waiting = self.is_current(&remote, epoch, token)
                    && self
                        .links
                        .get(&remote)
                        .is_some_and(|l| l.signaling_state == SignalingState::HaveLocalOffer);
                if !waiting {
                    return None;
                }
                let cause = ClientError::Peer(format!(
                    "no answer within {:?}",
                    self.answer_timeout
                ));
                self.recover(&remote, cause).await
            }
        }
    }

    async fn open_link(
        &mut self,
        local: &ParticipantId,
        remote: &ParticipantId,
    ) -> Result<PeerLink, ClientError> {
        self.next_epoch += 1;
        let epoch = self.next_epoch;
        let connection = self
            .connector
            .connect(remote, epoch, self.events_tx.clone())
            .await?;
        Ok(PeerLink::new(local.clone(), remote.clone(), epoch, connection))
    }

    /// Swaps in a fresh connection in `stable`, keeping the attempt count.
    /// If no connection can be made the link is gone.
    async fn replace_connection(&mut self, remote: &ParticipantId) -> Result<(), ClientError> {
        let old = self
            .links
            .remove(remote)
            .ok_or_else(|| SignalingError::PeerNotFound(remote.clone()))?;
        old.connection.close().await;

        let mut link = self.open_link(&old.local_id, remote).await?;
        link.attempts = old.attempts;
        self.links.insert(remote.clone(), link);
        Ok(())
    }

    fn start_offer(&mut self, remote: &ParticipantId) {
        let Some(link) = self.links.get_mut(remote) else {
            return;
        };
        link.signaling_state = SignalingState::HaveLocalOffer;
        let token = link.next_negotiation();
        let epoch = link.epoch;
        let connection = link.connection.clone();
        let events = self.events_tx.clone();
        let remote = remote.clone();

        tokio::spawn(async move {
            let result = connection.create_offer().await;
            let _ = events.send(LinkEvent::OfferCreated {
                remote,
                epoch,
                token,
                result,
            });
        });
    }

    /// Arms a single-shot timer for the offer sent under `token`. A timer that
    /// fires after the answer arrived, or after the link was replaced, is stale.
    fn arm_answer_timeout(&self, remote: ParticipantId, epoch: u64, token: u64) {
        let events = self.events_tx.clone();
        let timeout = self.answer_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(LinkEvent::AnswerTimedOut {
                remote,
                epoch,
                token,
            });
        });
    }

    async fn on_offer(&mut self, remote: ParticipantId, sdp: String) -> Result<(), ClientError> {
        let (glare, superseded) = self
            .links
            .get(&remote)
            .map(|l| {
                (
                    l.signaling_state == SignalingState::HaveLocalOffer,
                    l.answer_pending,
                )
            })
            .unwrap_or_default();
        if glare {
            info!("Offer collision with {}: taking the remote offer", remote);
            self.replace_connection(&remote).await?;
        } else if superseded {
            // Never run two accept_offer steps on one connection; answer the newest offer.
            info!("New offer from {} while answering: starting over", remote);
            self.replace_connection(&remote).await?;
        }

        let link = self
            .links
            .get_mut(&remote)
            .ok_or_else(|| SignalingError::PeerNotFound(remote.clone()))?;
        link.signaling_state = SignalingState::Stable;
        link.remote_description_set = false;
        link.answer_pending = true;
        let token = link.next_negotiation();
        let epoch = link.epoch;
        let connection = link.connection.clone();
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let result = connection.accept_offer(sdp).await;
            let _ = events.send(LinkEvent::AnswerCreated {
                remote,
                epoch,
                token,
                result,
            });
        });
        Ok(())
    }

    fn on_answer(&mut self, remote: ParticipantId, sdp: String) -> Result<(), ClientError> {
        let link = self
            .links
            .get_mut(&remote)
            .ok_or_else(|| SignalingError::PeerNotFound(remote.clone()))?;

        if link.signaling_state != SignalingState::HaveLocalOffer {
            return Err(SignalingError::InvalidSignalingState {
                signal: "answer",
                state: link.signaling_state.as_str(),
            }
            .into());
        }

        link.signaling_state = SignalingState::Stable;
        let token = link.next_negotiation();
        let epoch = link.epoch;
        let connection = link.connection.clone();
        let events = self.events_tx.clone();

        tokio::spawn(async move {
            let result = connection.accept_answer(sdp).await;
            let _ = events.send(LinkEvent::AnswerApplied {
                remote,
                epoch,
                token,
                result,
            });
        });
        Ok(())
    }

    fn on_remote_candidate(
        &mut self,
        remote: ParticipantId,
        candidate: IceCandidate,
    ) -> Result<(), ClientError> {
        let link = self
            .links
            .get_mut(&remote)
            .ok_or_else(|| SignalingError::PeerNotFound(remote.clone()))?;

        if !link.remote_description_set {
            debug!("Buffering candidate from {}", remote);
            link.pending_candidates.push(candidate);
            return Ok(());
        }

        spawn_add_candidates(remote, link.connection.clone(), vec![candidate]);
        Ok(())
    }

    fn remote_description_applied(&mut self, remote: &ParticipantId) {
        let Some(link) = self.links.get_mut(remote) else {
            return;
        };
        link.remote_description_set = true;

        let buffered = std::mem::take(&mut link.pending_candidates);
        if !buffered.is_empty() {
            debug!("Flushing {} buffered candidates for {}", buffered.len(), remote);
            spawn_add_candidates(remote.clone(), link.connection.clone(), buffered);
        }
    }

    /// Every failed step ends with the link back in `stable` on a fresh connection,
    /// or with the link torn down once the offerer has used up its attempts.
    async fn recover(&mut self, remote: &ParticipantId, cause: ClientError) -> Option<LinkStatus> {
        let link = self.links.get(remote)?;
        let role = link.role;
        let attempts = link.attempts;
        warn!("Negotiation with {} failed: {}", remote, cause);

        if role == InitiatorRole::Offerer && attempts >= self.max_negotiation_attempts {
            error!("Giving up on {} after {} attempts", remote, attempts);
            self.remove_link(remote).await;
            return Some(LinkStatus::new(remote.clone(), IceState::Closed));
        }

        if let Err(e) = self.replace_connection(remote).await {
            error!("Could not reset link to {}: {}", remote, e);
            return Some(LinkStatus::new(remote.clone(), IceState::Closed));
        }

        if role == InitiatorRole::Offerer {
            if let Some(link) = self.links.get_mut(remote) {
                link.attempts += 1;
            }
            self.start_offer(remote);
        }
        Some(LinkStatus::new(remote.clone(), IceState::New))
    }

    fn is_current(&self, remote: &ParticipantId, epoch: u64, token: u64) -> bool {
        self.links
            .get(remote)
            .is_some_and(|l| l.is_current(epoch, token))
    }

    fn send_signal(&self, signal: Signal) {
        let kind = signal.kind();
        let target = signal.target_id().clone();
        if let Err(e) = self.signals.send(signal.into()) {
            warn!("Could not send {} to {}: {}", kind, target, e);
        }
    }
}

fn spawn_add_candidates(
    remote: ParticipantId,
    connection: Arc<dyn PeerConnection>,
    candidates: Vec<IceCandidate>,
) {
    tokio::spawn(async move {
        for candidate in candidates {
            if let Err(e) = connection.add_ice_candidate(candidate).await {
                warn!("Candidate from {} rejected: {}", remote, e);
            }
        }
    });
}
