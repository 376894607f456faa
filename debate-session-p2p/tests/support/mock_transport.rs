use async_trait::async_trait;
use debate_session_core::{IceCandidate, SessionDescription};
use debate_session_p2p::{
    IceServer, LocalMedia, MediaDevices, MediaError, PeerTransport, TransportError, TransportEvent,
    TransportFactory,
};
use std::sync::{Arc, Mutex};

/// Observable state of one scripted peer transport.
#[derive(Default)]
pub struct TransportState {
    pub attached_stream: Option<String>,
    pub local_description: Option<SessionDescription>,
    pub remote_description: Option<SessionDescription>,
    pub applied_candidates: Vec<IceCandidate>,
    pub offers_created: u32,
    pub answers_created: u32,
    pub closed: bool,
    pending: Vec<TransportEvent>,
}

/// Shared view onto a [`MockTransport`]: tests keep the handle after
/// handing the transport to the session, inspect what the coordinator
/// did with it, and script incoming events.
#[derive(Clone, Default)]
pub struct TransportHandle(Arc<Mutex<TransportState>>);

impl TransportHandle {
    fn lock(&self) -> std::sync::MutexGuard<'_, TransportState> {
        self.0.lock().unwrap()
    }

    /// Queue an event for the session's next poll.
    pub fn emit(&self, event: TransportEvent) {
        self.lock().pending.push(event);
    }

    pub fn attached_stream(&self) -> Option<String> {
        self.lock().attached_stream.clone()
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.lock().local_description.clone()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.lock().remote_description.clone()
    }

    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.lock().applied_candidates.clone()
    }

    pub fn offers_created(&self) -> u32 {
        self.lock().offers_created
    }

    pub fn answers_created(&self) -> u32 {
        self.lock().answers_created
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

pub struct MockTransport {
    handle: TransportHandle,
}

#[async_trait]
impl PeerTransport for MockTransport {
    fn attach_media(&mut self, media: &LocalMedia) {
        self.handle.lock().attached_stream = Some(media.stream_id().to_string());
    }

    async fn create_offer(&mut self) -> Result<SessionDescription, TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.offers_created += 1;
        Ok(SessionDescription::offer(format!(
            "v=0 offer {}",
            state.offers_created
        )))
    }

    async fn create_answer(&mut self) -> Result<SessionDescription, TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.answers_created += 1;
        Ok(SessionDescription::answer(format!(
            "v=0 answer {}",
            state.answers_created
        )))
    }

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.local_description = Some(description);
        Ok(())
    }

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.remote_description = Some(description);
        Ok(())
    }

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.applied_candidates.push(candidate);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.handle.lock().pending)
    }

    fn close(&mut self) {
        self.handle.lock().closed = true;
    }
}

/// Records a handle for every transport it hands out, in creation
/// order.
#[derive(Default)]
pub struct MockTransportFactory {
    handles: Mutex<Vec<TransportHandle>>,
}

impl MockTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn handles(&self) -> Vec<TransportHandle> {
        self.handles.lock().unwrap().clone()
    }

    pub fn latest(&self) -> TransportHandle {
        self.handles
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transport created yet")
    }
}

impl TransportFactory for MockTransportFactory {
    fn create(&self, _ice_servers: &[IceServer]) -> Box<dyn PeerTransport> {
        let handle = TransportHandle::default();
        self.handles.lock().unwrap().push(handle.clone());
        Box::new(MockTransport { handle })
    }
}

/// Media devices that either always grant or always deny capture.
pub struct MockMedia {
    deny: bool,
}

impl MockMedia {
    pub fn granting() -> Self {
        Self { deny: false }
    }

    pub fn denying() -> Self {
        Self { deny: true }
    }
}

#[async_trait]
impl MediaDevices for MockMedia {
    async fn capture(&self) -> Result<LocalMedia, MediaError> {
        if self.deny {
            Err(MediaError::PermissionDenied)
        } else {
            Ok(LocalMedia::new())
        }
    }
}
