use crate::domain::IceServer;
use crate::infrastructure::error::{MediaError, TransportError};
use async_trait::async_trait;
use debate_session_core::{IceCandidate, SessionDescription};
use uuid::Uuid;

/// Events surfaced by a peer transport between polls.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The local agent gathered a candidate that must be relayed to the
    /// remote peer over the signaling channel.
    IceCandidate(IceCandidate),
    /// The remote peer's media stream arrived.
    RemoteTrack { stream_id: String },
}

/// Captured local audio/video stream.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    stream_id: String,
    audio_enabled: bool,
    video_enabled: bool,
    stopped: bool,
}

impl LocalMedia {
    pub fn new() -> Self {
        Self {
            stream_id: Uuid::new_v4().to_string(),
            audio_enabled: true,
            video_enabled: true,
            stopped: false,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Toggle the microphone; returns the new state.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_enabled = !self.audio_enabled;
        self.audio_enabled
    }

    /// Toggle the camera; returns the new state.
    pub fn toggle_video(&mut self) -> bool {
        self.video_enabled = !self.video_enabled;
        self.video_enabled
    }

    /// Release the capture devices.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Default for LocalMedia {
    fn default() -> Self {
        Self::new()
    }
}

/// Access to the local camera and microphone.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn capture(&self) -> Result<LocalMedia, MediaError>;
}

/// One peer-to-peer media connection.
///
/// Implementations wrap the platform's connection object; the
/// coordinator drives them purely through this seam so tests can
/// substitute a scripted mock.
#[async_trait]
pub trait PeerTransport: Send {
    /// Feed the captured local stream into the connection.
    fn attach_media(&mut self, media: &LocalMedia);

    async fn create_offer(&mut self) -> Result<SessionDescription, TransportError>;

    async fn create_answer(&mut self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Drain events surfaced since the last poll.
    fn poll_events(&mut self) -> Vec<TransportEvent>;

    /// Tear the connection down; further calls fail with
    /// [`TransportError::Closed`].
    fn close(&mut self);
}

/// Creates a fresh [`PeerTransport`] per session.
pub trait TransportFactory: Send + Sync {
    fn create(&self, ice_servers: &[IceServer]) -> Box<dyn PeerTransport>;
}
