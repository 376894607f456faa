//! Peer session coordination for two-party video debates.
//!
//! The synchronized store is both the room registry and the signaling
//! channel: room lifecycle, presence, the offer/answer/ICE handshake and
//! the shared timer flag all travel through one `rooms/{id}` record.
//! Store, transport, media and identity are trait seams so the
//! coordinator can be driven deterministically in tests.

// Domain layer (core)
pub mod domain;

// Application layer (use cases)
pub mod application;

// Infrastructure layer (adapters)
pub mod infrastructure;

// Re-exports for convenience
pub use application::{
    DebateSession, OpenRoom, RoomDirectory, SessionConfig, SessionEvent,
};
pub use domain::{Handshake, HandshakeAction, HandshakeInput, HandshakeRole, HandshakeState, IceServer};
pub use infrastructure::error::{MediaError, Result, SessionError, StoreError, TransportError};
pub use infrastructure::identity::{IdentityProvider, StaticIdentity, UserProfile};
pub use infrastructure::memory::MemoryStore;
pub use infrastructure::store::{StorePath, Subscription, SyncStore, TxCommit, TxResult};
pub use infrastructure::transport::{
    LocalMedia, MediaDevices, PeerTransport, TransportEvent, TransportFactory,
};
