mod handshake;
mod ice_server;

pub use handshake::{Handshake, HandshakeAction, HandshakeInput, HandshakeRole, HandshakeState};
pub use ice_server::IceServer;
