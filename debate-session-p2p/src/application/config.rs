use crate::domain::IceServer;
use crate::infrastructure::store::StorePath;

/// Static configuration for a [`crate::DebateSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// ICE servers handed to every new peer transport.
    pub ice_servers: Vec<IceServer>,
    /// Store subtree the room records live under.
    pub rooms_root: StorePath,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: IceServer::default_stun_servers(),
            rooms_root: StorePath::new("rooms"),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ice_servers(mut self, servers: Vec<IceServer>) -> Self {
        self.ice_servers = servers;
        self
    }

    pub fn with_rooms_root(mut self, root: StorePath) -> Self {
        self.rooms_root = root;
        self
    }
}
