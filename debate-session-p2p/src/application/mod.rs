pub mod config;
pub mod directory;
pub mod events;
pub mod session;

pub use config::SessionConfig;
pub use directory::{OpenRoom, RoomDirectory};
pub use events::SessionEvent;
pub use session::DebateSession;
