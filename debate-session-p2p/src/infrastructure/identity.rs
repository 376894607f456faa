use debate_session_core::UserId;

/// The signed-in user as seen by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            email: email.into(),
        }
    }

    /// Local part of the email, shown in the room list and lobby.
    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Who is signed in, if anyone.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserProfile>;
}

/// Fixed identity, for embedders that authenticate out of band and for
/// tests.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    profile: UserProfile,
}

impl StaticIdentity {
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserProfile> {
        Some(self.profile.clone())
    }
}
