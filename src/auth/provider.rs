//! Where identity changes come from.

use tokio::sync::watch;

use crate::user::{User, UserId};

/// A source of identity changes, e.g. an external authentication service.
///
/// The receiver always holds the current user (`None` when signed out) and is
/// notified every time the provider reports a change, even if the new value
/// equals the old one.
pub trait IdentityProvider {
    fn watch_identity(&self) -> watch::Receiver<Option<User>>;
}

/// An identity provider that lives in the same process.
///
/// Useful for tests and command line tools where there is no external
/// authentication service.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    sender: watch::Sender<Option<User>>,
}

impl LocalIdentityProvider {
    /// Create a provider with nobody signed in.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Sign `user` in, replacing whoever was signed in before.
    pub fn sign_in(&self, user: User) {
        tracing::debug!("Signing in user {}", user.id);
        self.sender.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        tracing::debug!("Signing out");
        self.sender.send_replace(None);
    }

    /// Mark the signed in user's email as verified.
    ///
    /// Does nothing if nobody is signed in or `user_id` is somebody else.
    pub fn verify_email(&self, user_id: &UserId) {
        self.sender.send_if_modified(|current| match current {
            Some(user) if &user.id == user_id && !user.email_verified => {
                user.email_verified = true;
                true
            }
            _ => false,
        });
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn watch_identity(&self) -> watch::Receiver<Option<User>> {
        self.sender.subscribe()
    }
}
