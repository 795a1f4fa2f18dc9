//! The signed in identity, as seen by the rest of the crate.

use tokio::sync::watch;

use crate::{
    Error,
    auth::IdentityProvider,
    user::User,
};

/// The authentication capability passed to the parts of the crate that need
/// to know who is signed in.
///
/// Lifecycle: [AuthContext::initialize] hooks the context up to an identity
/// provider, after which it is active and tracks every identity change. Calling
/// [AuthContext::dispose] (or dropping the last clone) detaches it again.
/// Clones share the same identity stream.
#[derive(Debug, Clone)]
pub struct AuthContext {
    identity: watch::Receiver<Option<User>>,
}

impl AuthContext {
    /// Start tracking the identity reported by `provider`.
    pub fn initialize<P: IdentityProvider + ?Sized>(provider: &P) -> Self {
        Self {
            identity: provider.watch_identity(),
        }
    }

    /// The currently signed in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.identity.borrow().clone()
    }

    /// The currently signed in user, if their email has been verified.
    ///
    /// # Errors
    ///
    /// Returns [Error::UnverifiedIdentity] if nobody is signed in or the user
    /// has not verified their email yet.
    pub fn verified_user(&self) -> Result<User, Error> {
        match self.current_user() {
            Some(user) if user.email_verified => Ok(user),
            _ => Err(Error::UnverifiedIdentity),
        }
    }

    /// A fresh receiver of identity changes.
    ///
    /// The current value is marked as seen, so the first call to `changed`
    /// waits for the next change.
    pub fn watch(&self) -> watch::Receiver<Option<User>> {
        let mut receiver = self.identity.clone();
        receiver.mark_unchanged();
        receiver
    }

    /// Stop tracking identity changes through this handle.
    ///
    /// Disposing consumes the handle, so it cannot be used afterwards. Other
    /// clones keep tracking the provider until they are disposed or dropped
    /// in turn.
    pub fn dispose(self) {
        tracing::debug!("Disposing auth context");
        drop(self.identity);
    }
}
