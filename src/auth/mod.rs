//! Access to the current user's identity.
//!
//! Authentication itself is handled by an external identity provider. This
//! module only consumes the provider's stream of identity changes:
//! - [IdentityProvider] is the contract an identity provider fulfils
//! - [AuthContext] is the capability object handed to the rest of the crate
//! - [LocalIdentityProvider] is an in-process provider for tests and tools

mod context;
mod provider;

pub use context::AuthContext;
pub use provider::{IdentityProvider, LocalIdentityProvider};
