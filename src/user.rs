//! The signed-in user as reported by the identity provider.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A newtype wrapper for the identity provider's user IDs.
///
/// This helps disambiguate user IDs from transaction IDs, leading to better
/// compile time errors.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID with the identity provider.
    pub id: UserId,
    /// The email address the user signed up with.
    pub email: String,
    /// Whether the user has confirmed their email address. Unverified users
    /// cannot read or write transactions.
    pub email_verified: bool,
}

impl User {
    /// Create a new user.
    pub fn new(id: UserId, email: &str, email_verified: bool) -> Self {
        Self {
            id,
            email: email.to_owned(),
            email_verified,
        }
    }
}
