//! Budget ledger keeps a live, per-user view of income, expense and credit card
//! transactions held in a remote document store, and derives the summaries a
//! budgeting dashboard shows from it.
//!
//! The two main pieces are:
//! - [LiveTransactionStore], which follows the signed in user's transactions
//!   and forwards edits to the [DocumentStore], retrying while the store's
//!   indexes are still being built.
//! - The [dashboard] functions, which turn a snapshot into totals, category
//!   breakdowns, monthly series and a cumulative trend over a time window.

use crate::{
    alert::Alert,
    stores::StoreError,
    sync::Action,
    transaction::{TransactionId, ValidationError},
};

pub mod alert;
pub mod auth;
pub mod config;
pub mod currency;
pub mod dashboard;
pub mod logging;
pub mod stores;
pub mod sync;
pub mod transaction;
pub mod user;

pub use auth::{AuthContext, IdentityProvider, LocalIdentityProvider};
pub use config::SyncConfig;
pub use stores::{DocumentStore, MemoryDocumentStore};
pub use sync::LiveTransactionStore;
pub use user::{User, UserId};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction form or update failed local validation. Nothing was sent
    /// to the document store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Nobody is signed in, or the signed in user has not verified their email.
    #[error("the user must sign in and verify their email first")]
    UnverifiedIdentity,

    /// The document store is still initializing, e.g. building an index.
    ///
    /// Trying again later may succeed.
    #[error("the document store is not ready yet: {0}")]
    TransientBackend(String),

    /// The document store rejected the transaction's data.
    #[error("the document store rejected the transaction: {0}")]
    InvalidData(String),

    /// Tried to delete or update a transaction that does not exist.
    #[error("the transaction {0} could not be found")]
    NotFound(TransactionId),

    /// Any other document store failure.
    #[error("the document store failed: {0}")]
    PermanentBackend(String),

    /// A time range code other than `1m`, `3m`, `6m` or `1y`.
    #[error("invalid time range \"{0}\", expected one of 1m, 3m, 6m or 1y")]
    InvalidTimeRange(String),

    /// The transaction export could not be read or parsed.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not read the transaction export: {0}")]
    InvalidExport(String),

    /// Logging could not be set up.
    #[error("could not set up logging: {0}")]
    Logging(String),
}

impl From<StoreError> for Error {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::FailedPrecondition => Error::TransientBackend(value.to_string()),
            StoreError::InvalidArgument(reason) => Error::InvalidData(reason),
            StoreError::NotFound(id) => Error::NotFound(id),
            StoreError::Unavailable(reason) => {
                tracing::error!("an unhandled document store error occurred: {reason}");
                Error::PermanentBackend(reason)
            }
        }
    }
}

impl Error {
    /// The alert to show the user when `action` fails with this error.
    pub fn to_alert(&self, action: Action) -> Alert {
        let verb = action.verb();

        match self {
            Error::Validation(error) => Alert::error(&error.to_string(), ""),
            Error::UnverifiedIdentity => Alert::error(
                &format!("Please verify your email to {verb} transactions"),
                "Check your inbox for the verification link.",
            ),
            Error::InvalidData(_) => {
                Alert::error("Invalid transaction data", "Please check your input.")
            }
            Error::TransientBackend(_) => Alert::error(
                "Database is being initialized",
                "Please try again in a few moments.",
            ),
            Error::NotFound(_) => Alert::error(
                &format!("Failed to {verb} transaction"),
                "The transaction could not be found. \
                It may have already been deleted.",
            ),
            _ => Alert::error(
                &format!("Failed to {verb} transaction"),
                "Please try again later.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        alert::AlertType,
        stores::StoreError,
        sync::Action,
        transaction::{TransactionId, ValidationError},
    };

    #[test]
    fn store_errors_are_classified() {
        assert!(matches!(
            Error::from(StoreError::FailedPrecondition),
            Error::TransientBackend(_)
        ));
        assert_eq!(
            Error::from(StoreError::InvalidArgument("amount".to_owned())),
            Error::InvalidData("amount".to_owned())
        );
        assert_eq!(
            Error::from(StoreError::NotFound(TransactionId::new("abc"))),
            Error::NotFound(TransactionId::new("abc"))
        );
        assert_eq!(
            Error::from(StoreError::Unavailable("offline".to_owned())),
            Error::PermanentBackend("offline".to_owned())
        );
    }

    #[test]
    fn add_failures_get_specific_alerts() {
        let invalid = Error::InvalidData("amount".to_owned()).to_alert(Action::Add);
        let initializing = Error::TransientBackend("index".to_owned()).to_alert(Action::Add);
        let generic = Error::PermanentBackend("offline".to_owned()).to_alert(Action::Add);

        assert_eq!(invalid.message, "Invalid transaction data");
        assert_eq!(initializing.message, "Database is being initialized");
        assert_eq!(generic.message, "Failed to add transaction");
        assert_eq!(generic.details, "Please try again later.");
        assert_eq!(generic.alert_type, AlertType::Error);
    }

    #[test]
    fn validation_alert_uses_validation_message() {
        let alert = Error::Validation(ValidationError::EmptyDescription).to_alert(Action::Update);

        assert_eq!(alert.message, "Description is required");
    }
}
