//! Defines the document store trait for transactions.

use std::future::Future;

use tokio::sync::mpsc;

use crate::{
    transaction::{NewTransaction, Transaction, TransactionId, TransactionUpdate},
    user::UserId,
};

/// The errors a document store can report.
///
/// Only [StoreError::FailedPrecondition] is considered transient: it means the
/// store is still provisioning something the request depends on, such as the
/// index behind a live query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store is not ready to serve the request yet, e.g. an index is
    /// still being built.
    #[error("the query requires an index that is not ready yet")]
    FailedPrecondition,

    /// The store rejected the document.
    #[error("the document was rejected: {0}")]
    InvalidArgument(String),

    /// No document with the given ID exists.
    #[error("no document with ID {0}")]
    NotFound(TransactionId),

    /// Any other failure, e.g. a network error.
    #[error("the document store is unavailable: {0}")]
    Unavailable(String),
}

/// A single message on a live query: either the full current result set or
/// the error that ended the query.
pub type QueryEvent = Result<Vec<Transaction>, StoreError>;

/// The order to sort transactions by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Defines which transactions a live query follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Only transactions owned by this user are included.
    pub user_id: UserId,
    /// The order of transactions in each snapshot.
    pub sort_date: SortOrder,
}

impl TransactionQuery {
    /// All of `user_id`'s transactions, newest first.
    pub fn for_user(user_id: &UserId) -> Self {
        Self {
            user_id: user_id.clone(),
            sort_date: SortOrder::Descending,
        }
    }
}

/// The receiving end of a live query.
///
/// Each message is the complete, current result set of the query, never a
/// delta. An `Err` message ends the query; the store sends nothing after it.
/// Dropping or closing the [LiveQuery] unsubscribes.
#[derive(Debug)]
pub struct LiveQuery {
    receiver: mpsc::UnboundedReceiver<QueryEvent>,
}

/// The store's end of a live query.
pub type LiveQuerySender = mpsc::UnboundedSender<QueryEvent>;

impl LiveQuery {
    /// Create a connected sender and live query.
    pub fn channel() -> (LiveQuerySender, LiveQuery) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, LiveQuery { receiver })
    }

    /// Wait for the next snapshot or error.
    ///
    /// Returns `None` once the store has closed the query.
    pub async fn next(&mut self) -> Option<QueryEvent> {
        self.receiver.recv().await
    }

    /// Unsubscribe. Messages already in flight are discarded.
    pub fn close(&mut self) {
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

/// Handles the persistence and live querying of transactions.
///
/// Implementations are the single point of serialization for writes: the
/// client never orders or merges concurrent mutations itself.
pub trait DocumentStore: Send + Sync + 'static {
    /// Start following the transactions selected by `query`.
    ///
    /// Implementers should send the current result set straight away and again
    /// after every change that affects it.
    fn listen(&self, query: TransactionQuery) -> LiveQuery;

    /// Create a new transaction and return the ID the store assigned to it.
    fn create(
        &self,
        transaction: NewTransaction,
    ) -> impl Future<Output = Result<TransactionId, StoreError>> + Send;

    /// Delete the transaction with `id`.
    fn delete(&self, id: &TransactionId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite the fields set in `update` on the transaction with `id`.
    fn update(
        &self,
        id: &TransactionId,
        update: TransactionUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
