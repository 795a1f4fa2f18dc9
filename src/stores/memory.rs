//! An in-memory document store with live queries.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;

use crate::{
    stores::{
        DocumentStore, LiveQuery, LiveQuerySender, QueryEvent, SortOrder, StoreError,
        TransactionDocument, TransactionQuery,
    },
    transaction::{NewTransaction, Transaction, TransactionId, TransactionUpdate},
    user::UserId,
};

/// A [DocumentStore] that keeps every document in memory.
///
/// Every write pushes a fresh snapshot to each open live query whose result
/// set may have changed. Failures can be injected to exercise error handling
/// in callers.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<TransactionId, TransactionDocument>,
    next_id: u64,
    listeners: Vec<Listener>,
    listen_failures: VecDeque<StoreError>,
    write_failures: VecDeque<StoreError>,
    listen_calls: usize,
    write_calls: usize,
}

#[derive(Debug)]
struct Listener {
    query: TransactionQuery,
    sender: LiveQuerySender,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents exported from another store, assigning all of them to
    /// `user_id`.
    ///
    /// Documents keep their exported ID when they have one.
    ///
    /// Returns the number of documents imported.
    pub fn import(&self, user_id: &UserId, documents: Vec<TransactionDocument>) -> usize {
        let Ok(mut inner) = self.lock() else {
            return 0;
        };

        let count = documents.len();

        for mut document in documents {
            let id = match document.id.take() {
                Some(id) => TransactionId::new(id),
                None => inner.allocate_id(),
            };
            document.user_id = Some(user_id.to_string());
            inner.documents.insert(id, document);
        }

        tracing::debug!("Imported {count} documents for user {user_id}");
        inner.publish();

        count
    }

    /// Make the next `count` calls to [DocumentStore::listen] end immediately
    /// with `error`.
    pub fn fail_next_listens(&self, count: usize, error: StoreError) {
        if let Ok(mut inner) = self.lock() {
            inner
                .listen_failures
                .extend(std::iter::repeat_n(error, count));
        }
    }

    /// Make the next `count` writes (create, delete or update) fail with `error`.
    pub fn fail_next_writes(&self, count: usize, error: StoreError) {
        if let Ok(mut inner) = self.lock() {
            inner
                .write_failures
                .extend(std::iter::repeat_n(error, count));
        }
    }

    /// End every open live query with `error`.
    pub fn break_listeners(&self, error: StoreError) {
        if let Ok(mut inner) = self.lock() {
            for listener in inner.listeners.drain(..) {
                let _ = listener.sender.send(Err(error.clone()));
            }
        }
    }

    /// The number of times [DocumentStore::listen] has been called.
    pub fn listen_calls(&self) -> usize {
        self.lock().map(|inner| inner.listen_calls).unwrap_or(0)
    }

    /// The number of create, delete and update calls made so far, including
    /// failed ones.
    pub fn write_calls(&self) -> usize {
        self.lock().map(|inner| inner.write_calls).unwrap_or(0)
    }

    /// The number of live queries that have not been closed.
    pub fn open_listeners(&self) -> usize {
        self.lock()
            .map(|mut inner| {
                inner.listeners.retain(|listener| !listener.sender.is_closed());
                inner.listeners.len()
            })
            .unwrap_or(0)
    }

    /// A copy of every stored document, keyed by ID.
    pub fn documents(&self) -> BTreeMap<TransactionId, TransactionDocument> {
        self.lock()
            .map(|inner| inner.documents.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|error| {
            tracing::error!("Could not acquire the document store lock: {error}");
            StoreError::Unavailable("could not acquire the document store lock".to_owned())
        })
    }

    fn write<T>(&self, apply: impl FnOnce(&mut Inner) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut inner = self.lock()?;
        inner.write_calls += 1;

        if let Some(error) = inner.write_failures.pop_front() {
            return Err(error);
        }

        let result = apply(&mut inner)?;
        inner.publish();

        Ok(result)
    }
}

impl Inner {
    fn allocate_id(&mut self) -> TransactionId {
        loop {
            self.next_id += 1;
            let id = TransactionId::new(format!("txn-{:06}", self.next_id));

            if !self.documents.contains_key(&id) {
                return id;
            }
        }
    }

    fn snapshot(&self, query: &TransactionQuery) -> Vec<Transaction> {
        let now = OffsetDateTime::now_utc();

        let mut transactions: Vec<Transaction> = self
            .documents
            .iter()
            .filter(|(_, document)| document.is_owned_by(&query.user_id))
            .map(|(id, document)| document.clone().into_transaction(id.clone(), now))
            .collect();

        // Stable sort, so transactions with equal dates stay in ID order.
        match query.sort_date {
            SortOrder::Ascending => transactions.sort_by(|a, b| a.date.cmp(&b.date)),
            SortOrder::Descending => transactions.sort_by(|a, b| b.date.cmp(&a.date)),
        }

        transactions
    }

    /// Send the current result set to every open live query, dropping the
    /// ones that have been closed.
    fn publish(&mut self) {
        let snapshots: Vec<QueryEvent> = self
            .listeners
            .iter()
            .map(|listener| Ok(self.snapshot(&listener.query)))
            .collect();

        let mut snapshots = snapshots.into_iter();
        self.listeners
            .retain(|listener| match snapshots.next() {
                Some(snapshot) => listener.sender.send(snapshot).is_ok(),
                None => false,
            });
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn listen(&self, query: TransactionQuery) -> LiveQuery {
        let (sender, live_query) = LiveQuery::channel();

        let mut inner = match self.lock() {
            Ok(inner) => inner,
            Err(error) => {
                let _ = sender.send(Err(error));
                return live_query;
            }
        };

        inner.listen_calls += 1;

        if let Some(error) = inner.listen_failures.pop_front() {
            tracing::debug!("Failing live query for user {}: {error}", query.user_id);
            let _ = sender.send(Err(error));
            return live_query;
        }

        let snapshot = inner.snapshot(&query);
        if sender.send(Ok(snapshot)).is_ok() {
            inner.listeners.push(Listener { query, sender });
        }

        live_query
    }

    async fn create(&self, transaction: NewTransaction) -> Result<TransactionId, StoreError> {
        self.write(|inner| {
            let id = inner.allocate_id();
            inner
                .documents
                .insert(id.clone(), TransactionDocument::from_new(&transaction));
            Ok(id)
        })
    }

    async fn delete(&self, id: &TransactionId) -> Result<(), StoreError> {
        self.write(|inner| match inner.documents.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id.clone())),
        })
    }

    async fn update(&self, id: &TransactionId, update: TransactionUpdate) -> Result<(), StoreError> {
        self.write(|inner| match inner.documents.get_mut(id) {
            Some(document) => {
                document.apply(&update);
                Ok(())
            }
            None => Err(StoreError::NotFound(id.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        stores::{
            DocumentStore, MemoryDocumentStore, SortOrder, StoreError, TransactionDocument,
            TransactionQuery,
        },
        transaction::{
            ExpenseCategory, NewTransaction, TransactionId, TransactionType, TransactionUpdate,
        },
        user::UserId,
    };

    fn new_expense(user_id: &str, description: &str, date: time::OffsetDateTime) -> NewTransaction {
        NewTransaction {
            description: description.to_owned(),
            amount: 10.0,
            kind: TransactionType::Expense,
            category: Some(ExpenseCategory::Food),
            date,
            user_id: UserId::new(user_id),
        }
    }

    #[tokio::test]
    async fn listen_sends_current_snapshot_straight_away() {
        let store = MemoryDocumentStore::new();
        store
            .create(new_expense("alice", "Lunch", datetime!(2024-01-15 12:00 UTC)))
            .await
            .unwrap();

        let mut query = store.listen(TransactionQuery::for_user(&UserId::new("alice")));

        let snapshot = query.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].description, "Lunch");
    }

    #[tokio::test]
    async fn snapshots_only_contain_the_users_transactions_newest_first() {
        let store = MemoryDocumentStore::new();
        let mut query = store.listen(TransactionQuery::for_user(&UserId::new("alice")));
        assert!(query.next().await.unwrap().unwrap().is_empty());

        store
            .create(new_expense("alice", "Old", datetime!(2024-01-01 12:00 UTC)))
            .await
            .unwrap();
        store
            .create(new_expense("bob", "Not mine", datetime!(2024-01-10 12:00 UTC)))
            .await
            .unwrap();
        store
            .create(new_expense("alice", "New", datetime!(2024-02-01 12:00 UTC)))
            .await
            .unwrap();

        // One snapshot per write, each a complete result set.
        let first = query.next().await.unwrap().unwrap();
        let second = query.next().await.unwrap().unwrap();
        let third = query.next().await.unwrap().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        let descriptions: Vec<_> = third.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["New", "Old"]);
    }

    #[tokio::test]
    async fn ascending_queries_are_oldest_first() {
        let store = MemoryDocumentStore::new();
        store
            .create(new_expense("alice", "New", datetime!(2024-02-01 12:00 UTC)))
            .await
            .unwrap();
        store
            .create(new_expense("alice", "Old", datetime!(2024-01-01 12:00 UTC)))
            .await
            .unwrap();

        let mut query = store.listen(TransactionQuery {
            user_id: UserId::new("alice"),
            sort_date: SortOrder::Ascending,
        });

        let snapshot = query.next().await.unwrap().unwrap();
        assert_eq!(snapshot[0].description, "Old");
    }

    #[tokio::test]
    async fn injected_listen_failures_end_the_query() {
        let store = MemoryDocumentStore::new();
        store.fail_next_listens(1, StoreError::FailedPrecondition);

        let mut failed = store.listen(TransactionQuery::for_user(&UserId::new("alice")));
        assert_eq!(failed.next().await, Some(Err(StoreError::FailedPrecondition)));
        assert_eq!(failed.next().await, None);

        let mut working = store.listen(TransactionQuery::for_user(&UserId::new("alice")));
        assert!(matches!(working.next().await, Some(Ok(_))));
        assert_eq!(store.listen_calls(), 2);
    }

    #[tokio::test]
    async fn closed_queries_are_pruned_on_next_write() {
        let store = MemoryDocumentStore::new();
        let mut query = store.listen(TransactionQuery::for_user(&UserId::new("alice")));
        assert_eq!(store.open_listeners(), 1);

        query.close();
        store
            .create(new_expense("alice", "Lunch", datetime!(2024-01-15 12:00 UTC)))
            .await
            .unwrap();

        assert_eq!(store.open_listeners(), 0);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_documents() {
        let store = MemoryDocumentStore::new();
        let id = TransactionId::new("missing");

        assert_eq!(
            store.delete(&id).await,
            Err(StoreError::NotFound(id.clone()))
        );
        assert_eq!(
            store
                .update(&id, TransactionUpdate::default().amount(1.0))
                .await,
            Err(StoreError::NotFound(id))
        );
        assert_eq!(store.write_calls(), 2);
    }

    #[tokio::test]
    async fn injected_write_failures_leave_documents_untouched() {
        let store = MemoryDocumentStore::new();
        store.fail_next_writes(1, StoreError::InvalidArgument("bad amount".to_owned()));

        let result = store
            .create(new_expense("alice", "Lunch", datetime!(2024-01-15 12:00 UTC)))
            .await;

        assert_eq!(result, Err(StoreError::InvalidArgument("bad amount".to_owned())));
        assert!(store.documents().is_empty());
    }

    #[tokio::test]
    async fn import_assigns_documents_to_user_and_keeps_ids() {
        let store = MemoryDocumentStore::new();
        let documents = vec![
            TransactionDocument {
                id: Some("exported-1".to_owned()),
                description: Some("Rent".to_owned()),
                user_id: Some("someone-else".to_owned()),
                ..Default::default()
            },
            TransactionDocument::default(),
        ];

        let count = store.import(&UserId::new("alice"), documents);

        assert_eq!(count, 2);
        let stored = store.documents();
        assert!(stored.contains_key(&TransactionId::new("exported-1")));
        assert!(
            stored
                .values()
                .all(|document| document.is_owned_by(&UserId::new("alice")))
        );
    }
}
