//! The live, per-user view of transactions.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    Error,
    alert::{Alert, AlertSender},
    auth::AuthContext,
    config::SyncConfig,
    stores::{DocumentStore, TransactionQuery},
    sync::{
        mutation::{self, Action},
        retry::{RetryDecision, RetryPolicy, RetryState, SubscriptionPhase},
    },
    transaction::{Transaction, TransactionForm, TransactionId, TransactionUpdate},
    user::User,
};

/// What the live store currently knows about the user's transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// The latest snapshot, newest first.
    pub transactions: Vec<Transaction>,
    /// Whether the first snapshot for the current user is still on its way.
    pub loading: bool,
    pub phase: SubscriptionPhase,
    epoch: u64,
}

impl SyncState {
    fn new(user: Option<&User>) -> Self {
        let verified = user.is_some_and(|user| user.email_verified);

        Self {
            transactions: Vec::new(),
            loading: verified,
            phase: if verified {
                SubscriptionPhase::Subscribing
            } else {
                SubscriptionPhase::Idle
            },
            epoch: 0,
        }
    }

    /// Identifies the subscription that owns this state. It changes every time
    /// the subscription is restarted or torn down.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Keeps an up to date, ordered snapshot of the signed in user's transactions
/// and forwards edits to the document store.
///
/// The snapshot is only ever changed by messages from the store's live query:
/// mutations do not touch it directly, the new state shows up once the store
/// pushes it. Every outcome, good or bad, is reported on the alert channel.
///
/// The subscription follows the [AuthContext]: whenever the identity changes,
/// the current live query is closed and a new one is opened for the new user,
/// provided their email is verified.
pub struct LiveTransactionStore<S> {
    store: Arc<S>,
    auth: AuthContext,
    alerts: AlertSender,
    state: Arc<watch::Sender<SyncState>>,
    supervisor: JoinHandle<()>,
}

impl<S: DocumentStore> LiveTransactionStore<S> {
    /// Start following the transactions of whoever is signed in to `auth`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<S>, auth: AuthContext, alerts: AlertSender, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(SyncState::new(auth.current_user().as_ref()));
        let state = Arc::new(state);

        let supervisor = tokio::spawn(supervise(
            store.clone(),
            auth.clone(),
            alerts.clone(),
            config.retry_policy(),
            state.clone(),
        ));

        Self {
            store,
            auth,
            alerts,
            state,
            supervisor,
        }
    }

    /// A copy of the current snapshot, newest first.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.borrow().transactions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.state.borrow().phase
    }

    /// A receiver that is notified every time the state changes.
    pub fn watch(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Validate `form` and create the transaction in the document store.
    ///
    /// The returned handle resolves to the new transaction's ID, but callers
    /// are free to drop it: the outcome is also reported as an alert.
    pub fn add(&self, form: TransactionForm) -> JoinHandle<Result<TransactionId, Error>> {
        let store = self.store.clone();
        let auth = self.auth.clone();
        let alerts = self.alerts.clone();

        tokio::spawn(async move {
            let result = mutation::add(&*store, &auth, form).await;
            mutation::report(&alerts, Action::Add, &result);
            result
        })
    }

    /// Delete the transaction with `id` from the document store.
    pub fn delete(&self, id: TransactionId) -> JoinHandle<Result<(), Error>> {
        let store = self.store.clone();
        let alerts = self.alerts.clone();

        tokio::spawn(async move {
            let result = mutation::delete(&*store, &id).await;
            mutation::report(&alerts, Action::Delete, &result);
            result
        })
    }

    /// Apply `update` to the transaction with `id` in the document store.
    ///
    /// A category is only kept if the transaction is an expense once updated,
    /// going by its type in the current snapshot.
    pub fn update(
        &self,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> JoinHandle<Result<(), Error>> {
        let store = self.store.clone();
        let auth = self.auth.clone();
        let alerts = self.alerts.clone();
        let current_kind = self
            .state
            .borrow()
            .transactions
            .iter()
            .find(|transaction| transaction.id == id)
            .map(|transaction| transaction.kind.clone());

        tokio::spawn(async move {
            let result =
                mutation::update(&*store, &auth, &id, current_kind.as_ref(), update).await;
            mutation::report(&alerts, Action::Update, &result);
            result
        })
    }

    /// Close the live query and stop following identity changes.
    ///
    /// Any snapshot still in flight is discarded.
    pub fn dispose(self) {
        tracing::debug!("Tearing down the live transaction store");
        tear_down(&self.state);
        self.supervisor.abort();
    }
}

impl<S> Drop for LiveTransactionStore<S> {
    fn drop(&mut self) {
        self.supervisor.abort();
    }
}

/// Restart the subscription every time the identity changes.
async fn supervise<S: DocumentStore>(
    store: Arc<S>,
    auth: AuthContext,
    alerts: AlertSender,
    policy: RetryPolicy,
    state: Arc<watch::Sender<SyncState>>,
) {
    let mut identity = auth.watch();

    loop {
        let user = identity.borrow_and_update().clone();
        let Some(epoch) = begin_epoch(&state, user.as_ref()) else {
            tracing::debug!("The live store has been torn down, stopping subscription");
            return;
        };

        let subscription = async {
            match user {
                Some(user) if user.email_verified => {
                    subscribe(&*store, &user, epoch, policy, &state, &alerts).await;
                }
                Some(user) => {
                    tracing::debug!("User {} has not verified their email, not subscribing", user.id)
                }
                None => tracing::debug!("Nobody is signed in, not subscribing"),
            }

            // Hold the (possibly finished) subscription until the identity changes.
            std::future::pending::<()>().await
        };

        tokio::select! {
            _ = subscription => {}
            changed = identity.changed() => {
                if changed.is_err() {
                    tracing::debug!("The identity provider has gone away, stopping subscription");
                    return;
                }

                tracing::debug!("Identity changed, restarting subscription");
            }
        }
    }
}

/// Reset the state for a new subscription and return its epoch.
///
/// Returns `None` and leaves the state alone once it has been torn down.
fn begin_epoch(state: &watch::Sender<SyncState>, user: Option<&User>) -> Option<u64> {
    let mut epoch = None;

    state.send_if_modified(|current| {
        if current.phase == SubscriptionPhase::TornDown {
            return false;
        }

        let next = SyncState {
            epoch: current.epoch + 1,
            ..SyncState::new(user)
        };
        epoch = Some(next.epoch);
        *current = next;
        true
    });

    epoch
}

/// Move to a final, empty state that no subscription can write to.
fn tear_down(state: &watch::Sender<SyncState>) {
    state.send_modify(|current| {
        current.epoch += 1;
        current.transactions.clear();
        current.loading = false;
        current.phase = SubscriptionPhase::TornDown;
    });
}

/// Follow `user`'s transactions until the live query fails for good.
async fn subscribe<S: DocumentStore>(
    store: &S,
    user: &User,
    epoch: u64,
    policy: RetryPolicy,
    state: &watch::Sender<SyncState>,
    alerts: &AlertSender,
) {
    let mut retry = RetryState::new(policy);

    loop {
        tracing::debug!("Subscribing to transactions for user {}", user.id);
        set_phase(state, epoch, SubscriptionPhase::Subscribing);

        let mut query = store.listen(TransactionQuery::for_user(&user.id));

        let error = loop {
            match query.next().await {
                Some(Ok(transactions)) => {
                    retry.on_success();
                    apply_snapshot(state, epoch, transactions);
                }
                Some(Err(error)) => break error,
                None => {
                    tracing::debug!("The document store closed the live query for user {}", user.id);
                    state.send_if_modified(|current| {
                        let changed = current.epoch == epoch && current.loading;
                        if changed {
                            current.loading = false;
                        }
                        changed
                    });
                    return;
                }
            }
        };

        query.close();

        match retry.on_error(&error) {
            RetryDecision::Retry { attempt, delay } => {
                alerts.send(Alert::warning(
                    "Database indexes are being built",
                    &format!(
                        "Retrying in {} seconds... (Attempt {attempt}/{})",
                        delay.as_secs(),
                        retry.max_retries()
                    ),
                ));
                set_phase(state, epoch, SubscriptionPhase::Retrying { attempt });
                tokio::time::sleep(delay).await;
            }
            RetryDecision::Exhausted | RetryDecision::Permanent => {
                tracing::error!("Could not load transactions for user {}: {error}", user.id);
                alerts.send(Alert::error(
                    "Unable to load transactions",
                    "Please try again later.",
                ));
                state.send_if_modified(|current| {
                    if current.epoch != epoch {
                        return false;
                    }

                    current.loading = false;
                    current.phase = SubscriptionPhase::Failed;
                    true
                });
                return;
            }
        }
    }
}

/// Replace the snapshot with `transactions`, unless the state has moved on to
/// a newer subscription.
///
/// Returns whether the snapshot was applied.
pub(crate) fn apply_snapshot(
    state: &watch::Sender<SyncState>,
    epoch: u64,
    transactions: Vec<Transaction>,
) -> bool {
    state.send_if_modified(|current| {
        if current.epoch != epoch {
            tracing::debug!(
                "Discarding snapshot from subscription {epoch}, current subscription is {}",
                current.epoch
            );
            return false;
        }

        current.transactions = transactions;
        current.loading = false;
        current.phase = SubscriptionPhase::Synced;
        true
    })
}

fn set_phase(state: &watch::Sender<SyncState>, epoch: u64, phase: SubscriptionPhase) {
    state.send_if_modified(|current| {
        if current.epoch != epoch || current.phase == phase {
            return false;
        }

        current.phase = phase;
        true
    });
}
