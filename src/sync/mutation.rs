//! Fire-and-forget writes to the document store.

use time::OffsetDateTime;

use crate::{
    Error,
    alert::{Alert, AlertSender},
    auth::AuthContext,
    stores::DocumentStore,
    transaction::{TransactionForm, TransactionId, TransactionType, TransactionUpdate},
};

/// The kinds of write the live store forwards to the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Delete,
    Update,
}

impl Action {
    /// The verb used in user facing messages, e.g. "add".
    pub fn verb(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::Update => "update",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::Add => "Transaction added successfully",
            Self::Delete => "Transaction deleted successfully",
            Self::Update => "Transaction updated successfully",
        }
    }
}

pub(crate) async fn add<S: DocumentStore>(
    store: &S,
    auth: &AuthContext,
    form: TransactionForm,
) -> Result<TransactionId, Error> {
    let user = auth.verified_user()?;
    let transaction = form.validate(&user.id, OffsetDateTime::now_utc())?;

    let id = store.create(transaction).await?;
    tracing::debug!("Created transaction {id} for user {}", user.id);

    Ok(id)
}

pub(crate) async fn delete<S: DocumentStore>(store: &S, id: &TransactionId) -> Result<(), Error> {
    store.delete(id).await?;
    tracing::debug!("Deleted transaction {id}");

    Ok(())
}

pub(crate) async fn update<S: DocumentStore>(
    store: &S,
    auth: &AuthContext,
    id: &TransactionId,
    current_kind: Option<&TransactionType>,
    update: TransactionUpdate,
) -> Result<(), Error> {
    auth.verified_user()?;
    let mut update = update.validate()?;

    if let Some(kind) = current_kind {
        update = update.for_kind(kind);
    }

    store.update(id, update).await?;
    tracing::debug!("Updated transaction {id}");

    Ok(())
}

/// Turn the outcome of `action` into an alert.
pub(crate) fn report<T>(alerts: &AlertSender, action: Action, result: &Result<T, Error>) {
    let alert = match result {
        Ok(_) => Alert::success(action.success_message(), ""),
        Err(error) => error.to_alert(action),
    };

    alerts.send(alert);
}
