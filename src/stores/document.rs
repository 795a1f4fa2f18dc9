//! The loosely typed form transactions take inside a document store.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    transaction::{NewTransaction, Transaction, TransactionId, TransactionType, TransactionUpdate},
    user::UserId,
};

/// A transaction as stored in the document store.
///
/// Documents may have been written by older clients or edited by hand, so
/// every field is optional. [TransactionDocument::into_transaction] fills in
/// the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDocument {
    /// The document ID. Only present in exports, stores key documents by ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountField>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// An RFC 3339 timestamp.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Amounts are usually numbers, but some documents hold them as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(f64),
    Text(String),
}

impl AmountField {
    fn to_f64(&self) -> Option<f64> {
        let amount = match self {
            AmountField::Number(number) => *number,
            AmountField::Text(text) => text.trim().parse().ok()?,
        };

        amount.is_finite().then_some(amount)
    }
}

impl TransactionDocument {
    /// Build the document to write for a new transaction.
    pub fn from_new(transaction: &NewTransaction) -> Self {
        let date = match transaction.date.format(&Rfc3339) {
            Ok(date) => Some(date),
            Err(error) => {
                tracing::warn!("Could not format transaction date {}: {error}", transaction.date);
                None
            }
        };

        Self {
            id: None,
            description: Some(transaction.description.clone()),
            amount: Some(AmountField::Number(transaction.amount)),
            kind: Some(transaction.kind.as_str().to_owned()),
            category: transaction
                .category
                .map(|category| category.as_str().to_owned()),
            date,
            user_id: Some(transaction.user_id.to_string()),
        }
    }

    /// Whether the document belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id.as_deref() == Some(user_id.as_ref())
    }

    /// Convert the document into a [Transaction], filling in missing fields.
    ///
    /// - A missing description becomes empty.
    /// - A missing or unreadable amount becomes zero.
    /// - A missing type is treated as an expense.
    /// - An unknown category is dropped.
    /// - A missing or unreadable date is replaced with `now`.
    pub fn into_transaction(self, id: TransactionId, now: OffsetDateTime) -> Transaction {
        let date = self
            .date
            .as_deref()
            .and_then(|date| OffsetDateTime::parse(date, &Rfc3339).ok())
            .unwrap_or(now);

        Transaction {
            id,
            description: self.description.unwrap_or_default(),
            amount: self
                .amount
                .as_ref()
                .and_then(AmountField::to_f64)
                .unwrap_or(0.0),
            kind: self
                .kind
                .map(TransactionType::from)
                .unwrap_or(TransactionType::Expense),
            category: self.category.and_then(|category| category.parse().ok()),
            date,
            user_id: UserId::new(self.user_id.unwrap_or_default()),
        }
    }

    /// Overwrite the fields set in `update`.
    ///
    /// The category is cleared whenever the resulting document is not an
    /// expense, whichever fields the update sets.
    pub fn apply(&mut self, update: &TransactionUpdate) {
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }

        if let Some(amount) = update.amount {
            self.amount = Some(AmountField::Number(amount));
        }

        if let Some(kind) = &update.kind {
            self.kind = Some(kind.as_str().to_owned());
        }

        if let Some(category) = update.category {
            self.category = category.map(|category| category.as_str().to_owned());
        }

        // A missing type reads back as an expense.
        let is_expense = self
            .kind
            .as_deref()
            .is_none_or(|kind| kind == TransactionType::Expense.as_str());
        if !is_expense {
            self.category = None;
        }
    }
}
