//! Defines the core data models for transactions.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{transaction::form::ValidationError, user::UserId};

// ============================================================================
// MODELS
// ============================================================================

/// The opaque ID the document store assigns to a transaction on creation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap a store-assigned ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether money was earned, spent, or put towards a credit card bill.
///
/// Records read back from the document store may carry a type string this
/// crate does not know about. Those are kept as [TransactionType::Unrecognized]
/// so that a single bad document does not poison the whole snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    /// Money coming in, e.g. salary.
    Income,
    /// Money going out.
    Expense,
    /// A credit card bill payment.
    CreditCard,
    /// A type string written by something other than this crate.
    Unrecognized(String),
}

impl TransactionType {
    /// The string used for this type in stored documents.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::CreditCard => "credit-card",
            Self::Unrecognized(other) => other,
        }
    }

    /// A human readable label for display.
    pub fn label(&self) -> &str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::CreditCard => "Credit Card",
            Self::Unrecognized(other) => other,
        }
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "credit-card" => Ok(Self::CreditCard),
            other => Err(ValidationError::InvalidType(other.to_owned())),
        }
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        value
            .parse()
            .unwrap_or(TransactionType::Unrecognized(value))
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        match value {
            TransactionType::Unrecognized(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fixed set of categories an expense can be filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Transportation,
    Utilities,
    Entertainment,
    Shopping,
    Healthcare,
    Other,
}

impl ExpenseCategory {
    /// Every category, in display order.
    pub const ALL: [ExpenseCategory; 7] = [
        Self::Food,
        Self::Transportation,
        Self::Utilities,
        Self::Entertainment,
        Self::Shopping,
        Self::Healthcare,
        Self::Other,
    ];

    /// The string used for this category in stored documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transportation => "transportation",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Shopping => "shopping",
            Self::Healthcare => "healthcare",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Food => "Food & Dining",
            Self::Transportation => "Transportation",
            Self::Utilities => "Utilities & Bills",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Healthcare => "Healthcare",
            Self::Other => "Other",
        }
    }
}

impl FromStr for ExpenseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidCategory(s.to_owned()))
    }
}

impl Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An income, expense or credit card payment recorded by a user.
///
/// Transactions are only ever created by the document store. To record a new
/// one, validate a [TransactionForm](crate::transaction::TransactionForm) and hand it to
/// [LiveTransactionStore::add](crate::LiveTransactionStore::add).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short text description of what the transaction was for.
    pub description: String,
    /// The amount of money, always positive. The sign is implied by `kind`.
    pub amount: f64,
    /// Whether this is income, an expense or a credit card payment.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The expense category. Only meaningful when `kind` is an expense and may
    /// be missing even then.
    #[serde(default)]
    pub category: Option<ExpenseCategory>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The user that owns the transaction.
    pub user_id: UserId,
}

/// A validated transaction that has not been written to the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionType,
    /// Always `None` unless `kind` is [TransactionType::Expense].
    pub category: Option<ExpenseCategory>,
    pub date: OffsetDateTime,
    pub user_id: UserId,
}

impl NewTransaction {
    /// Attach the store-assigned ID.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            description: self.description,
            amount: self.amount,
            kind: self.kind,
            category: self.category,
            date: self.date,
            user_id: self.user_id,
        }
    }
}
