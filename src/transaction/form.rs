//! Input validation for creating and editing transactions.
//!
//! All checks here run locally, before anything is sent to the document store.

use serde::Deserialize;
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    transaction::{ExpenseCategory, NewTransaction, TransactionType},
    user::UserId,
};

/// The max number of graphemes allowed in a transaction description.
pub const MAX_DESCRIPTION_LENGTH: usize = 50;

/// The reasons a transaction form can be rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The description was empty or only whitespace.
    #[error("Description is required")]
    EmptyDescription,

    /// The description is longer than [MAX_DESCRIPTION_LENGTH] graphemes.
    #[error("Description must be at most {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,

    /// The amount was zero, negative, NaN or infinite.
    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// The type string is not one of `income`, `expense` or `credit-card`.
    #[error("Invalid transaction type \"{0}\"")]
    InvalidType(String),

    /// The category string is not one of the expense categories.
    #[error("Invalid expense category \"{0}\"")]
    InvalidCategory(String),

    /// An update did not set any field.
    #[error("Nothing to update")]
    EmptyUpdate,
}

/// The raw fields a user submits to create a transaction.
///
/// Type and category are kept as strings so that a form with an unknown value
/// can be rejected with a [ValidationError] rather than failing to parse.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionForm {
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl TransactionForm {
    /// Create a form from already typed values.
    pub fn new(
        description: &str,
        amount: f64,
        kind: TransactionType,
        category: Option<ExpenseCategory>,
    ) -> Self {
        Self {
            description: description.to_owned(),
            amount,
            kind: kind.as_str().to_owned(),
            category: category.map(|category| category.as_str().to_owned()),
        }
    }

    /// Check the form and stamp it with its owner and creation time.
    ///
    /// The category is dropped for anything other than an expense, whether or
    /// not it was valid.
    ///
    /// # Errors
    ///
    /// Returns the first [ValidationError] found, checking the description,
    /// amount, type and category in that order.
    pub fn validate(
        &self,
        user_id: &UserId,
        now: OffsetDateTime,
    ) -> Result<NewTransaction, ValidationError> {
        let description = validate_description(&self.description)?;
        let amount = validate_amount(self.amount)?;
        let kind: TransactionType = self.kind.parse()?;

        let category = match (&kind, &self.category) {
            (TransactionType::Expense, Some(category)) => Some(category.parse()?),
            _ => None,
        };

        Ok(NewTransaction {
            description,
            amount,
            kind,
            category,
            date: now,
            user_id: user_id.clone(),
        })
    }
}

/// A partial edit of an existing transaction.
///
/// Fields left as `None` are not touched. `category` is doubly optional so that
/// an update can clear the category with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<TransactionType>,
    pub category: Option<Option<ExpenseCategory>>,
}

impl TransactionUpdate {
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn kind(mut self, kind: TransactionType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: Option<ExpenseCategory>) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.category.is_none()
    }

    /// Apply the same field checks as [TransactionForm::validate].
    ///
    /// Changing the type to anything other than an expense also clears the
    /// category.
    ///
    /// # Errors
    ///
    /// Returns [ValidationError::EmptyUpdate] if no field is set, otherwise the
    /// first invalid field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }

        let description = self
            .description
            .as_deref()
            .map(validate_description)
            .transpose()?;
        let amount = self.amount.map(validate_amount).transpose()?;

        let category = match &self.kind {
            Some(TransactionType::Unrecognized(other)) => {
                return Err(ValidationError::InvalidType(other.clone()));
            }
            Some(TransactionType::Expense) | None => self.category,
            Some(_) => Some(None),
        };

        Ok(Self {
            description,
            amount,
            kind: self.kind,
            category,
        })
    }

    /// Clear the category unless the transaction is still an expense once the
    /// update is applied to a transaction of `current_kind`.
    pub fn for_kind(mut self, current_kind: &TransactionType) -> Self {
        let is_expense = *self.kind.as_ref().unwrap_or(current_kind) == TransactionType::Expense;

        if !is_expense && matches!(self.category, Some(Some(_))) {
            self.category = Some(None);
        }

        self
    }
}

fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();

    if description.is_empty() {
        Err(ValidationError::EmptyDescription)
    } else if description.graphemes(true).count() > MAX_DESCRIPTION_LENGTH {
        Err(ValidationError::DescriptionTooLong)
    } else {
        Ok(description.to_owned())
    }
}

fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(ValidationError::InvalidAmount)
    }
}
