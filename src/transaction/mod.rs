//! Transaction models and input validation.
//!
//! This module contains:
//! - The `Transaction` model and the enumerations for its type and category
//! - `TransactionForm` and `TransactionUpdate`, which validate user input
//!   before anything is sent to the document store

mod core;
mod form;

pub use core::{ExpenseCategory, NewTransaction, Transaction, TransactionId, TransactionType};
pub use form::{MAX_DESCRIPTION_LENGTH, TransactionForm, TransactionUpdate, ValidationError};
