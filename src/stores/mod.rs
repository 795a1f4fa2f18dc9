//! Contains the document store contract and an in-memory implementation.

mod document;
mod memory;
mod transaction;

pub use document::{AmountField, TransactionDocument};
pub use memory::MemoryDocumentStore;
pub use transaction::{
    DocumentStore, LiveQuery, LiveQuerySender, QueryEvent, SortOrder, StoreError,
    TransactionQuery,
};
