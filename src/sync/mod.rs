//! Keeps a live copy of the signed in user's transactions in step with the
//! document store.

mod live;
mod mutation;
mod retry;

pub use live::{LiveTransactionStore, SyncState};
pub use mutation::Action;
pub use retry::{RetryDecision, RetryPolicy, RetryState, SubscriptionPhase};
