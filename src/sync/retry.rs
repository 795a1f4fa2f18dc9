//! The bounded retry policy for establishing live queries.

use std::time::Duration;

use crate::stores::StoreError;

/// Where a subscription is in its lifecycle.
///
/// ```text
/// Idle -> Subscribing -> Synced -> (Retrying -> Subscribing)* -> Synced
///                                                             \-> Failed
/// any -> TornDown
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    /// No verified user, so nothing to subscribe to.
    Idle,
    /// Waiting for the first message from a new live query.
    Subscribing,
    /// At least one snapshot has been received from the current live query.
    Synced,
    /// Waiting to re-establish a live query. `attempt` counts from 1.
    Retrying { attempt: u32 },
    /// The live query failed for good. No more retries will be made until the
    /// identity changes.
    Failed,
    /// The store has been disposed.
    TornDown,
}

/// A fixed-delay, bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

/// What to do after a live query ends with an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `delay`, then subscribe again. `attempt` counts from 1.
    Retry { attempt: u32, delay: Duration },
    /// The retries for a transient error have run out.
    Exhausted,
    /// The error is not one that retrying can fix.
    Permanent,
}

/// Counts consecutive transient failures against a [RetryPolicy].
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    retries: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, retries: 0 }
    }

    /// The number of retries made since the last successful snapshot.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    /// Record a successful snapshot, which resets the retry count.
    pub fn on_success(&mut self) {
        self.retries = 0;
    }

    /// Decide how to handle a live query that ended with `error`.
    ///
    /// Only [StoreError::FailedPrecondition] is retried.
    pub fn on_error(&mut self, error: &StoreError) -> RetryDecision {
        if !matches!(error, StoreError::FailedPrecondition) {
            return RetryDecision::Permanent;
        }

        if self.retries >= self.policy.max_retries {
            return RetryDecision::Exhausted;
        }

        self.retries += 1;

        RetryDecision::Retry {
            attempt: self.retries,
            delay: self.policy.delay,
        }
    }
}
