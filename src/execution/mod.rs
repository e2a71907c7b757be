//! Generic request execution engine
//!
//! Drives anything implementing [`Executable`] through up to
//! `max_attempts` tries: exponential backoff between attempts, node
//! rotation on transport failure, immediate termination on a definitive
//! outcome. The loop is sequential by design; correctness depends on
//! observing one node's outcome before switching to the next.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::ids::{AccountId, TransactionId};
use crate::transport::CallKind;
use crate::wire::{self, ResponseEnvelope};

/// Per-attempt classification of a decoded response. Never persisted
/// beyond one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Retry,
    Finished,
    Error,
    Expired,
}

/// Backoff and attempt budget for one execution.
///
/// Growth is strict doubling from `min_backoff`, capped at `max_backoff`:
/// attempt 1 has no pre-wait, attempt 2 waits `min_backoff`, attempt 3
/// twice that, and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_millis(8_000),
        }
    }
}

impl RetryPolicy {
    /// Delay inserted before 1-based `attempt`.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let doublings = (attempt - 2).min(63);
        let millis = (self.min_backoff.as_millis() as u128) << doublings;
        Duration::from_millis(millis.min(self.max_backoff.as_millis()) as u64)
    }
}

/// The capability set every request variant implements. The engine holds
/// only this contract; it never inspects raw status codes itself.
pub trait Executable: Send + Sync {
    type Output;

    /// Which of the two transport method shapes this request dispatches as.
    fn kind(&self) -> CallKind;

    /// Request identifier, once one is bound.
    fn transaction_id(&self) -> Option<TransactionId>;

    /// Nodes this request is already bound to, in binding order. `None`
    /// means any topology node may serve it.
    fn bound_node_ids(&self) -> Option<Vec<AccountId>>;

    /// The serialized request for one specific node.
    fn request_bytes(&self, node_account_id: &AccountId) -> Result<Vec<u8>>;

    /// Classify a decoded response into the state driving the loop.
    fn classify(&self, response: &ResponseEnvelope) -> ExecutionState;

    /// Map a response classified ERROR (or RETRY, for exhaustion
    /// reporting) into a typed error.
    fn map_error(&self, response: &ResponseEnvelope) -> Error;

    /// Map a response classified FINISHED into the terminal value.
    fn map_output(&self, response: ResponseEnvelope) -> Result<Self::Output>;
}

/// Run `executable` against the client's network until a terminal outcome
/// or the attempt budget runs out.
pub(crate) async fn execute<E: Executable>(
    client: &Client,
    executable: &E,
    overall_deadline: Option<Duration>,
) -> Result<E::Output> {
    let policy = client.retry_policy();
    let bound = executable.bound_node_ids();
    let transaction_id = executable.transaction_id();
    let started = Instant::now();

    let mut attempts_made = 0u32;
    let mut last_node: Option<AccountId> = None;
    let mut last_error: Option<Error> = None;

    for attempt in 1..=policy.max_attempts {
        let delay = policy.delay_before_attempt(attempt);
        if let Some(overall) = overall_deadline {
            if started.elapsed() + delay >= overall {
                break;
            }
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        // First attempt honors the node bound at freeze time; later
        // attempts rotate for failover.
        let mut node = match &bound {
            Some(ids) if attempt == 1 => client
                .network()
                .node(&ids[0])
                .ok_or_else(|| Error::config(format!("bound node {} not in topology", ids[0])))?,
            Some(ids) => client.network().select_node_among(ids)?,
            None => client.network().select_node()?,
        };
        // A failed attempt must not burn the next one on the same node
        // while alternatives exist.
        if attempt > 1 && Some(node.account_id()) == last_node {
            let alternatives = bound.as_ref().map(Vec::len).unwrap_or(usize::MAX) > 1;
            if alternatives {
                node = match &bound {
                    Some(ids) => client.network().select_node_among(ids)?,
                    None => client.network().select_node()?,
                };
            }
        }
        let node_account_id = node.account_id();
        let payload = executable.request_bytes(&node_account_id)?;
        attempts_made = attempt;
        last_node = Some(node_account_id);

        debug!(
            transaction_id = ?transaction_id,
            node = %node_account_id,
            attempt,
            "dispatching request"
        );

        let per_attempt = per_attempt_deadline(client, overall_deadline, &started);
        let outcome = client
            .transport()
            .call(&node, executable.kind(), &payload, per_attempt)
            .await;

        let raw = match outcome {
            Ok(raw) => raw,
            Err(source) => {
                warn!(
                    node = %node_account_id,
                    attempt,
                    error = %source,
                    "transport failure, rotating node"
                );
                last_error = Some(Error::Transport {
                    node_account_id,
                    source,
                });
                continue;
            }
        };

        let response: ResponseEnvelope = wire::decode(&raw)?;
        let state = executable.classify(&response);
        debug!(
            transaction_id = ?transaction_id,
            node = %node_account_id,
            attempt,
            state = ?state,
            "attempt classified"
        );

        match state {
            ExecutionState::Finished => return executable.map_output(response),
            ExecutionState::Error => return Err(executable.map_error(&response)),
            ExecutionState::Expired => {
                return Err(Error::Expired { transaction_id });
            }
            ExecutionState::Retry => {
                last_error = Some(executable.map_error(&response));
            }
        }
    }

    Err(Error::MaxAttempts {
        attempts: attempts_made,
        node_account_id: last_node,
        last_error: Box::new(
            last_error.unwrap_or_else(|| Error::config("no attempt could be made")),
        ),
    })
}

fn per_attempt_deadline(
    client: &Client,
    overall: Option<Duration>,
    started: &Instant,
) -> Option<Duration> {
    let per_attempt = client.request_timeout();
    let remaining = overall.map(|o| o.saturating_sub(started.elapsed()));
    match (per_attempt, remaining) {
        (Some(p), Some(r)) => Some(p.min(r)),
        (Some(p), None) => Some(p),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_sequence_is_exact_for_reference_tuning() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=9)
            .map(|attempt| policy.delay_before_attempt(attempt).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![0, 250, 500, 1_000, 2_000, 4_000, 8_000, 8_000, 8_000]);
    }

    #[test]
    fn delay_growth_stays_capped_for_custom_tuning() {
        let policy = RetryPolicy {
            max_attempts: 6,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        let delays: Vec<u64> = (1..=6)
            .map(|attempt| policy.delay_before_attempt(attempt).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![0, 100, 200, 350, 350, 350]);
    }

    #[test]
    fn huge_attempt_numbers_do_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_before_attempt(u32::MAX),
            policy.max_backoff
        );
    }
}
