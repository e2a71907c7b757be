//! Error taxonomy for the whole crate
//!
//! Four terminal kinds are kept distinct and never conflated: precheck
//! rejection, post-consensus failure (carrying the receipt), attempt
//! exhaustion (carrying the last node and underlying error), and expiry.
//! Everything else is a local failure surfaced before a request ever
//! reaches a node.

use thiserror::Error;

use crate::ids::{AccountId, TransactionId};
use crate::status::Status;
use crate::transport::TransportError;
use crate::wire::{DecodeError, TransactionReceipt};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The request was rejected synchronously, before affecting ledger state.
    #[error("precheck rejected request with status {status:?} (transaction: {transaction_id:?})")]
    Precheck {
        status: Status,
        transaction_id: Option<TransactionId>,
    },

    /// The request reached consensus but the recorded outcome is a failure.
    ///
    /// Carries the full receipt so callers can still inspect created-entity
    /// fields on partial failure.
    #[error("receipt carries failure status {status:?} (transaction: {transaction_id:?})")]
    Receipt {
        status: Status,
        transaction_id: Option<TransactionId>,
        receipt: Box<TransactionReceipt>,
    },

    /// Every attempt failed with a transient or transport-level error.
    #[error("exhausted {attempts} attempts; last node {node_account_id:?}: {last_error}")]
    MaxAttempts {
        attempts: u32,
        node_account_id: Option<AccountId>,
        #[source]
        last_error: Box<Error>,
    },

    /// The request's validity window elapsed before a definitive outcome.
    #[error("request expired before a terminal outcome (transaction: {transaction_id:?})")]
    Expired {
        transaction_id: Option<TransactionId>,
    },

    /// A single attempt could not reach the node or died in flight.
    /// Recovered internally via node rotation up to the attempt budget.
    #[error("transport failure at node {node_account_id}: {source}")]
    Transport {
        node_account_id: AccountId,
        #[source]
        source: TransportError,
    },

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A mutation was attempted after freeze.
    #[error("`{field}` cannot change after the request is frozen")]
    Immutable { field: &'static str },

    /// An operation that needs a frozen request was called too early.
    #[error("{operation} requires a frozen request")]
    NotFrozen { operation: &'static str },

    #[error("signature error: {0}")]
    Signature(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The client has no operator configured but one is required.
    #[error("client has no operator configured")]
    NoOperator,
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn immutable(field: &'static str) -> Self {
        Self::Immutable { field }
    }

    pub(crate) fn not_frozen(operation: &'static str) -> Self {
        Self::NotFrozen { operation }
    }

    /// The status a terminal network outcome carried, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Precheck { status, .. } | Self::Receipt { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error originated below the protocol, at the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
