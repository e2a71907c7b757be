//! Response status codes shared by precheck headers and receipts

use serde::{Deserialize, Serialize};

/// Status code carried in every response header and in receipts.
///
/// The engine never branches on these directly; each request type maps them
/// to an execution state, and the defaults below are the starting point for
/// that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Ok,
    /// The node has not resolved the request yet.
    Unknown,
    /// The node is overloaded and refused the request for now.
    Busy,
    /// The node is up but the consensus platform behind it is not.
    PlatformNotActive,
    InvalidTransaction,
    InvalidSignature,
    PayerAccountNotFound,
    InsufficientPayerBalance,
    InsufficientTransactionFee,
    InsufficientQueryPayment,
    DuplicateTransaction,
    TransactionExpired,
    InvalidNodeAccount,
    AccountNotFound,
    TopicNotFound,
    ReceiptNotFound,
}

/// Statuses every request type treats as transient unless it overrides the
/// set wholesale.
pub const DEFAULT_RETRYABLE: &[Status] = &[Status::Busy, Status::PlatformNotActive];

impl Status {
    /// Whether the default classification retries this status.
    pub fn is_retryable_default(self) -> bool {
        DEFAULT_RETRYABLE.contains(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retryable_set() {
        assert!(Status::Busy.is_retryable_default());
        assert!(Status::PlatformNotActive.is_retryable_default());

        assert!(!Status::Ok.is_retryable_default());
        assert!(!Status::InvalidSignature.is_retryable_default());
        assert!(!Status::TransactionExpired.is_retryable_default());
        assert!(!Status::ReceiptNotFound.is_retryable_default());
    }
}
