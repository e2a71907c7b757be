//! Transaction receipt query
//!
//! Receipts lag submission, so this type widens the retryable set: a node
//! answering "not found yet" or "unknown" is polled again rather than
//! treated as terminal. Receipt reads are free.

use crate::error::Result;
use crate::ids::{AccountId, Timestamp, TransactionId};
use crate::status::Status;
use crate::wire::{DecodeError, QueryOperation, QueryResult, TransactionReceipt};

use super::{Query, QueryData};

const RECEIPT_RETRYABLE: &[Status] = &[
    Status::Busy,
    Status::PlatformNotActive,
    Status::ReceiptNotFound,
    Status::Unknown,
];

#[derive(Debug, Clone)]
pub struct TransactionReceiptQueryData {
    transaction_id: TransactionId,
}

impl Default for TransactionReceiptQueryData {
    fn default() -> Self {
        Self {
            transaction_id: TransactionId::new(
                AccountId::default(),
                Timestamp {
                    seconds: 0,
                    nanos: 0,
                },
            ),
        }
    }
}

impl QueryData for TransactionReceiptQueryData {
    type Output = TransactionReceipt;

    fn to_operation(&self) -> QueryOperation {
        QueryOperation::TransactionReceipt {
            transaction_id: self.transaction_id,
        }
    }

    fn map_result(result: QueryResult) -> Result<Self::Output> {
        match result {
            QueryResult::TransactionReceipt(receipt) => Ok(receipt),
            _ => Err(DecodeError::Malformed("expected receipt result".into()).into()),
        }
    }

    fn is_payment_required(&self) -> bool {
        false
    }

    fn retryable_statuses(&self) -> &[Status] {
        RECEIPT_RETRYABLE
    }
}

pub type TransactionReceiptQuery = Query<TransactionReceiptQueryData>;

impl TransactionReceiptQuery {
    pub fn new() -> Self {
        Self::with_data(TransactionReceiptQueryData::default())
    }

    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> &mut Self {
        self.data_mut().transaction_id = transaction_id;
        self
    }
}

impl Default for TransactionReceiptQuery {
    fn default() -> Self {
        Self::new()
    }
}
