//! Crypto transfer transaction

use crate::error::{Error, Result};
use crate::ids::AccountId;
use crate::wire::{AccountAmount, DecodeError, TransactionOperation, TransferBody};

use super::{Transaction, TransactionData};

#[derive(Debug, Clone, Default)]
pub struct TransferData {
    transfers: Vec<AccountAmount>,
}

impl TransactionData for TransferData {
    fn into_operation(self) -> TransactionOperation {
        TransactionOperation::Transfer(TransferBody {
            transfers: self.transfers,
        })
    }

    fn try_from_operation(operation: TransactionOperation) -> Result<Self> {
        match operation {
            TransactionOperation::Transfer(body) => Ok(Self {
                transfers: body.transfers,
            }),
            other => Err(Error::Decode(DecodeError::Malformed(format!(
                "expected transfer body, got {}",
                other.name()
            )))),
        }
    }
}

/// Moves tinybars between accounts; the transfer list should sum to zero.
pub type TransferTransaction = Transaction<TransferData>;

impl TransferTransaction {
    pub fn new() -> Self {
        Self::with_data(TransferData::default())
    }

    pub fn add_transfer(&mut self, account_id: AccountId, amount: i64) -> Result<&mut Self> {
        self.data_mut("transfers")?
            .transfers
            .push(AccountAmount { account_id, amount });
        Ok(self)
    }

    pub fn transfers(&self) -> &[AccountAmount] {
        &self.data().transfers
    }
}

impl Default for TransferTransaction {
    fn default() -> Self {
        Self::new()
    }
}
