//! Account creation transaction

use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use crate::wire::{AccountCreateBody, DecodeError, TransactionOperation};

use super::{Transaction, TransactionData};

#[derive(Debug, Clone, Default)]
pub struct AccountCreateData {
    key: Vec<u8>,
    initial_balance: u64,
    account_memo: String,
}

impl TransactionData for AccountCreateData {
    fn into_operation(self) -> TransactionOperation {
        TransactionOperation::AccountCreate(AccountCreateBody {
            key: self.key,
            initial_balance: self.initial_balance,
            memo: self.account_memo,
        })
    }

    fn try_from_operation(operation: TransactionOperation) -> Result<Self> {
        match operation {
            TransactionOperation::AccountCreate(body) => Ok(Self {
                key: body.key,
                initial_balance: body.initial_balance,
                account_memo: body.memo,
            }),
            other => Err(Error::Decode(DecodeError::Malformed(format!(
                "expected account create body, got {}",
                other.name()
            )))),
        }
    }
}

/// Creates a new account; the receipt carries the assigned account id.
pub type AccountCreateTransaction = Transaction<AccountCreateData>;

impl AccountCreateTransaction {
    pub fn new() -> Self {
        Self::with_data(AccountCreateData::default())
    }

    /// Key controlling the new account.
    pub fn set_key(&mut self, key: &PublicKey) -> Result<&mut Self> {
        self.data_mut("key")?.key = key.to_bytes().to_vec();
        Ok(self)
    }

    pub fn set_initial_balance(&mut self, tinybars: u64) -> Result<&mut Self> {
        self.data_mut("initial_balance")?.initial_balance = tinybars;
        Ok(self)
    }

    pub fn set_account_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.data_mut("account_memo")?.account_memo = memo.into();
        Ok(self)
    }
}

impl Default for AccountCreateTransaction {
    fn default() -> Self {
        Self::new()
    }
}
