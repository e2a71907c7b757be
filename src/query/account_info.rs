//! Account info query

use crate::error::Result;
use crate::ids::AccountId;
use crate::wire::{DecodeError, QueryOperation, QueryResult};

use super::{Query, QueryData};

#[derive(Debug, Clone, Default)]
pub struct AccountInfoQueryData {
    account_id: AccountId,
}

/// Answer to an info query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_id: AccountId,
    pub balance: u64,
    /// Raw public key bytes controlling the account.
    pub key: Vec<u8>,
    pub memo: String,
}

impl QueryData for AccountInfoQueryData {
    type Output = AccountInfo;

    fn to_operation(&self) -> QueryOperation {
        QueryOperation::AccountInfo {
            account_id: self.account_id,
        }
    }

    fn map_result(result: QueryResult) -> Result<Self::Output> {
        match result {
            QueryResult::AccountInfo(info) => Ok(AccountInfo {
                account_id: info.account_id,
                balance: info.balance,
                key: info.key,
                memo: info.memo,
            }),
            _ => Err(DecodeError::Malformed("expected account info result".into()).into()),
        }
    }
}

pub type AccountInfoQuery = Query<AccountInfoQueryData>;

impl AccountInfoQuery {
    pub fn new() -> Self {
        Self::with_data(AccountInfoQueryData::default())
    }

    pub fn set_account_id(&mut self, account_id: AccountId) -> &mut Self {
        self.data_mut().account_id = account_id;
        self
    }
}

impl Default for AccountInfoQuery {
    fn default() -> Self {
        Self::new()
    }
}
