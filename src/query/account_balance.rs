//! Account balance query
//!
//! Balance reads are free on the reference network, so this type opts out
//! of payment and cost negotiation entirely.

use crate::error::Result;
use crate::ids::AccountId;
use crate::wire::{DecodeError, QueryOperation, QueryResult};

use super::{Query, QueryData};

#[derive(Debug, Clone, Default)]
pub struct AccountBalanceData {
    account_id: AccountId,
}

/// Answer to a balance query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub balance: u64,
}

impl QueryData for AccountBalanceData {
    type Output = AccountBalance;

    fn to_operation(&self) -> QueryOperation {
        QueryOperation::AccountBalance {
            account_id: self.account_id,
        }
    }

    fn map_result(result: QueryResult) -> Result<Self::Output> {
        match result {
            QueryResult::AccountBalance {
                account_id,
                balance,
            } => Ok(AccountBalance {
                account_id,
                balance,
            }),
            _ => Err(DecodeError::Malformed("expected balance result".into()).into()),
        }
    }

    fn is_payment_required(&self) -> bool {
        false
    }
}

pub type AccountBalanceQuery = Query<AccountBalanceData>;

impl AccountBalanceQuery {
    pub fn new() -> Self {
        Self::with_data(AccountBalanceData::default())
    }

    pub fn set_account_id(&mut self, account_id: AccountId) -> &mut Self {
        self.data_mut().account_id = account_id;
        self
    }
}

impl Default for AccountBalanceQuery {
    fn default() -> Self {
        Self::new()
    }
}
