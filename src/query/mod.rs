//! Query lifecycle: cost negotiation, payment attachment, execution
//!
//! A query that needs payment and has none set first runs a cost-only
//! variant of itself through the engine, then embeds an operator→node
//! payment transfer in the real request's header. Payments are built per
//! candidate node so failover never desynchronizes payee and target.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::execution::{self, Executable, ExecutionState};
use crate::ids::{AccountId, TransactionId};
use crate::status::{Status, DEFAULT_RETRYABLE};
use crate::transaction::TransferTransaction;
use crate::transport::CallKind;
use crate::wire::{
    self, QueryEnvelope, QueryHeader, QueryOperation, QueryResult, ResponseEnvelope, ResponseKind,
    SignedPayload,
};

mod account_balance;
mod account_info;
mod transaction_receipt;

pub use account_balance::{AccountBalance, AccountBalanceData, AccountBalanceQuery};
pub use account_info::{AccountInfo, AccountInfoQuery, AccountInfoQueryData};
pub use transaction_receipt::{TransactionReceiptQuery, TransactionReceiptQueryData};

/// Operation-specific payload of a query.
pub trait QueryData: Clone + std::fmt::Debug + Send + Sync {
    type Output;

    fn to_operation(&self) -> QueryOperation;

    /// Map the populated result variant into the query's answer.
    fn map_result(result: QueryResult) -> Result<Self::Output>;

    /// Whether the network charges for this read.
    fn is_payment_required(&self) -> bool {
        true
    }

    /// Statuses classified RETRY for this query type. Overrides replace
    /// the default set wholesale, so they may narrow or widen it.
    fn retryable_statuses(&self) -> &[Status] {
        DEFAULT_RETRYABLE
    }
}

/// A query over one concrete operation type `D`.
#[derive(Debug, Clone)]
pub struct Query<D> {
    data: D,
    payment_amount: Option<u64>,
}

impl<D: QueryData> Query<D> {
    pub(crate) fn with_data(data: D) -> Self {
        Self {
            data,
            payment_amount: None,
        }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    /// Explicitly set the payment, skipping cost negotiation entirely.
    pub fn set_payment_amount(&mut self, tinybars: u64) -> &mut Self {
        self.payment_amount = Some(tinybars);
        self
    }

    /// Ask the network what this query costs, without running it.
    pub async fn get_cost(&self, client: &Client) -> Result<u64> {
        let probe = CostProbe {
            operation: self.data.to_operation(),
            retryable: self.data.retryable_statuses().to_vec(),
        };
        execution::execute(client, &probe, None).await
    }

    pub async fn execute(&mut self, client: &Client) -> Result<D::Output> {
        self.execute_with_timeout(client, None).await
    }

    pub async fn execute_with_timeout(
        &mut self,
        client: &Client,
        timeout: Option<Duration>,
    ) -> Result<D::Output> {
        let payments = if !self.data.is_payment_required() {
            HashMap::new()
        } else {
            let amount = match self.payment_amount {
                Some(amount) => amount,
                None => self.get_cost(client).await?,
            };
            build_payments(client, amount)?
        };

        let prepared = PreparedQuery {
            operation: self.data.to_operation(),
            retryable: self.data.retryable_statuses().to_vec(),
            payments,
            map: D::map_result,
        };
        execution::execute(client, &prepared, timeout).await
    }
}

/// One payment transfer per candidate node, signed by the operator.
fn build_payments(client: &Client, amount: u64) -> Result<HashMap<AccountId, SignedPayload>> {
    let operator = client.operator().ok_or(Error::NoOperator)?;
    let mut payments = HashMap::new();
    for node_account_id in client.network().all_node_ids() {
        let mut payment = TransferTransaction::new();
        payment
            .add_transfer(operator.account_id, -(amount as i64))?
            .add_transfer(node_account_id, amount as i64)?
            .set_transaction_id(TransactionId::generate(operator.account_id))?
            .set_node_account_ids(vec![node_account_id])?
            .freeze()?
            .sign(&operator.key)?;
        payments.insert(
            node_account_id,
            payment.signed_payload_for(&node_account_id)?.clone(),
        );
    }
    Ok(payments)
}

fn classify_query(status: Status, retryable: &[Status]) -> ExecutionState {
    match status {
        Status::Ok => ExecutionState::Finished,
        Status::TransactionExpired => ExecutionState::Expired,
        status if retryable.contains(&status) => ExecutionState::Retry,
        _ => ExecutionState::Error,
    }
}

/// The real query, payments attached, ready for the engine.
struct PreparedQuery<O> {
    operation: QueryOperation,
    retryable: Vec<Status>,
    payments: HashMap<AccountId, SignedPayload>,
    map: fn(QueryResult) -> Result<O>,
}

impl<O> Executable for PreparedQuery<O> {
    type Output = O;

    fn kind(&self) -> CallKind {
        CallKind::Query
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    fn bound_node_ids(&self) -> Option<Vec<AccountId>> {
        // A paid query can only target nodes it carries payments for.
        if self.payments.is_empty() {
            None
        } else {
            let mut ids: Vec<AccountId> = self.payments.keys().copied().collect();
            ids.sort();
            Some(ids)
        }
    }

    fn request_bytes(&self, node_account_id: &AccountId) -> Result<Vec<u8>> {
        let envelope = QueryEnvelope {
            header: QueryHeader {
                payment: self.payments.get(node_account_id).cloned(),
                response_kind: ResponseKind::Answer,
            },
            operation: self.operation.clone(),
        };
        wire::encode(&envelope)
    }

    fn classify(&self, response: &ResponseEnvelope) -> ExecutionState {
        classify_query(response.header.status, &self.retryable)
    }

    fn map_error(&self, response: &ResponseEnvelope) -> Error {
        Error::Precheck {
            status: response.header.status,
            transaction_id: None,
        }
    }

    fn map_output(&self, response: ResponseEnvelope) -> Result<Self::Output> {
        let result = response
            .result
            .ok_or_else(|| wire::DecodeError::Malformed("response carries no result".into()))?;
        (self.map)(result)
    }
}

/// Cost-only variant of a query: same operation, no payment, cost answer.
struct CostProbe {
    operation: QueryOperation,
    retryable: Vec<Status>,
}

impl Executable for CostProbe {
    type Output = u64;

    fn kind(&self) -> CallKind {
        CallKind::Query
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    fn bound_node_ids(&self) -> Option<Vec<AccountId>> {
        None
    }

    fn request_bytes(&self, _node_account_id: &AccountId) -> Result<Vec<u8>> {
        let envelope = QueryEnvelope {
            header: QueryHeader {
                payment: None,
                response_kind: ResponseKind::CostAnswer,
            },
            operation: self.operation.clone(),
        };
        wire::encode(&envelope)
    }

    fn classify(&self, response: &ResponseEnvelope) -> ExecutionState {
        classify_query(response.header.status, &self.retryable)
    }

    fn map_error(&self, response: &ResponseEnvelope) -> Error {
        Error::Precheck {
            status: response.header.status,
            transaction_id: None,
        }
    }

    fn map_output(&self, response: ResponseEnvelope) -> Result<Self::Output> {
        Ok(response.header.cost)
    }
}
