//! Transaction lifecycle: build, freeze, sign, serialize, execute
//!
//! A transaction starts as a mutable builder. Freezing snapshots it into
//! one signable body per candidate node and forbids every further field
//! mutation. Signing is additive and idempotent per key. Serialization
//! emits the frozen bodies with their accumulated signatures and round
//! trips through [`AnyTransaction::from_bytes`].

use std::time::Duration;

use sha2::{Digest, Sha384};

use crate::client::Client;
use crate::crypto::{PrivateKey, PublicKey};
use crate::error::{Error, Result};
use crate::execution::{self, Executable, ExecutionState};
use crate::ids::{AccountId, TransactionId};
use crate::transport::CallKind;
use crate::wire::{
    self, DecodeError, QueryResult, ResponseEnvelope, SignaturePair, SignedPayload,
    TransactionBody, TransactionEnvelope, TransactionOperation,
};

mod account_create;
mod topic_message;
mod transfer;

pub use account_create::{AccountCreateData, AccountCreateTransaction};
pub use topic_message::{TopicMessageSubmitData, TopicMessageSubmitTransaction};
pub use transfer::{TransferData, TransferTransaction};

pub use crate::wire::TransactionReceipt;

/// Fee ceiling used when neither the transaction nor a client supplies one.
const FALLBACK_MAX_FEE: u64 = 100_000_000;

/// Window, in seconds, during which a frozen transaction is valid.
const DEFAULT_VALID_DURATION_SECS: u64 = 120;

/// Operation-specific payload of a transaction.
///
/// Implementations are thin data producers; the shared lifecycle and the
/// execution contract live on [`Transaction`] itself.
pub trait TransactionData: Clone + std::fmt::Debug + Send + Sync {
    fn into_operation(self) -> TransactionOperation;

    fn try_from_operation(operation: TransactionOperation) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug, Clone)]
struct NodePayload {
    node_account_id: AccountId,
    payload: SignedPayload,
}

#[derive(Debug, Clone)]
struct Frozen {
    transaction_id: TransactionId,
    payloads: Vec<NodePayload>,
}

/// A transaction over one concrete operation type `D`.
#[derive(Debug, Clone)]
pub struct Transaction<D> {
    data: D,
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    max_fee: Option<u64>,
    memo: String,
    valid_duration_secs: u64,
    frozen: Option<Frozen>,
}

impl<D: TransactionData> Transaction<D> {
    pub(crate) fn with_data(data: D) -> Self {
        Self {
            data,
            transaction_id: None,
            node_account_ids: None,
            max_fee: None,
            memo: String::new(),
            valid_duration_secs: DEFAULT_VALID_DURATION_SECS,
            frozen: None,
        }
    }

    fn require_mutable(&self, field: &'static str) -> Result<()> {
        if self.frozen.is_some() {
            return Err(Error::immutable(field));
        }
        Ok(())
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self, field: &'static str) -> Result<&mut D> {
        self.require_mutable(field)?;
        Ok(&mut self.data)
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.frozen
            .as_ref()
            .map(|f| f.transaction_id)
            .or(self.transaction_id)
    }

    pub fn set_transaction_id(&mut self, transaction_id: TransactionId) -> Result<&mut Self> {
        self.require_mutable("transaction_id")?;
        self.transaction_id = Some(transaction_id);
        Ok(self)
    }

    /// Explicit target nodes. A single id produces a single-node freeze
    /// with no failover; several ids enable body-per-node failover.
    pub fn set_node_account_ids(&mut self, ids: Vec<AccountId>) -> Result<&mut Self> {
        self.require_mutable("node_account_ids")?;
        self.node_account_ids = Some(ids);
        Ok(self)
    }

    pub fn set_max_fee(&mut self, max_fee: u64) -> Result<&mut Self> {
        self.require_mutable("max_fee")?;
        self.max_fee = Some(max_fee);
        Ok(self)
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.require_mutable("memo")?;
        self.memo = memo.into();
        Ok(self)
    }

    pub fn set_valid_duration(&mut self, duration: Duration) -> Result<&mut Self> {
        self.require_mutable("valid_duration")?;
        self.valid_duration_secs = duration.as_secs();
        Ok(self)
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Freeze against explicitly supplied identifiers. Requires a
    /// transaction id and at least one node id to already be set.
    pub fn freeze(&mut self) -> Result<&mut Self> {
        let transaction_id = self
            .transaction_id
            .ok_or_else(|| Error::config("freeze requires a transaction id"))?;
        let node_ids = self
            .node_account_ids
            .clone()
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| Error::config("freeze requires at least one node account id"))?;
        self.freeze_inner(transaction_id, node_ids)?;
        Ok(self)
    }

    /// Topology-aware freeze: derives the transaction id from the client's
    /// operator when unset, and builds one body per topology node so the
    /// engine can fail over transparently.
    pub fn freeze_with(&mut self, client: &Client) -> Result<&mut Self> {
        if self.frozen.is_some() {
            return Err(Error::immutable("transaction"));
        }
        let transaction_id = match self.transaction_id {
            Some(id) => id,
            None => client.generate_transaction_id()?,
        };
        let node_ids = match self.node_account_ids.clone().filter(|ids| !ids.is_empty()) {
            Some(ids) => ids,
            None => client.network().all_node_ids(),
        };
        let max_fee = self.max_fee.unwrap_or_else(|| client.default_max_fee());
        self.max_fee = Some(max_fee);
        self.freeze_inner(transaction_id, node_ids)?;
        Ok(self)
    }

    fn freeze_inner(
        &mut self,
        transaction_id: TransactionId,
        node_ids: Vec<AccountId>,
    ) -> Result<()> {
        if self.frozen.is_some() {
            return Err(Error::immutable("transaction"));
        }
        let mut payloads = Vec::with_capacity(node_ids.len());
        for node_account_id in node_ids {
            let body = TransactionBody {
                transaction_id,
                node_account_id,
                max_fee: self.max_fee.unwrap_or(FALLBACK_MAX_FEE),
                valid_duration_secs: self.valid_duration_secs,
                memo: self.memo.clone(),
                operation: self.data.clone().into_operation(),
            };
            payloads.push(NodePayload {
                node_account_id,
                payload: SignedPayload {
                    body: wire::encode(&body)?,
                    signatures: Vec::new(),
                },
            });
        }
        self.frozen = Some(Frozen {
            transaction_id,
            payloads,
        });
        Ok(())
    }

    /// Append a signature entry for `key` over every frozen body.
    ///
    /// Signing the same key again replaces its entry rather than adding a
    /// second one; entry order is insertion order.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<&mut Self> {
        let frozen = self
            .frozen
            .as_mut()
            .ok_or_else(|| Error::not_frozen("sign"))?;
        let public_key = key.public_key().to_bytes().to_vec();
        for node_payload in &mut frozen.payloads {
            let signature = key.sign(&node_payload.payload.body);
            let signatures = &mut node_payload.payload.signatures;
            match signatures.iter_mut().find(|p| p.public_key == public_key) {
                Some(existing) => existing.signature = signature,
                None => signatures.push(SignaturePair {
                    public_key: public_key.clone(),
                    signature,
                }),
            }
        }
        Ok(self)
    }

    /// Whether `public_key` already has a signature entry.
    pub fn signed_by(&self, public_key: &PublicKey) -> bool {
        let bytes = public_key.to_bytes();
        self.frozen
            .as_ref()
            .and_then(|f| f.payloads.first())
            .map(|p| p.payload.signatures.iter().any(|s| s.public_key == bytes))
            .unwrap_or(false)
    }

    /// Signing keys in entry order.
    pub fn signer_keys(&self) -> Vec<Vec<u8>> {
        self.frozen
            .as_ref()
            .and_then(|f| f.payloads.first())
            .map(|p| {
                p.payload
                    .signatures
                    .iter()
                    .map(|s| s.public_key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Node ids this transaction holds bodies for, in freeze order.
    pub fn frozen_node_ids(&self) -> Vec<AccountId> {
        self.frozen
            .as_ref()
            .map(|f| f.payloads.iter().map(|p| p.node_account_id).collect())
            .unwrap_or_default()
    }

    pub(crate) fn signed_payload_for(&self, node_account_id: &AccountId) -> Result<&SignedPayload> {
        let frozen = self
            .frozen
            .as_ref()
            .ok_or_else(|| Error::not_frozen("request serialization"))?;
        let node_payload = frozen
            .payloads
            .iter()
            .find(|p| p.node_account_id == *node_account_id)
            .or_else(|| frozen.payloads.first())
            .ok_or_else(|| Error::config("frozen transaction has no node payloads"))?;
        Ok(&node_payload.payload)
    }

    /// Serialize the frozen transaction, signed or not.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let frozen = self
            .frozen
            .as_ref()
            .ok_or_else(|| Error::not_frozen("to_bytes"))?;
        let envelope = TransactionEnvelope {
            payloads: frozen.payloads.iter().map(|p| p.payload.clone()).collect(),
        };
        wire::encode(&envelope)
    }

    /// SHA-384 digest of the first frozen body; a stable submission
    /// reference.
    pub fn hash(&self) -> Result<Vec<u8>> {
        let frozen = self
            .frozen
            .as_ref()
            .ok_or_else(|| Error::not_frozen("hash"))?;
        let first = frozen
            .payloads
            .first()
            .ok_or_else(|| Error::config("frozen transaction has no node payloads"))?;
        Ok(Sha384::digest(&first.payload.body).to_vec())
    }

    /// Run the transaction: auto-freezes against the client topology and
    /// auto-signs with the operator key when not already done, then hands
    /// off to the execution engine.
    pub async fn execute(&mut self, client: &Client) -> Result<TransactionReceipt> {
        self.execute_with_timeout(client, None).await
    }

    /// Like [`execute`](Self::execute) with an overall deadline across all
    /// attempts.
    pub async fn execute_with_timeout(
        &mut self,
        client: &Client,
        timeout: Option<Duration>,
    ) -> Result<TransactionReceipt> {
        if self.frozen.is_none() {
            self.freeze_with(client)?;
        }
        if let Some(operator) = client.operator() {
            if !self.signed_by(&operator.key.public_key()) {
                self.sign(&operator.key)?;
            }
        }
        execution::execute(client, self, timeout).await
    }
}

impl<D: TransactionData> Executable for Transaction<D> {
    type Output = TransactionReceipt;

    fn kind(&self) -> CallKind {
        CallKind::Submit
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        Transaction::transaction_id(self)
    }

    fn bound_node_ids(&self) -> Option<Vec<AccountId>> {
        let ids = self.frozen_node_ids();
        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }

    fn request_bytes(&self, node_account_id: &AccountId) -> Result<Vec<u8>> {
        wire::encode(self.signed_payload_for(node_account_id)?)
    }

    fn classify(&self, response: &ResponseEnvelope) -> ExecutionState {
        match response.header.status {
            crate::status::Status::Ok => ExecutionState::Finished,
            crate::status::Status::TransactionExpired => ExecutionState::Expired,
            status if status.is_retryable_default() => ExecutionState::Retry,
            _ => ExecutionState::Error,
        }
    }

    fn map_error(&self, response: &ResponseEnvelope) -> Error {
        Error::Precheck {
            status: response.header.status,
            transaction_id: Transaction::transaction_id(self),
        }
    }

    fn map_output(&self, response: ResponseEnvelope) -> Result<Self::Output> {
        let receipt = match response.result {
            Some(QueryResult::TransactionReceipt(receipt)) => receipt,
            _ => TransactionReceipt {
                status: response.header.status,
                account_id: None,
                topic_sequence_number: None,
            },
        };
        if receipt.status == crate::status::Status::Ok {
            Ok(receipt)
        } else {
            Err(Error::Receipt {
                status: receipt.status,
                transaction_id: Transaction::transaction_id(self),
                receipt: Box::new(receipt),
            })
        }
    }
}

/// Payload of a transaction reconstructed from bytes; the discriminator
/// dispatches to the concrete operation variant.
#[derive(Debug, Clone)]
pub struct AnyTransactionData(TransactionOperation);

impl TransactionData for AnyTransactionData {
    fn into_operation(self) -> TransactionOperation {
        self.0
    }

    fn try_from_operation(operation: TransactionOperation) -> Result<Self> {
        Ok(Self(operation))
    }
}

pub type AnyTransaction = Transaction<AnyTransactionData>;

impl AnyTransaction {
    /// Reconstruct a frozen (and possibly signed) transaction from bytes
    /// previously produced by [`Transaction::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: TransactionEnvelope = wire::decode(bytes)?;
        if envelope.payloads.is_empty() {
            return Err(DecodeError::Malformed("envelope has no payloads".into()).into());
        }

        let mut payloads = Vec::with_capacity(envelope.payloads.len());
        let mut first_body: Option<TransactionBody> = None;
        for payload in envelope.payloads {
            let body: TransactionBody = wire::decode(&payload.body)?;
            if let Some(first) = &first_body {
                if body.transaction_id != first.transaction_id {
                    return Err(DecodeError::Malformed(
                        "payloads disagree on transaction id".into(),
                    )
                    .into());
                }
                if std::mem::discriminant(&body.operation)
                    != std::mem::discriminant(&first.operation)
                {
                    return Err(DecodeError::Malformed(
                        "payloads disagree on operation discriminator".into(),
                    )
                    .into());
                }
            }
            payloads.push(NodePayload {
                node_account_id: body.node_account_id,
                payload,
            });
            first_body.get_or_insert(body);
        }

        // Non-empty payloads guarantee the first body exists.
        let body = first_body.ok_or_else(|| {
            Error::from(DecodeError::Malformed("envelope has no payloads".into()))
        })?;
        Ok(Self {
            data: AnyTransactionData(body.operation),
            transaction_id: Some(body.transaction_id),
            node_account_ids: Some(payloads.iter().map(|p| p.node_account_id).collect()),
            max_fee: Some(body.max_fee),
            memo: body.memo,
            valid_duration_secs: body.valid_duration_secs,
            frozen: Some(Frozen {
                transaction_id: body.transaction_id,
                payloads,
            }),
        })
    }

    /// The reconstructed operation variant.
    pub fn operation(&self) -> &TransactionOperation {
        &self.data.0
    }

    /// Convert into a concrete transaction type; fails when the body's
    /// discriminator names a different operation.
    pub fn downcast<D: TransactionData>(self) -> Result<Transaction<D>> {
        Ok(Transaction {
            data: D::try_from_operation(self.data.0)?,
            transaction_id: self.transaction_id,
            node_account_ids: self.node_account_ids,
            max_fee: self.max_fee,
            memo: self.memo,
            valid_duration_secs: self.valid_duration_secs,
            frozen: self.frozen,
        })
    }
}
