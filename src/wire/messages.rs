//! Request and response envelope structures
//!
//! Every envelope carries a discriminated union: exactly one operation (or
//! result) variant is populated per message. Presence of a field does not
//! imply a non-default value; decoders branch on values, never on presence.

use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, TransactionId};
use crate::status::Status;

/// The node-bound body a transaction freezes into. These are the exact
/// bytes that get signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
    pub node_account_id: AccountId,
    pub max_fee: u64,
    pub valid_duration_secs: u64,
    pub memo: String,
    pub operation: TransactionOperation,
}

/// Select-one-of union of transaction operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionOperation {
    Transfer(TransferBody),
    AccountCreate(AccountCreateBody),
    TopicMessageSubmit(TopicMessageSubmitBody),
}

impl TransactionOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer(_) => "transfer",
            Self::AccountCreate(_) => "account_create",
            Self::TopicMessageSubmit(_) => "topic_message_submit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    pub account_id: AccountId,
    /// Signed movement in tinybars; a balanced transfer list sums to zero.
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferBody {
    pub transfers: Vec<AccountAmount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreateBody {
    /// Raw public key bytes controlling the new account.
    pub key: Vec<u8>,
    pub initial_balance: u64,
    pub memo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessageSubmitBody {
    pub topic_num: u64,
    pub message: Vec<u8>,
}

/// One signature entry: the signing public key plus its detached signature
/// over the body bytes. Entry order is insertion order and survives
/// serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Frozen body bytes plus accumulated signatures. The body is opaque here;
/// it round-trips byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub body: Vec<u8>,
    pub signatures: Vec<SignaturePair>,
}

/// Serialized form of a frozen transaction: one signed payload per
/// candidate node, in freeze order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub payloads: Vec<SignedPayload>,
}

/// Whether a query asks for the real answer or only its cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    Answer,
    CostAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHeader {
    /// Payment transfer for the read, bound to the node being asked.
    pub payment: Option<SignedPayload>,
    pub response_kind: ResponseKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub header: QueryHeader,
    pub operation: QueryOperation,
}

/// Select-one-of union of query operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryOperation {
    AccountBalance { account_id: AccountId },
    AccountInfo { account_id: AccountId },
    TransactionReceipt { transaction_id: TransactionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    pub status: Status,
    /// Required payment in tinybars; meaningful in cost answers.
    pub cost: u64,
}

/// Response mirror of the request envelope: a status header plus at most
/// one populated result variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub header: ResponseHeader,
    pub result: Option<QueryResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryResult {
    AccountBalance {
        account_id: AccountId,
        balance: u64,
    },
    AccountInfo(AccountInfoData),
    TransactionReceipt(TransactionReceipt),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfoData {
    pub account_id: AccountId,
    pub balance: u64,
    pub key: Vec<u8>,
    pub memo: String,
}

/// Terminal post-consensus outcome record. Immutable once returned; the
/// entity fields are populated by creation operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub status: Status,
    pub account_id: Option<AccountId>,
    pub topic_sequence_number: Option<u64>,
}
