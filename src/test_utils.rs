//! Test utilities: scripted transport and client fixtures
//!
//! Compiled for unit/scenario tests and behind the `test_utils` feature
//! for downstream integration testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::Client;
use crate::crypto::PrivateKey;
use crate::ids::{AccountId, LedgerId};
use crate::network::{Network, Node};
use crate::status::Status;
use crate::transport::{CallKind, Transport, TransportError};
use crate::wire::{
    self, AccountInfoData, QueryResult, ResponseEnvelope, ResponseHeader, TransactionReceipt,
};

/// Scripted outcome for one transport call, consumed in order.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Fail below the protocol.
    Transport(TransportError),
    /// Answer with an encoded response envelope.
    Respond(ResponseEnvelope),
    /// Answer with raw bytes, valid or not.
    Raw(Vec<u8>),
}

/// Record of one call the engine made.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub node_account_id: AccountId,
    pub kind: CallKind,
    pub payload: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockOutcome>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTransport {
    pub fn new(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, outcome: MockOutcome) {
        self.script.lock().push_back(outcome);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(
        &self,
        node: &Node,
        kind: CallKind,
        payload: &[u8],
        _deadline: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().push(MockCall {
            node_account_id: node.account_id(),
            kind,
            payload: payload.to_vec(),
        });
        let outcome = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(MockOutcome::Transport(TransportError::Internal(
                "mock script exhausted".into(),
            )));
        match outcome {
            MockOutcome::Transport(error) => Err(error),
            MockOutcome::Respond(envelope) => {
                wire::encode(&envelope).map_err(|e| TransportError::Internal(e.to_string()))
            }
            MockOutcome::Raw(bytes) => Ok(bytes),
        }
    }
}

/// Operator account used by every fixture client.
pub fn operator_account() -> AccountId {
    AccountId::from_num(2)
}

/// Client over `node_count` local nodes (`0.0.3` upward) with a scripted
/// transport and a generated operator key.
pub fn mock_client(node_count: usize, outcomes: Vec<MockOutcome>) -> (Client, Arc<MockTransport>) {
    let entries = (0..node_count)
        .map(|i| {
            (
                AccountId::from_num(3 + i as u64),
                format!("127.0.0.1:5021{i}"),
            )
        })
        .collect();
    let network = Network::new(entries, "127.0.0.1:5600", LedgerId::new(Vec::new()))
        .expect("fixture network");
    let transport = Arc::new(MockTransport::new(outcomes));
    let client = Client::with_parts(network, Arc::clone(&transport) as Arc<dyn Transport>);
    client.set_operator(operator_account(), PrivateKey::generate());
    (client, transport)
}

/// Response with only a status header, the shape of a precheck answer.
pub fn status_response(status: Status) -> MockOutcome {
    MockOutcome::Respond(ResponseEnvelope {
        header: ResponseHeader { status, cost: 0 },
        result: None,
    })
}

/// Successful submit response carrying an Ok receipt.
pub fn receipt_ok(account_id: Option<AccountId>) -> MockOutcome {
    receipt_response(
        Status::Ok,
        TransactionReceipt {
            status: Status::Ok,
            account_id,
            topic_sequence_number: None,
        },
    )
}

pub fn receipt_response(header_status: Status, receipt: TransactionReceipt) -> MockOutcome {
    MockOutcome::Respond(ResponseEnvelope {
        header: ResponseHeader {
            status: header_status,
            cost: 0,
        },
        result: Some(QueryResult::TransactionReceipt(receipt)),
    })
}

pub fn cost_response(cost: u64) -> MockOutcome {
    MockOutcome::Respond(ResponseEnvelope {
        header: ResponseHeader {
            status: Status::Ok,
            cost,
        },
        result: None,
    })
}

pub fn balance_response(account_id: AccountId, balance: u64) -> MockOutcome {
    MockOutcome::Respond(ResponseEnvelope {
        header: ResponseHeader {
            status: Status::Ok,
            cost: 0,
        },
        result: Some(QueryResult::AccountBalance {
            account_id,
            balance,
        }),
    })
}

pub fn info_response(account_id: AccountId, balance: u64) -> MockOutcome {
    MockOutcome::Respond(ResponseEnvelope {
        header: ResponseHeader {
            status: Status::Ok,
            cost: 0,
        },
        result: Some(QueryResult::AccountInfo(AccountInfoData {
            account_id,
            balance,
            key: Vec::new(),
            memo: String::new(),
        })),
    })
}

pub fn unreachable() -> MockOutcome {
    MockOutcome::Transport(TransportError::Unreachable("connection refused".into()))
}
