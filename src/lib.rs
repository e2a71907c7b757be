//! Client SDK for a federated ledger network
//!
//! Builds signed requests, submits them across a rotating node topology
//! with retry and failover, and retrieves their outcome.
//!
//! The pieces fit together like this: a [`Client`] owns the operator
//! identity, retry tuning, and the [`network::Network`] topology. Requests
//! are built mutably, frozen into node-bound signable payloads, signed,
//! and handed to the execution engine, which classifies every response
//! into retry/finished/error/expired and rotates nodes on transport
//! failure. Queries additionally negotiate their cost and attach a payment
//! transfer before the real read.
//!
//! ```no_run
//! use quill::{AccountId, Client, ClientConfig, TransferTransaction};
//!
//! # async fn example() -> quill::Result<()> {
//! let config = ClientConfig::load()?;
//! let client = Client::from_config(&config)?;
//!
//! let receipt = TransferTransaction::new()
//!     .add_transfer(AccountId::from_num(2), -100)?
//!     .add_transfer(AccountId::from_num(9), 100)?
//!     .execute(&client)
//!     .await?;
//!
//! assert_eq!(receipt.status, quill::Status::Ok);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod execution;
pub mod ids;
pub mod network;
pub mod query;
pub mod status;
pub mod transaction;
pub mod transport;
pub mod wire;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

pub use client::{Client, Operator};
pub use config::ClientConfig;
pub use crypto::{PrivateKey, PublicKey};
pub use error::{Error, Result};
pub use execution::{Executable, ExecutionState, RetryPolicy};
pub use ids::{AccountId, LedgerId, Timestamp, TransactionId};
pub use query::{
    AccountBalance, AccountBalanceQuery, AccountInfo, AccountInfoQuery, Query,
    TransactionReceiptQuery,
};
pub use status::Status;
pub use transaction::{
    AccountCreateTransaction, AnyTransaction, TopicMessageSubmitTransaction, Transaction,
    TransactionReceipt, TransferTransaction,
};
pub use transport::{CallKind, Transport, TransportError};
