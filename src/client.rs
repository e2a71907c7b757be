//! Client: operator identity, network topology, and retry configuration

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::ClientConfig;
use crate::crypto::PrivateKey;
use crate::error::{Error, Result};
use crate::execution::RetryPolicy;
use crate::ids::{AccountId, LedgerId, TransactionId};
use crate::network::Network;
use crate::transport::{HttpTransport, Transport};

/// The account paying for requests, with the key that signs them.
#[derive(Debug, Clone)]
pub struct Operator {
    pub account_id: AccountId,
    pub key: PrivateKey,
}

/// Entry point for running requests against a network.
///
/// Created once per process or session and shared across tasks; requests
/// themselves stay single-owner. `close` releases every node channel.
#[derive(Debug)]
pub struct Client {
    network: Arc<Network>,
    transport: Arc<dyn Transport>,
    operator: RwLock<Option<Operator>>,
    retry_policy: RwLock<RetryPolicy>,
    request_timeout: RwLock<Option<Duration>>,
    default_max_fee: RwLock<u64>,
}

/// Default fee ceiling applied when neither the request nor the client
/// sets one, in tinybars.
const DEFAULT_MAX_FEE: u64 = 100_000_000;

impl Client {
    /// Build a client for an explicit node list.
    pub fn for_network(
        entries: Vec<(AccountId, String)>,
        mirror_address: impl Into<String>,
        ledger_id: LedgerId,
    ) -> Result<Self> {
        let network = Network::new(entries, mirror_address, ledger_id)?;
        Ok(Self::with_parts(network, Arc::new(HttpTransport)))
    }

    /// Build a client from loaded configuration: selected network profile,
    /// operator credentials, and retry tuning.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let profile = config.selected_profile()?;
        let client = Self::with_parts(Network::from_profile(profile)?, Arc::new(HttpTransport));

        if let Some(operator) = &config.operator {
            let account_id = operator.account_id.parse::<AccountId>()?;
            let key = operator.key.parse::<PrivateKey>()?;
            client.set_operator(account_id, key);
        }

        client.set_retry_policy(RetryPolicy {
            max_attempts: config.retry.max_attempts,
            min_backoff: Duration::from_millis(config.retry.min_backoff_ms),
            max_backoff: Duration::from_millis(config.retry.max_backoff_ms),
        });
        client.set_request_timeout(match config.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        });
        Ok(client)
    }

    pub(crate) fn with_parts(network: Network, transport: Arc<dyn Transport>) -> Self {
        Self {
            network: Arc::new(network),
            transport,
            operator: RwLock::new(None),
            retry_policy: RwLock::new(RetryPolicy::default()),
            request_timeout: RwLock::new(None),
            default_max_fee: RwLock::new(DEFAULT_MAX_FEE),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Set the paying account and signing key.
    pub fn set_operator(&self, account_id: AccountId, key: PrivateKey) -> &Self {
        *self.operator.write() = Some(Operator { account_id, key });
        self
    }

    pub fn operator(&self) -> Option<Operator> {
        self.operator.read().clone()
    }

    /// Fresh request identifier for the operator account.
    pub fn generate_transaction_id(&self) -> Result<TransactionId> {
        let operator = self.operator().ok_or(Error::NoOperator)?;
        Ok(TransactionId::generate(operator.account_id))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy.read().clone()
    }

    pub fn set_retry_policy(&self, policy: RetryPolicy) -> &Self {
        *self.retry_policy.write() = policy;
        self
    }

    pub fn set_max_attempts(&self, max_attempts: u32) -> &Self {
        self.retry_policy.write().max_attempts = max_attempts;
        self
    }

    pub fn set_min_backoff(&self, min_backoff: Duration) -> &Self {
        self.retry_policy.write().min_backoff = min_backoff;
        self
    }

    pub fn set_max_backoff(&self, max_backoff: Duration) -> &Self {
        self.retry_policy.write().max_backoff = max_backoff;
        self
    }

    /// Per-attempt deadline handed to the transport. `None` lets attempts
    /// run unbounded.
    pub fn request_timeout(&self) -> Option<Duration> {
        *self.request_timeout.read()
    }

    pub fn set_request_timeout(&self, timeout: Option<Duration>) -> &Self {
        *self.request_timeout.write() = timeout;
        self
    }

    pub fn default_max_fee(&self) -> u64 {
        *self.default_max_fee.read()
    }

    pub fn set_default_max_fee(&self, max_fee: u64) -> &Self {
        *self.default_max_fee.write() = max_fee;
        self
    }

    /// Release every cached node channel. The client remains usable;
    /// channels reopen lazily on the next request.
    pub fn close(&self) {
        debug!("closing client channels");
        self.network.close();
    }
}
