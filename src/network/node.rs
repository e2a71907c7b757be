//! A single node endpoint and its lazily established channel

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::ids::AccountId;
use crate::transport::TransportError;

/// Open connection state for one node. Cached on first use, reused for
/// every later attempt against the same node, and dropped on close.
pub struct Channel {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
}

impl Channel {
    fn open(address: &str) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Internal(format!("channel construction failed: {e}")))?;
        Ok(Self {
            http,
            base_url: format!("http://{address}"),
        })
    }
}

/// One server endpoint in the topology, addressable by account identifier.
///
/// Identity and address are immutable after construction; only the channel
/// cell changes, and only under the lock.
pub struct Node {
    account_id: AccountId,
    address: String,
    channel: RwLock<Option<Arc<Channel>>>,
}

impl Node {
    pub fn new(account_id: AccountId, address: impl Into<String>) -> Self {
        Self {
            account_id,
            address: address.into(),
            channel: RwLock::new(None),
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The cached channel, opening it on first use.
    pub(crate) fn channel(&self) -> Result<Arc<Channel>, TransportError> {
        if let Some(channel) = self.channel.read().as_ref() {
            return Ok(Arc::clone(channel));
        }
        let mut slot = self.channel.write();
        // Another caller may have won the race while we waited for the lock.
        if let Some(channel) = slot.as_ref() {
            return Ok(Arc::clone(channel));
        }
        debug!(node = %self.account_id, address = %self.address, "opening channel");
        let channel = Arc::new(Channel::open(&self.address)?);
        *slot = Some(Arc::clone(&channel));
        Ok(channel)
    }

    /// Drop the cached channel. In-flight calls holding the Arc finish
    /// undisturbed.
    pub(crate) fn close_channel(&self) {
        if self.channel.write().take().is_some() {
            debug!(node = %self.account_id, "channel closed");
        }
    }

    #[cfg(test)]
    pub(crate) fn has_open_channel(&self) -> bool {
        self.channel.read().is_some()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("account_id", &self.account_id)
            .field("address", &self.address)
            .field("channel_open", &self.channel.read().is_some())
            .finish()
    }
}
