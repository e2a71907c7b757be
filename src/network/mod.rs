//! Network topology: the ordered node set and rotation policy

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::NetworkProfile;
use crate::error::{Error, Result};
use crate::ids::{AccountId, LedgerId};

mod node;

pub use node::Node;

/// Ordered node set plus the shared rotation cursor.
///
/// Rotation is the only mutation in the steady state; explicit
/// reconfiguration replaces the list wholesale. The cursor is advanced
/// atomically so concurrent callers sharing one client never corrupt the
/// list, though strict fairness under contention is not guaranteed.
pub struct Network {
    nodes: RwLock<Vec<Arc<Node>>>,
    cursor: AtomicUsize,
    mirror_address: String,
    ledger_id: LedgerId,
}

impl Network {
    pub fn new(
        entries: Vec<(AccountId, String)>,
        mirror_address: impl Into<String>,
        ledger_id: LedgerId,
    ) -> Result<Self> {
        let nodes = Self::build_nodes(entries)?;
        Ok(Self {
            nodes: RwLock::new(nodes),
            cursor: AtomicUsize::new(0),
            mirror_address: mirror_address.into(),
            ledger_id,
        })
    }

    pub fn from_profile(profile: &NetworkProfile) -> Result<Self> {
        let mut entries = Vec::with_capacity(profile.nodes.len());
        for entry in &profile.nodes {
            entries.push((entry.account_id.parse::<AccountId>()?, entry.address.clone()));
        }
        let ledger_id = if profile.ledger_id.is_empty() {
            LedgerId::new(Vec::new())
        } else {
            LedgerId::from_hex(&profile.ledger_id)?
        };
        Self::new(entries, profile.mirror.clone(), ledger_id)
    }

    fn build_nodes(entries: Vec<(AccountId, String)>) -> Result<Vec<Arc<Node>>> {
        if entries.is_empty() {
            return Err(Error::config("network requires at least one node"));
        }
        Ok(entries
            .into_iter()
            .map(|(id, address)| Arc::new(Node::new(id, address)))
            .collect())
    }

    /// Next node under round-robin rotation. Advances the shared cursor;
    /// wraps without bound.
    pub fn select_node(&self) -> Result<Arc<Node>> {
        let nodes = self.nodes.read();
        if nodes.is_empty() {
            return Err(Error::config("network has no nodes to select"));
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % nodes.len();
        Ok(Arc::clone(&nodes[index]))
    }

    /// Like `select_node`, but restricted to `bound`: the nodes a frozen
    /// request actually carries bodies for.
    pub fn select_node_among(&self, bound: &[AccountId]) -> Result<Arc<Node>> {
        let nodes = self.nodes.read();
        if nodes.is_empty() {
            return Err(Error::config("network has no nodes to select"));
        }
        for _ in 0..nodes.len() {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % nodes.len();
            if bound.contains(&nodes[index].account_id()) {
                return Ok(Arc::clone(&nodes[index]));
            }
        }
        Err(Error::config(
            "none of the request's bound nodes are present in the topology",
        ))
    }

    /// Look a node up by identifier without touching the cursor.
    pub fn node(&self, account_id: &AccountId) -> Option<Arc<Node>> {
        self.nodes
            .read()
            .iter()
            .find(|n| n.account_id() == *account_id)
            .cloned()
    }

    /// Node identifiers in topology order.
    pub fn all_node_ids(&self) -> Vec<AccountId> {
        self.nodes.read().iter().map(|n| n.account_id()).collect()
    }

    pub fn mirror_address(&self) -> &str {
        &self.mirror_address
    }

    pub fn ledger_id(&self) -> &LedgerId {
        &self.ledger_id
    }

    /// Replace the node list. Existing channels are released; the cursor
    /// restarts from the head of the new list.
    pub fn set_nodes(&self, entries: Vec<(AccountId, String)>) -> Result<()> {
        let new_nodes = Self::build_nodes(entries)?;
        let mut nodes = self.nodes.write();
        for node in nodes.iter() {
            node.close_channel();
        }
        *nodes = new_nodes;
        self.cursor.store(0, Ordering::Relaxed);
        debug!(count = nodes.len(), "topology reconfigured");
        Ok(())
    }

    /// Release every cached channel.
    pub(crate) fn close(&self) {
        for node in self.nodes.read().iter() {
            node.close_channel();
        }
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("nodes", &self.all_node_ids())
            .field("mirror_address", &self.mirror_address)
            .field("ledger_id", &self.ledger_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_nodes() -> Network {
        Network::new(
            vec![
                (AccountId::from_num(3), "127.0.0.1:50211".to_string()),
                (AccountId::from_num(4), "127.0.0.1:50212".to_string()),
                (AccountId::from_num(5), "127.0.0.1:50213".to_string()),
            ],
            "127.0.0.1:5600",
            LedgerId::new(vec![0x01]),
        )
        .unwrap()
    }

    #[test]
    fn empty_node_list_is_a_configuration_error() {
        let err = Network::new(Vec::new(), "m", LedgerId::new(vec![])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rotation_wraps_round_robin() {
        let network = three_nodes();
        let picked: Vec<u64> = (0..7)
            .map(|_| network.select_node().unwrap().account_id().num)
            .collect();
        assert_eq!(picked, vec![3, 4, 5, 3, 4, 5, 3]);
    }

    #[test]
    fn profile_fields_are_exposed() {
        let network = three_nodes();
        assert_eq!(network.mirror_address(), "127.0.0.1:5600");
        assert_eq!(network.ledger_id().as_bytes(), &[0x01]);
        assert_eq!(
            network.all_node_ids(),
            vec![
                AccountId::from_num(3),
                AccountId::from_num(4),
                AccountId::from_num(5)
            ]
        );
    }

    #[test]
    fn select_among_skips_unbound_nodes() {
        let network = three_nodes();
        let bound = [AccountId::from_num(5)];
        for _ in 0..4 {
            assert_eq!(
                network.select_node_among(&bound).unwrap().account_id().num,
                5
            );
        }

        let missing = [AccountId::from_num(77)];
        assert!(network.select_node_among(&missing).is_err());
    }

    #[test]
    fn rotation_is_safe_under_concurrent_callers() {
        let network = Arc::new(three_nodes());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let network = Arc::clone(&network);
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    let node = network.select_node().unwrap();
                    assert!((3..=5).contains(&node.account_id().num));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn reconfiguration_resets_cursor_and_closes_channels() {
        let network = three_nodes();
        let node = network.select_node().unwrap();
        node.channel().unwrap();

        network
            .set_nodes(vec![(AccountId::from_num(9), "127.0.0.1:50220".to_string())])
            .unwrap();
        assert!(!node.has_open_channel());
        assert_eq!(network.all_node_ids(), vec![AccountId::from_num(9)]);
        assert_eq!(network.select_node().unwrap().account_id().num, 9);
    }
}
