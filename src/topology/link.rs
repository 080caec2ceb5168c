//! Link materialization and peer observations.
//!
//! Every link draws two consecutive values from the link counter, one MAC
//! per endpoint, and reports what each endpoint sees of the other. Those
//! observations are what the BGP neighbor lists are later built from.

use log::debug;
use std::collections::BTreeMap;
use std::net::Ipv6Addr;

use super::BuildError;
use crate::addressing::{format_scoped, generate_mac, mac_to_lla};
use crate::tinet::Interface;

/// One side of a link about to be created
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub node: &'a str,
    pub iface: &'a str,
    pub asn: u32,
}

impl<'a> Endpoint<'a> {
    pub fn new(node: &'a str, iface: &'a str, asn: u32) -> Self {
        Self { node, iface, asn }
    }
}

/// What a node sees of its BGP peer on one of its interfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerObservation {
    /// Observing node
    pub node: String,
    /// Observing node's interface
    pub iface: String,
    /// Peer's link-local address scoped to `iface`
    pub peer_lla: String,
    pub peer_asn: u32,
    /// Observing node's own link-local address on `iface`
    pub local_lla: Ipv6Addr,
}

/// Observations from both sides of one link
#[derive(Debug, Clone)]
pub struct LinkObservations {
    /// Seen by the first endpoint
    pub near: PeerObservation,
    /// Seen by the second endpoint
    pub far: PeerObservation,
}

/// Peer observations by node, then interface
#[derive(Debug, Default, Clone)]
pub struct PeerTable {
    entries: BTreeMap<String, BTreeMap<String, PeerObservation>>,
    len: usize,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, observation: PeerObservation) {
        let by_iface = self.entries.entry(observation.node.clone()).or_default();
        if by_iface.insert(observation.iface.clone(), observation).is_none() {
            self.len += 1;
        }
    }

    pub fn get(&self, node: &str, iface: &str) -> Option<&PeerObservation> {
        self.entries.get(node)?.get(iface)
    }

    /// Observation that an earlier link must have written
    pub fn require(&self, node: &str, iface: &str) -> Result<&PeerObservation, BuildError> {
        self.get(node, iface).ok_or_else(|| BuildError::MissingPeer {
            node: node.to_string(),
            iface: iface.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Link counter plus the per-node interfaces and link bring-up commands
/// accumulated during one build
#[derive(Debug, Default)]
pub struct LinkState {
    next_seq: u32,
    links: usize,
    interfaces: BTreeMap<String, Vec<Interface>>,
    commands: BTreeMap<String, Vec<String>>,
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of links created so far
    pub fn link_count(&self) -> usize {
        self.links
    }

    /// Create a link between `a` and `b`.
    ///
    /// Only `a` records the interface; the emulator creates the reverse
    /// side. Calling this twice for the same endpoints creates two links.
    pub fn connect(&mut self, a: Endpoint<'_>, b: Endpoint<'_>) -> Result<LinkObservations, BuildError> {
        let seq_a = self.next_seq;
        let seq_b = seq_a.checked_add(1).ok_or(BuildError::LinkSpaceExhausted)?;
        self.next_seq = seq_b.checked_add(1).ok_or(BuildError::LinkSpaceExhausted)?;
        self.links += 1;

        let (mac_a, mac_b) = (generate_mac(seq_a), generate_mac(seq_b));
        let (lla_a, lla_b) = (mac_to_lla(mac_a), mac_to_lla(mac_b));

        debug!(
            "Link {}#{} ({}) <-> {}#{} ({})",
            a.node, a.iface, mac_a, b.node, b.iface, mac_b
        );

        for (end, mac, lla) in [(a, mac_a, lla_a), (b, mac_b, lla_b)] {
            let cmds = self.commands.entry(end.node.to_string()).or_default();
            cmds.push(format!("ip link set dev {} address {}", end.iface, mac));
            cmds.push(format!("ip -6 addr add {}/64 dev {}", lla, end.iface));
        }

        self.interfaces
            .entry(a.node.to_string())
            .or_default()
            .push(Interface::direct(a.iface, b.node, b.iface));

        Ok(LinkObservations {
            near: PeerObservation {
                node: a.node.to_string(),
                iface: a.iface.to_string(),
                peer_lla: format_scoped(lla_b, a.iface),
                peer_asn: b.asn,
                local_lla: lla_a,
            },
            far: PeerObservation {
                node: b.node.to_string(),
                iface: b.iface.to_string(),
                peer_lla: format_scoped(lla_a, b.iface),
                peer_asn: a.asn,
                local_lla: lla_b,
            },
        })
    }

    /// Attach `iface` on `node` to a bridge
    pub fn add_bridge_interface(&mut self, node: &str, iface: &str, bridge: &str) {
        self.interfaces
            .entry(node.to_string())
            .or_default()
            .push(Interface::bridge(iface, bridge));
    }

    /// Link bring-up commands recorded for `node`, in link-creation order
    pub fn commands(&self, node: &str) -> &[String] {
        self.commands.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Interfaces recorded on `node`
    pub fn take_interfaces(&mut self, node: &str) -> Vec<Interface> {
        self.interfaces.remove(node).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tinet::InterfaceKind;

    #[test]
    fn test_connect_observations() {
        let mut state = LinkState::new();
        let link = state
            .connect(Endpoint::new("spine0", "lf0", 1), Endpoint::new("leaf1", "sp0", 2))
            .unwrap();

        assert_eq!(link.near.node, "spine0");
        assert_eq!(link.near.iface, "lf0");
        assert_eq!(link.near.peer_asn, 2);
        assert_eq!(link.near.peer_lla, "fe80::ff:fe00:100%lf0");
        assert_eq!(link.near.local_lla.to_string(), "fe80::ff:fe00:0");

        assert_eq!(link.far.node, "leaf1");
        assert_eq!(link.far.peer_asn, 1);
        assert_eq!(link.far.peer_lla, "fe80::ff:fe00:0%sp0");
        assert_eq!(link.far.local_lla.to_string(), "fe80::ff:fe00:100");
    }

    #[test]
    fn test_connect_records_one_interface() {
        let mut state = LinkState::new();
        state
            .connect(Endpoint::new("a", "x0", 1), Endpoint::new("b", "y0", 2))
            .unwrap();

        let a = state.take_interfaces("a");
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].kind, InterfaceKind::Direct);
        assert_eq!(a[0].args, "b#y0");
        assert!(state.take_interfaces("b").is_empty());
    }

    #[test]
    fn test_commands_follow_call_order() {
        let mut state = LinkState::new();
        state
            .connect(Endpoint::new("a", "x0", 1), Endpoint::new("b", "y0", 2))
            .unwrap();
        state
            .connect(Endpoint::new("c", "z0", 3), Endpoint::new("b", "y1", 2))
            .unwrap();

        assert_eq!(
            state.commands("b"),
            &[
                "ip link set dev y0 address 02:00:00:00:01:00".to_string(),
                "ip -6 addr add fe80::ff:fe00:100/64 dev y0".to_string(),
                "ip link set dev y1 address 02:00:00:00:03:00".to_string(),
                "ip -6 addr add fe80::ff:fe00:300/64 dev y1".to_string(),
            ]
        );
        assert!(state.commands("nobody").is_empty());
        assert_eq!(state.link_count(), 2);
    }

    #[test]
    fn test_repeated_connect_is_a_new_link() {
        let mut state = LinkState::new();
        let first = state
            .connect(Endpoint::new("a", "x0", 1), Endpoint::new("b", "y0", 2))
            .unwrap();
        let second = state
            .connect(Endpoint::new("a", "x0", 1), Endpoint::new("b", "y0", 2))
            .unwrap();
        assert_ne!(first.near.local_lla, second.near.local_lla);
        assert_eq!(state.take_interfaces("a").len(), 2);
    }

    #[test]
    fn test_peer_table_require() {
        let mut state = LinkState::new();
        let link = state
            .connect(Endpoint::new("a", "x0", 1), Endpoint::new("b", "y0", 2))
            .unwrap();

        let mut table = PeerTable::new();
        assert!(table.is_empty());
        table.insert(link.far.clone());
        table.insert(link.far);
        assert_eq!(table.len(), 1);
        assert!(table.get("b", "y1").is_none());
        assert!(table.get("c", "y0").is_none());
        assert_eq!(table.require("b", "y0").unwrap().peer_asn, 1);
        assert!(matches!(
            table.require("a", "x0"),
            Err(BuildError::MissingPeer { .. })
        ));
    }
}
