//! tinet document type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of the topology document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TopologyDocument {
    /// Nodes in build order
    pub nodes: Vec<Node>,
    /// Bridges, present only with external networking
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub switches: Vec<Switch>,
    /// Bring-up commands per node, in the same order as `nodes`
    pub node_configs: Vec<NodeConfig>,
}

/// A container in the lab
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub image: String,
    pub interfaces: Vec<Interface>,
}

/// How an interface is attached
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    /// veth pair to another node
    Direct,
    /// Port on a bridge
    Bridge,
}

/// An interface on a node
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    /// `peer#peer_iface` for direct links, the bridge name for bridge ports
    pub args: String,
}

impl Interface {
    /// Point-to-point interface towards `peer_node`/`peer_iface`
    pub fn direct(name: &str, peer_node: &str, peer_iface: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InterfaceKind::Direct,
            args: format!("{}#{}", peer_node, peer_iface),
        }
    }

    /// Interface attached to a bridge
    pub fn bridge(name: &str, bridge: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InterfaceKind::Bridge,
            args: bridge.to_string(),
        }
    }

    /// Peer node and interface of a direct interface
    pub fn peer(&self) -> Option<(&str, &str)> {
        match self.kind {
            InterfaceKind::Direct => self.args.split_once('#'),
            InterfaceKind::Bridge => None,
        }
    }
}

/// A bridge in the lab
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Switch {
    pub name: String,
    pub interfaces: Vec<Interface>,
}

/// Bring-up commands for one node
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub name: String,
    pub cmds: Vec<Command>,
}

/// A shell command run inside a node
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Command {
    pub cmd: String,
}

impl From<String> for Command {
    fn from(cmd: String) -> Self {
        Self { cmd }
    }
}

/// Endpoint of a point-to-point link: (node, interface)
pub type Endpoint = (String, String);

/// Errors found while rebuilding the bidirectional link map
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LinkMapError {
    #[error("interface {node}#{iface} has malformed target '{args}'")]
    MalformedTarget {
        node: String,
        iface: String,
        args: String,
    },
    #[error("{node}#{iface} is claimed by both {first} and {second}")]
    Conflict {
        node: String,
        iface: String,
        first: String,
        second: String,
    },
}

impl TopologyDocument {
    /// Node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Commands of a node by name
    pub fn commands(&self, name: &str) -> Option<&[Command]> {
        self.node_configs
            .iter()
            .find(|config| config.name == name)
            .map(|config| config.cmds.as_slice())
    }

    /// Count of direct interfaces as stored, one per physical link
    pub fn link_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|node| &node.interfaces)
            .filter(|iface| iface.kind == InterfaceKind::Direct)
            .count()
    }

    /// Both directions of every direct link, the way tinet wires them.
    ///
    /// Fails if an endpoint is claimed by two different links.
    pub fn direct_links(&self) -> Result<BTreeMap<Endpoint, Endpoint>, LinkMapError> {
        let mut links: BTreeMap<Endpoint, Endpoint> = BTreeMap::new();

        let mut claim = |from: Endpoint, to: Endpoint| -> Result<(), LinkMapError> {
            match links.get(&from) {
                Some(existing) if *existing != to => Err(LinkMapError::Conflict {
                    node: from.0.clone(),
                    iface: from.1.clone(),
                    first: format!("{}#{}", existing.0, existing.1),
                    second: format!("{}#{}", to.0, to.1),
                }),
                Some(_) => Ok(()),
                None => {
                    links.insert(from, to);
                    Ok(())
                }
            }
        };

        for node in &self.nodes {
            for iface in node.interfaces.iter().filter(|i| i.kind == InterfaceKind::Direct) {
                let (peer, peer_iface) = iface.peer().ok_or_else(|| LinkMapError::MalformedTarget {
                    node: node.name.clone(),
                    iface: iface.name.clone(),
                    args: iface.args.clone(),
                })?;
                let local = (node.name.clone(), iface.name.clone());
                let remote = (peer.to_string(), peer_iface.to_string());
                claim(local.clone(), remote.clone())?;
                claim(remote, local)?;
            }
        }

        Ok(links)
    }
}
