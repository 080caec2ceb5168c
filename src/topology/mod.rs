//! Clos fabric construction.
//!
//! [`FabricBuilder`] owns all state of one build: the link counter, the
//! per-node interfaces and link commands, and the peer observations handed
//! from tier to tier. The result is a [`Fabric`]: per-node identities,
//! rendered daemon configs and the tinet topology document.

pub mod assembler;
pub mod builder;
pub mod link;
pub mod naming;
pub mod neighbor;

use std::net::Ipv4Addr;

pub use builder::FabricBuilder;
pub use link::{Endpoint, LinkObservations, LinkState, PeerObservation, PeerTable};
pub use neighbor::{Edge, NeighborDescriptor, Policy};

use crate::addressing::AddressError;
use crate::config::{FabricConfig, ValidationError};
use crate::template::{Role, TemplateError, Templates};
use crate::tinet::TopologyDocument;

/// Fabric build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid fabric configuration")]
    Config(#[from] ValidationError),
    #[error("address allocation failed")]
    Address(#[from] AddressError),
    #[error("failed to render config for node {node}")]
    Render {
        node: String,
        #[source]
        source: TemplateError,
    },
    #[error("no peer observation for {node}#{iface}")]
    MissingPeer { node: String, iface: String },
    #[error("link counter exhausted")]
    LinkSpaceExhausted,
    #[error("router {index} has no address on the external bridge")]
    ExternalAddress { index: usize },
}

/// A fully built node
#[derive(Debug, Clone)]
pub struct FabricNode {
    pub name: String,
    pub role: Role,
    pub asn: u32,
    pub router_id: Ipv4Addr,
    /// BGP sessions in template order
    pub neighbors: Vec<NeighborDescriptor>,
    /// Rendered BIRD config
    pub bird_config: String,
    /// Bring-up commands
    pub commands: Vec<String>,
}

/// Result of one build
#[derive(Debug, Clone)]
pub struct Fabric {
    /// Nodes in build order
    pub nodes: Vec<FabricNode>,
    pub document: TopologyDocument,
    pub link_count: usize,
}

impl Fabric {
    pub fn node(&self, name: &str) -> Option<&FabricNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Rendered configs as (node name, config), in build order
    pub fn bird_configs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .iter()
            .map(|node| (node.name.as_str(), node.bird_config.as_str()))
    }

    /// Nodes of one role, in build order
    pub fn nodes_with_role(&self, role: Role) -> impl Iterator<Item = &FabricNode> {
        self.nodes.iter().filter(move |node| node.role == role)
    }
}

/// Build a fabric with a fresh builder
pub fn build_fabric(config: &FabricConfig, templates: &Templates) -> Result<Fabric, BuildError> {
    FabricBuilder::new(config, templates).build()
}
