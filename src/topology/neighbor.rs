//! BGP neighbor descriptors and the fixed per-edge routing policy.

use serde::Serialize;

use super::link::PeerObservation;

/// Direction of a BGP session, seen from the node being configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    SpineToLeaf,
    SpineToBorderLeaf,
    LeafToSpine,
    LeafToTor,
    BorderLeafToSpine,
    BorderLeafToRouter,
    TorToLeaf,
    TorToServer,
    ServerToTor,
    RouterToBorderLeaf,
}

/// Import/export filters and prefix ceiling for one edge type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub import_filter: &'static str,
    pub export_filter: &'static str,
    pub max_prefix: u32,
}

impl Edge {
    pub fn policy(self) -> Policy {
        let (import_filter, export_filter, max_prefix) = match self {
            Edge::SpineToLeaf => ("spine_import", "spine_export", 500),
            Edge::SpineToBorderLeaf => ("spine_import", "spine_export", 100),
            Edge::LeafToSpine => ("leaf_import_from_spine", "leaf_export_to_spine", 1000),
            Edge::LeafToTor => ("leaf_import_from_tor", "leaf_export_to_tor", 100),
            Edge::BorderLeafToSpine => ("bl_import_from_spine", "bl_export_to_spine", 1000),
            Edge::BorderLeafToRouter => ("bl_import_from_router", "bl_export_to_router", 10),
            Edge::TorToLeaf => ("tor_import_from_leaf", "tor_export_to_leaf", 500),
            Edge::TorToServer => ("tor_import_from_server", "tor_export_to_server", 10),
            Edge::ServerToTor => ("server_import", "server_export", 100),
            Edge::RouterToBorderLeaf => ("router_import", "router_export", 1000),
        };
        Policy {
            import_filter,
            export_filter,
            max_prefix,
        }
    }
}

/// One BGP session as the templates see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborDescriptor {
    /// Protocol name in the daemon config
    pub name: String,
    /// Local interface the session runs over
    pub interface: String,
    pub peer_asn: u32,
    /// Peer link-local address with `%iface` scope
    pub peer_lla: String,
    /// Own link-local address, unscoped
    pub local_lla: String,
    pub import_filter: String,
    pub export_filter: String,
    pub max_prefix: u32,
}

impl NeighborDescriptor {
    pub fn new(name: impl Into<String>, edge: Edge, observation: &PeerObservation) -> Self {
        let policy = edge.policy();
        Self {
            name: name.into(),
            interface: observation.iface.clone(),
            peer_asn: observation.peer_asn,
            peer_lla: observation.peer_lla.clone(),
            local_lla: observation.local_lla.to_string(),
            import_filter: policy.import_filter.to_string(),
            export_filter: policy.export_filter.to_string(),
            max_prefix: policy.max_prefix,
        }
    }
}
