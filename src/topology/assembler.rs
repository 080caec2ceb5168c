//! Fold per-node state into the topology document.

use super::link::LinkState;
use super::FabricNode;
use crate::config::FabricConfig;
use crate::tinet::{Command, Node, NodeConfig, Switch, TopologyDocument, CONTAINER_IMAGE, EXTERNAL_BRIDGE};

/// Build the document in node build order. The external bridge is declared
/// without interfaces; routers attach to it from their side.
pub fn assemble(config: &FabricConfig, nodes: &[FabricNode], mut links: LinkState) -> TopologyDocument {
    let mut document = TopologyDocument::default();

    for node in nodes {
        document.nodes.push(Node {
            name: node.name.clone(),
            image: CONTAINER_IMAGE.to_string(),
            interfaces: links.take_interfaces(&node.name),
        });
        document.node_configs.push(NodeConfig {
            name: node.name.clone(),
            cmds: node.commands.iter().cloned().map(Command::from).collect(),
        });
    }

    if config.external_network {
        document.switches.push(Switch {
            name: EXTERNAL_BRIDGE.to_string(),
            interfaces: Vec::new(),
        });
    }

    document
}
