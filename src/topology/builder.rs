//! Tier-by-tier fabric construction.
//!
//! Tiers are built top-down: spines, leaf pairs, border leafs, ToRs,
//! servers, external routers. Each tier creates the links to the tier
//! below and returns the peer observations for the far ends of those
//! links; the next tier reads its upstream sessions from that table.

use log::{debug, info};
use std::net::Ipv4Addr;

use super::assembler;
use super::link::{Endpoint, LinkState, PeerTable};
use super::naming;
use super::neighbor::{Edge, NeighborDescriptor};
use super::{BuildError, Fabric, FabricNode};
use crate::addressing::{asn, router_id};
use crate::config::FabricConfig;
use crate::template::{Role, TemplateData, TemplateRenderer, Templates};
use crate::tinet::{self, EXTERNAL_BRIDGE, EXTERNAL_GATEWAY, EXTERNAL_INTERFACE, EXTERNAL_PREFIX_LEN};

/// Builds one fabric. Consumed by [`FabricBuilder::build`], so every build
/// starts from a fresh link counter.
pub struct FabricBuilder<'a> {
    config: &'a FabricConfig,
    renderer: TemplateRenderer<'a>,
    links: LinkState,
    nodes: Vec<FabricNode>,
}

/// Identity of a node whose sessions are complete
struct NodeIdentity {
    name: String,
    role: Role,
    asn: u32,
    router_id: Ipv4Addr,
}

impl<'a> FabricBuilder<'a> {
    pub fn new(config: &'a FabricConfig, templates: &'a Templates) -> Self {
        Self {
            config,
            renderer: TemplateRenderer::new(templates),
            links: LinkState::new(),
            nodes: Vec::new(),
        }
    }

    /// Build every tier and assemble the topology document
    pub fn build(mut self) -> Result<Fabric, BuildError> {
        self.config.validate()?;
        self.nodes.reserve(self.config.total_nodes());
        info!(
            "Building fabric: {} spines, {} leaf pairs, {} ToRs, {} servers, {} border leafs, {} routers",
            self.config.spines,
            self.config.leaf_pairs,
            self.config.total_tors(),
            self.config.total_servers(),
            self.config.border_leafs,
            self.config.routers
        );

        let spine_peers = self.build_spines()?;
        let leaf_peers = self.build_leafs(&spine_peers)?;
        let border_leaf_peers = self.build_border_leafs(&spine_peers)?;
        let tor_peers = self.build_tors(&leaf_peers)?;
        self.build_servers(&tor_peers)?;
        self.build_routers(&border_leaf_peers)?;

        info!(
            "Fabric complete: {} nodes, {} links",
            self.nodes.len(),
            self.links.link_count()
        );

        let link_count = self.links.link_count();
        let document = assembler::assemble(self.config, &self.nodes, self.links);
        Ok(Fabric {
            nodes: self.nodes,
            document,
            link_count,
        })
    }

    fn build_spines(&mut self) -> Result<PeerTable, BuildError> {
        let mut downstream = PeerTable::new();

        for i in 0..self.config.spines {
            let name = naming::spine(i);
            let router_id = router_id::spine(i)?;
            let peer_if = format!("sp{}", i);
            let mut neighbors = Vec::new();

            for pair in 0..self.config.leaf_pairs {
                let leaf_asn = asn::leaf(pair);
                for leaf_num in 1..=2 {
                    let leaf = naming::leaf(leaf_num, leaf_asn);
                    let my_if = format!("lf{}", pair * 2 + leaf_num - 1);
                    let link = self.links.connect(
                        Endpoint::new(&name, &my_if, asn::SPINE),
                        Endpoint::new(&leaf, &peer_if, leaf_asn),
                    )?;
                    neighbors.push(NeighborDescriptor::new(
                        format!("leaf{}_as{}", leaf_num, leaf_asn),
                        Edge::SpineToLeaf,
                        &link.near,
                    ));
                    downstream.insert(link.far);
                }
            }

            for bl in 0..self.config.border_leafs {
                let border_leaf = naming::border_leaf(bl);
                let my_if = format!("bl{}", bl);
                let link = self.links.connect(
                    Endpoint::new(&name, &my_if, asn::SPINE),
                    Endpoint::new(&border_leaf, &peer_if, asn::BORDER_LEAF),
                )?;
                neighbors.push(NeighborDescriptor::new(border_leaf, Edge::SpineToBorderLeaf, &link.near));
                downstream.insert(link.far);
            }

            let node = NodeIdentity { name, role: Role::Spine, asn: asn::SPINE, router_id };
            self.finish_node(node, neighbors, Vec::new())?;
        }

        info!("Built {} spines ({} links)", self.config.spines, self.links.link_count());
        Ok(downstream)
    }

    fn build_leafs(&mut self, spine_peers: &PeerTable) -> Result<PeerTable, BuildError> {
        let mut downstream = PeerTable::new();
        let tors_per_pair = self.config.tors_per_pair;

        for pair in 0..self.config.leaf_pairs {
            let leaf_asn = asn::leaf(pair);

            for leaf_num in 1..=2 {
                let name = naming::leaf(leaf_num, leaf_asn);
                let router_id = router_id::leaf(pair, leaf_num)?;
                let peer_if = format!("lf{}", leaf_num - 1);
                let mut neighbors = Vec::new();

                for spine in 0..self.config.spines {
                    let observation = spine_peers.require(&name, &format!("sp{}", spine))?;
                    neighbors.push(NeighborDescriptor::new(naming::spine(spine), Edge::LeafToSpine, observation));
                }

                for t in 0..tors_per_pair {
                    let tor_index = pair * tors_per_pair + t;
                    let tor_asn = asn::tor(tor_index);
                    let tor = naming::tor(tor_index, tor_asn);
                    let my_if = format!("tr{}", t);
                    let link = self.links.connect(
                        Endpoint::new(&name, &my_if, leaf_asn),
                        Endpoint::new(&tor, &peer_if, tor_asn),
                    )?;
                    neighbors.push(NeighborDescriptor::new(
                        format!("tor{}", tor_index),
                        Edge::LeafToTor,
                        &link.near,
                    ));
                    downstream.insert(link.far);
                }

                let node = NodeIdentity { name, role: Role::Leaf, asn: leaf_asn, router_id };
                self.finish_node(node, neighbors, Vec::new())?;
            }
        }

        info!("Built {} leafs ({} links)", self.config.leaf_pairs * 2, self.links.link_count());
        Ok(downstream)
    }

    fn build_border_leafs(&mut self, spine_peers: &PeerTable) -> Result<PeerTable, BuildError> {
        let mut downstream = PeerTable::new();

        for bl in 0..self.config.border_leafs {
            let name = naming::border_leaf(bl);
            let router_id = router_id::border_leaf(bl)?;
            let peer_if = format!("bl{}", bl);
            let mut neighbors = Vec::new();

            for spine in 0..self.config.spines {
                let observation = spine_peers.require(&name, &format!("sp{}", spine))?;
                neighbors.push(NeighborDescriptor::new(naming::spine(spine), Edge::BorderLeafToSpine, observation));
            }

            for rt in 0..self.config.routers {
                let router = naming::router(rt);
                let my_if = format!("rt{}", rt);
                let link = self.links.connect(
                    Endpoint::new(&name, &my_if, asn::BORDER_LEAF),
                    Endpoint::new(&router, &peer_if, asn::ROUTER),
                )?;
                neighbors.push(NeighborDescriptor::new(router, Edge::BorderLeafToRouter, &link.near));
                downstream.insert(link.far);
            }

            let node = NodeIdentity { name, role: Role::BorderLeaf, asn: asn::BORDER_LEAF, router_id };
            self.finish_node(node, neighbors, Vec::new())?;
        }

        info!("Built {} border leafs ({} links)", self.config.border_leafs, self.links.link_count());
        Ok(downstream)
    }

    fn build_tors(&mut self, leaf_peers: &PeerTable) -> Result<PeerTable, BuildError> {
        let mut downstream = PeerTable::new();
        let servers_per_tor = self.config.servers_per_tor;

        for tor_index in 0..self.config.total_tors() {
            let tor_asn = asn::tor(tor_index);
            let name = naming::tor(tor_index, tor_asn);
            let router_id = router_id::tor(tor_index)?;
            let mut neighbors = Vec::new();

            for leaf_num in 1..=2 {
                let observation = leaf_peers.require(&name, &format!("lf{}", leaf_num - 1))?;
                neighbors.push(NeighborDescriptor::new(format!("leaf{}", leaf_num), Edge::TorToLeaf, observation));
            }

            for s in 0..servers_per_tor {
                let server_index = tor_index * servers_per_tor + s;
                let server_asn = asn::server(server_index);
                let server = naming::server(server_index, server_asn);
                let my_if = format!("sv{}", s);
                let link = self.links.connect(
                    Endpoint::new(&name, &my_if, tor_asn),
                    Endpoint::new(&server, "tr0", server_asn),
                )?;
                neighbors.push(NeighborDescriptor::new(
                    format!("server{}", server_index),
                    Edge::TorToServer,
                    &link.near,
                ));
                downstream.insert(link.far);
            }

            let node = NodeIdentity { name, role: Role::Tor, asn: tor_asn, router_id };
            self.finish_node(node, neighbors, Vec::new())?;
        }

        info!("Built {} ToRs ({} links)", self.config.total_tors(), self.links.link_count());
        Ok(downstream)
    }

    fn build_servers(&mut self, tor_peers: &PeerTable) -> Result<(), BuildError> {
        let servers_per_tor = self.config.servers_per_tor;

        for server_index in 0..self.config.total_servers() {
            let tor_index = server_index / servers_per_tor;
            let server_asn = asn::server(server_index);
            let name = naming::server(server_index, server_asn);
            let router_id = router_id::server(server_index)?;

            let observation = tor_peers.require(&name, "tr0")?;
            let neighbors = vec![NeighborDescriptor::new(
                format!("tor{}", tor_index),
                Edge::ServerToTor,
                observation,
            )];

            let node = NodeIdentity { name, role: Role::Server, asn: server_asn, router_id };
            self.finish_node(node, neighbors, Vec::new())?;
        }

        info!("Built {} servers", self.config.total_servers());
        Ok(())
    }

    fn build_routers(&mut self, border_leaf_peers: &PeerTable) -> Result<(), BuildError> {
        for rt in 0..self.config.routers {
            let name = naming::router(rt);
            let router_id = router_id::router(rt)?;
            let mut neighbors = Vec::new();

            for bl in 0..self.config.border_leafs {
                let observation = border_leaf_peers.require(&name, &format!("bl{}", bl))?;
                neighbors.push(NeighborDescriptor::new(
                    naming::border_leaf(bl),
                    Edge::RouterToBorderLeaf,
                    observation,
                ));
            }

            let mut external = Vec::new();
            if self.config.external_network {
                let address = tinet::external_router_ip(rt).ok_or(BuildError::ExternalAddress { index: rt })?;
                self.links.add_bridge_interface(&name, EXTERNAL_INTERFACE, EXTERNAL_BRIDGE);
                external.push(format!(
                    "ip addr add {}/{} dev {}",
                    address, EXTERNAL_PREFIX_LEN, EXTERNAL_INTERFACE
                ));
                external.push(format!("ip route add default via {}", EXTERNAL_GATEWAY));
                external.push(format!(
                    "iptables -t nat -A POSTROUTING -o {} -j MASQUERADE",
                    EXTERNAL_INTERFACE
                ));
            }

            let node = NodeIdentity { name, role: Role::Router, asn: asn::ROUTER, router_id };
            self.finish_node(node, neighbors, external)?;
        }

        info!("Built {} routers", self.config.routers);
        Ok(())
    }

    /// Render the node's daemon config and record its bring-up commands.
    ///
    /// `extra` runs after the daemon has been started.
    fn finish_node(
        &mut self,
        node: NodeIdentity,
        neighbors: Vec<NeighborDescriptor>,
        extra: Vec<String>,
    ) -> Result<(), BuildError> {
        let NodeIdentity { name, role, asn, router_id } = node;

        let data = TemplateData {
            router_id: router_id.to_string(),
            asn,
            neighbors: &neighbors,
        };
        let bird_config = self
            .renderer
            .render(role, &data)
            .map_err(|source| BuildError::Render {
                node: name.clone(),
                source,
            })?;

        let mut commands = vec![format!("ip addr add {}/32 dev lo", router_id)];
        if role == Role::Server {
            commands.push(format!("ip addr add {}/32 dev lo", router_id::ANYCAST));
        }
        commands.extend(self.links.commands(&name).iter().cloned());
        commands.extend([
            "sysctl -w net.ipv4.ip_forward=1".to_string(),
            "sysctl -w net.ipv6.conf.all.forwarding=1".to_string(),
            format!("cp /tinet/{}.conf /etc/bird/bird.conf", name),
            "mkdir -p /run/bird".to_string(),
            "bird -c /etc/bird/bird.conf".to_string(),
        ]);
        commands.extend(extra);

        debug!("Node {} ({}, AS{}, {}): {} neighbors", name, role, asn, router_id, neighbors.len());

        self.nodes.push(FabricNode {
            name,
            role,
            asn,
            router_id,
            neighbors,
            bird_config,
            commands,
        });
        Ok(())
    }
}
