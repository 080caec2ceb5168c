//! End-to-end tests over complete fabric builds and the files they produce.

use closnet::config::FabricConfig;
use closnet::config_loader::{self, CliOverrides};
use closnet::output::{self, DocumentFormat};
use closnet::template::{self, Role, Templates};
use closnet::tinet::{InterfaceKind, TopologyDocument};
use closnet::topology::{self, Fabric};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

fn shipped_templates() -> Templates {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates.yaml");
    template::load_templates(&path).expect("shipped templates.yaml should load")
}

fn build(config: &FabricConfig) -> Fabric {
    topology::build_fabric(config, &shipped_templates()).expect("fabric should build")
}

fn medium_config() -> FabricConfig {
    FabricConfig {
        spines: 4,
        leaf_pairs: 2,
        tors_per_pair: 3,
        servers_per_tor: 4,
        border_leafs: 2,
        routers: 2,
        ..Default::default()
    }
}

/// Every `ip link set dev IF address MAC` command in the document
fn mac_assignments(document: &TopologyDocument) -> Vec<(String, String, String)> {
    let mut assignments = Vec::new();
    for config in &document.node_configs {
        for command in &config.cmds {
            let words: Vec<&str> = command.cmd.split_whitespace().collect();
            if let ["ip", "link", "set", "dev", iface, "address", mac] = words.as_slice() {
                assignments.push((config.name.clone(), iface.to_string(), mac.to_string()));
            }
        }
    }
    assignments
}

#[test]
fn test_default_fabric_shape() {
    let config = FabricConfig::default();
    let fabric = build(&config);

    assert_eq!(fabric.nodes.len(), 12);
    assert_eq!(fabric.link_count, 15);
    assert_eq!(fabric.nodes_with_role(Role::Spine).count(), 2);
    assert_eq!(fabric.nodes_with_role(Role::Leaf).count(), 2);
    assert_eq!(fabric.nodes_with_role(Role::BorderLeaf).count(), 1);
    assert_eq!(fabric.nodes_with_role(Role::Tor).count(), 2);
    assert_eq!(fabric.nodes_with_role(Role::Server).count(), 4);
    assert_eq!(fabric.nodes_with_role(Role::Router).count(), 1);
}

#[test]
fn test_interfaces_are_symmetric() {
    let fabric = build(&medium_config());
    let links = fabric.document.direct_links().expect("no endpoint claimed twice");

    // Both directions of every link
    assert_eq!(links.len(), fabric.link_count * 2);
    for (local, remote) in &links {
        assert_eq!(links.get(remote), Some(local), "{:?} is not mirrored", local);
    }

    // Every endpoint named in a target exists as a node
    let names: HashSet<&str> = fabric.document.nodes.iter().map(|n| n.name.as_str()).collect();
    for (node, _) in links.keys() {
        assert!(names.contains(node.as_str()), "unknown node {}", node);
    }
}

#[test]
fn test_macs_unique_and_commanded_per_endpoint() {
    let fabric = build(&medium_config());
    let assignments = mac_assignments(&fabric.document);

    assert_eq!(assignments.len(), fabric.link_count * 2);
    let macs: HashSet<&str> = assignments.iter().map(|(_, _, mac)| mac.as_str()).collect();
    assert_eq!(macs.len(), assignments.len());

    // The first two links are spine0 to leaf1/leaf2 of the first pair
    assert_eq!(
        assignments[0],
        ("spine0".to_string(), "lf0".to_string(), "02:00:00:00:00:00".to_string())
    );
    assert!(assignments
        .iter()
        .any(|(node, iface, mac)| node == "leaf1-as4200001000" && iface == "sp0" && mac == "02:00:00:00:01:00"));
}

#[test]
fn test_every_node_gets_bring_up_commands() {
    let fabric = build(&FabricConfig::default());

    for config in &fabric.document.node_configs {
        let cmds: Vec<&str> = config.cmds.iter().map(|c| c.cmd.as_str()).collect();
        assert!(cmds[0].starts_with("ip addr add 10."), "{}: {}", config.name, cmds[0]);
        assert!(cmds.contains(&format!("cp /tinet/{}.conf /etc/bird/bird.conf", config.name).as_str()));
        assert!(cmds.contains(&"mkdir -p /run/bird"));
        assert!(cmds.contains(&"bird -c /etc/bird/bird.conf"));
    }
}

#[test]
fn test_rendered_configs_reference_scoped_peers() {
    let fabric = build(&FabricConfig::default());

    for node in &fabric.nodes {
        let config = &node.bird_config;
        assert!(config.contains(&format!("router id {};", node.router_id)), "{}", node.name);
        assert!(config.contains(&format!("define LOCAL_AS = {};", node.asn)));
        assert_eq!(config.matches("neighbor fe80::").count(), node.neighbors.len());
        for neighbor in &node.neighbors {
            assert!(config.contains(&format!(
                "neighbor {} as {};",
                neighbor.peer_lla, neighbor.peer_asn
            )));
            assert!(neighbor.peer_lla.ends_with(&format!("%{}", neighbor.interface)));
        }
    }

    let tor = fabric.node("tor0-as4200010000").expect("tor0 exists");
    assert!(tor.bird_config.contains("import filter tor_import_from_server;"));
    assert!(tor.bird_config.contains("import limit 10 action restart;"));
}

#[test]
fn test_builds_are_deterministic() {
    let config = medium_config();
    let first = output::render_document(&build(&config).document, DocumentFormat::Yaml).unwrap();
    let second = output::render_document(&build(&config).document, DocumentFormat::Yaml).unwrap();
    assert_eq!(first, second);

    let configs_a: Vec<String> = build(&config).nodes.into_iter().map(|n| n.bird_config).collect();
    let configs_b: Vec<String> = build(&config).nodes.into_iter().map(|n| n.bird_config).collect();
    assert_eq!(configs_a, configs_b);
}

#[test]
fn test_external_network_document() {
    let config = FabricConfig {
        routers: 2,
        external_network: true,
        external_interface: Some("enp1s0".to_string()),
        ..Default::default()
    };
    let fabric = build(&config);
    let yaml = output::render_document(&fabric.document, DocumentFormat::Yaml).unwrap();
    assert!(yaml.contains("switches:"));

    for (index, name) in ["router0", "router1"].iter().enumerate() {
        let node = fabric.document.node(name).unwrap();
        let bridge: Vec<_> = node
            .interfaces
            .iter()
            .filter(|iface| iface.kind == InterfaceKind::Bridge)
            .collect();
        assert_eq!(bridge.len(), 1);
        assert_eq!(bridge[0].name, "eth0");

        let cmds = fabric.document.commands(name).unwrap();
        let expected = format!("ip addr add 172.31.255.{}/24 dev eth0", index + 2);
        assert!(cmds.iter().any(|c| c.cmd == expected));
    }
}

#[test]
fn test_write_outputs_to_disk() {
    let temp_dir = TempDir::new().unwrap();
    let config = FabricConfig {
        bird_config_dir: temp_dir.path().join("bird"),
        ..Default::default()
    };
    let fabric = build(&config);

    let written = output::write_bird_configs(&config.bird_config_dir, fabric.bird_configs()).unwrap();
    assert_eq!(written.len(), fabric.nodes.len());
    let spine = fs::read_to_string(config.bird_config_dir.join("spine0.conf")).unwrap();
    assert_eq!(spine, fabric.node("spine0").unwrap().bird_config);

    let document_path = temp_dir.path().join("spec.json");
    let mut file = fs::File::create(&document_path).unwrap();
    output::write_document(&mut file, &fabric.document, DocumentFormat::Json).unwrap();
    drop(file);

    let parsed: TopologyDocument = serde_json::from_str(&fs::read_to_string(&document_path).unwrap()).unwrap();
    assert_eq!(parsed, fabric.document);
}

#[test]
fn test_config_file_drives_build() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "spines: 3\nleaf_pairs: 2\nservers_per_tor: 1\n").unwrap();

    let overrides = CliOverrides {
        routers: Some(0),
        bird_templates: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates.yaml")),
        ..Default::default()
    };
    let config = config_loader::resolve_config(Some(temp_file.path()), overrides).unwrap();
    let templates = template::load_templates(&config.bird_templates).unwrap();
    let fabric = topology::build_fabric(&config, &templates).unwrap();

    assert_eq!(fabric.nodes.len(), config.total_nodes());
    assert_eq!(fabric.nodes_with_role(Role::Spine).count(), 3);
    assert_eq!(fabric.nodes_with_role(Role::Router).count(), 0);
    let bl = fabric.node("bl0").unwrap();
    assert_eq!(bl.neighbors.len(), 3);
}
