//! # tinet Topology Document
//!
//! Data structures for the topology document consumed by the tinet network
//! emulator, plus the fixed constants the generated bring-up commands refer
//! to.
//!
//! ## Document Structure
//!
//! ```yaml
//! nodes:
//!   - name: spine0
//!     image: ghcr.io/zinrai/docker-debian-bird2:debian-trixie
//!     interfaces:
//!       - name: lf0
//!         type: direct
//!         args: leaf1-as4200001000#sp0
//! switches:            # only with external networking
//!   - name: br-ext
//!     interfaces: []
//! node_configs:
//!   - name: spine0
//!     cmds:
//!       - cmd: ip addr add 10.255.0.1/32 dev lo
//! ```
//!
//! ## Interface Ownership
//!
//! Each point-to-point link is recorded once, on the endpoint that created
//! it. tinet materializes the reverse side itself; emitting both would make
//! it create the veth pair twice. [`TopologyDocument::direct_links`]
//! rebuilds the full bidirectional map when it is needed.

pub mod types;

use std::net::Ipv4Addr;

pub use types::{Command, Interface, InterfaceKind, Node, NodeConfig, Switch, TopologyDocument};

/// Container image used for every node
pub const CONTAINER_IMAGE: &str = "ghcr.io/zinrai/docker-debian-bird2:debian-trixie";

/// Bridge the routers attach to when external networking is enabled
pub const EXTERNAL_BRIDGE: &str = "br-ext";

/// Router-side interface on the external bridge
pub const EXTERNAL_INTERFACE: &str = "eth0";

/// Host address on the external bridge, used as the routers' default gateway
pub const EXTERNAL_GATEWAY: Ipv4Addr = Ipv4Addr::new(172, 31, 255, 1);

/// Prefix length of the external bridge subnet
pub const EXTERNAL_PREFIX_LEN: u8 = 24;

/// Address of router `index` on the external bridge
pub fn external_router_ip(index: usize) -> Option<Ipv4Addr> {
    let octet = u8::try_from(index + 2).ok().filter(|octet| *octet < 255)?;
    let [a, b, c, _] = EXTERNAL_GATEWAY.octets();
    Some(Ipv4Addr::new(a, b, c, octet))
}
