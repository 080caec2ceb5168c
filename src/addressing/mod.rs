//! Identifier allocation for fabric nodes and links.
//!
//! Every identifier is derived from a tier-relative index (or, for link
//! addressing, from the global link counter) by a pure function, so a
//! fabric of the same size always receives the same ASNs, router IDs,
//! MACs and link-local addresses.

pub mod asn;
pub mod mac;
pub mod router_id;

pub use mac::{format_scoped, generate_mac, mac_to_lla, MacAddr};

/// Identifier allocation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("{role} index {index} is outside the router-ID block")]
    OutOfRange { role: &'static str, index: usize },
    #[error("invalid MAC address '{0}'")]
    InvalidMac(String),
}
