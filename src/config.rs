use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::addressing::asn;

/// Largest number of spines addressable from 10.255.0.0/24
pub const MAX_SPINES: usize = 254;
/// Largest number of leaf pairs addressable from 10.255.1.0/24
pub const MAX_LEAF_PAIRS: usize = 127;
/// Largest number of ToRs across the two ToR router-ID blocks
pub const MAX_TORS: usize = 509;
/// Largest number of border leafs addressable from 10.255.254.0/24
pub const MAX_BORDER_LEAFS: usize = 254;
/// Largest number of external routers addressable from 10.255.255.0/24
pub const MAX_ROUTERS: usize = 254;
/// Largest number of routers when each also needs an address on the external bridge
pub const MAX_EXTERNAL_ROUTERS: usize = 253;
/// Largest number of servers addressable from 10.0.0.0/16 (255 per /24)
pub const MAX_SERVERS: usize = 65280;

/// Fabric sizing and output configuration.
///
/// Field names double as the keys of the optional YAML fabric file, so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    /// Number of spine switches
    pub spines: usize,
    /// Number of leaf switch pairs
    pub leaf_pairs: usize,
    /// Number of ToR switches attached to each leaf pair
    pub tors_per_pair: usize,
    /// Number of servers attached to each ToR
    pub servers_per_tor: usize,
    /// Number of border leaf switches
    pub border_leafs: usize,
    /// Number of external routers
    pub routers: usize,
    /// Directory receiving one BIRD config file per node
    pub bird_config_dir: PathBuf,
    /// Path to the per-role BIRD template document
    pub bird_templates: PathBuf,
    /// Attach routers to an external bridge with NAT towards the host
    pub external_network: bool,
    /// Host interface used for external connectivity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_interface: Option<String>,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            spines: 2,
            leaf_pairs: 1,
            tors_per_pair: 2,
            servers_per_tor: 2,
            border_leafs: 1,
            routers: 1,
            bird_config_dir: PathBuf::from("./output"),
            bird_templates: PathBuf::from("templates.yaml"),
            external_network: false,
            external_interface: None,
        }
    }
}

impl FabricConfig {
    /// Total number of ToRs across all leaf pairs, saturating on overflow
    pub fn total_tors(&self) -> usize {
        self.leaf_pairs.saturating_mul(self.tors_per_pair)
    }

    /// Total number of servers across all ToRs, saturating on overflow
    pub fn total_servers(&self) -> usize {
        self.total_tors().saturating_mul(self.servers_per_tor)
    }

    /// Total number of nodes in the fabric, saturating on overflow
    pub fn total_nodes(&self) -> usize {
        [
            self.spines,
            self.leaf_pairs.saturating_mul(2),
            self.border_leafs,
            self.total_tors(),
            self.total_servers(),
            self.routers,
        ]
        .into_iter()
        .fold(0, usize::saturating_add)
    }

    /// Host interface name, present only when external networking is usable
    pub fn external_interface(&self) -> Option<&str> {
        self.external_interface
            .as_deref()
            .filter(|iface| !iface.trim().is_empty())
    }

    /// Validate the configuration before any output is produced
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.external_network && self.external_interface().is_none() {
            return Err(ValidationError::MissingExternalInterface);
        }

        check_limit("spines", self.spines, MAX_SPINES)?;
        check_limit("leaf_pairs", self.leaf_pairs, MAX_LEAF_PAIRS)?;
        check_limit("border_leafs", self.border_leafs, MAX_BORDER_LEAFS)?;

        let max_routers = if self.external_network {
            MAX_EXTERNAL_ROUTERS
        } else {
            MAX_ROUTERS
        };
        check_limit("routers", self.routers, max_routers)?;

        let tors = self
            .leaf_pairs
            .checked_mul(self.tors_per_pair)
            .ok_or(ValidationError::TooMany { tier: "tors", count: usize::MAX, max: MAX_TORS })?;
        check_limit("tors", tors, MAX_TORS)?;

        let servers = tors
            .checked_mul(self.servers_per_tor)
            .ok_or(ValidationError::TooMany { tier: "servers", count: usize::MAX, max: MAX_SERVERS })?;
        check_limit("servers", servers, MAX_SERVERS)?;

        if !asn::ranges_disjoint(self.leaf_pairs, tors, servers) {
            return Err(ValidationError::AsnOverlap);
        }

        Ok(())
    }
}

fn check_limit(tier: &'static str, count: usize, max: usize) -> Result<(), ValidationError> {
    if count > max {
        return Err(ValidationError::TooMany { tier, count, max });
    }
    Ok(())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("external network requires an external interface (--external-interface)")]
    MissingExternalInterface,
    #[error("too many {tier}: {count} requested, at most {max} can be addressed")]
    TooMany {
        tier: &'static str,
        count: usize,
        max: usize,
    },
    #[error("ASN ranges for leafs, ToRs and servers would overlap")]
    AsnOverlap,
}
