//! Autonomous system numbers.
//!
//! Spines, border leafs and external routers each share one ASN per tier.
//! Leaf pairs, ToRs and servers get one ASN each, counted up from a
//! per-tier base inside the 32-bit private range.

/// ASN shared by all spines
pub const SPINE: u32 = 4_200_000_000;
/// ASN shared by all border leafs
pub const BORDER_LEAF: u32 = 4_200_000_001;
/// ASN shared by all external routers
pub const ROUTER: u32 = 4_200_000_002;
/// First leaf-pair ASN
pub const LEAF_BASE: u32 = 4_200_001_000;
/// First ToR ASN
pub const TOR_BASE: u32 = 4_200_010_000;
/// First server ASN
pub const SERVER_BASE: u32 = 4_200_100_000;

/// ASN for a leaf pair; both leafs of a pair share it
pub fn leaf(pair_index: usize) -> u32 {
    offset(LEAF_BASE, pair_index)
}

/// ASN for a ToR, by global ToR index
pub fn tor(index: usize) -> u32 {
    offset(TOR_BASE, index)
}

/// ASN for a server, by global server index
pub fn server(index: usize) -> u32 {
    offset(SERVER_BASE, index)
}

fn offset(base: u32, index: usize) -> u32 {
    base.saturating_add(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Check that the per-index ranges for the given tier sizes stay inside
/// their own slice of the ASN space
pub fn ranges_disjoint(leaf_pairs: usize, tors: usize, servers: usize) -> bool {
    let fits = |base: u32, count: usize, limit: u64| base as u64 + count as u64 <= limit;

    fits(LEAF_BASE, leaf_pairs, TOR_BASE as u64)
        && fits(TOR_BASE, tors, SERVER_BASE as u64)
        && fits(SERVER_BASE, servers, u32::MAX as u64 + 1)
}
