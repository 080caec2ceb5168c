//! Loopback router IDs.
//!
//! Each tier draws from its own slice of 10.0.0.0/8:
//!
//! ```text
//! 10.0.0.0/16     servers
//! 10.255.0.0/24   spines
//! 10.255.1.0/24   leafs
//! 10.255.2.0/24   ToRs 0..=254
//! 10.255.3.0/24   ToRs 255..
//! 10.255.254.0/24 border leafs
//! 10.255.255.0/24 external routers
//! ```

use std::net::Ipv4Addr;

use super::AddressError;

/// Anycast address announced by every server
pub const ANYCAST: Ipv4Addr = Ipv4Addr::new(10, 100, 0, 1);

/// Index of the first ToR placed in the second ToR block
const TOR_ROLLOVER: usize = 255;

/// Server hosts per /24, .1 through .255 like the first ToR block
const SERVERS_PER_BLOCK: usize = 255;

/// Last octet for `octet`, provided it lies in `1..=max`
fn host_octet(role: &'static str, index: usize, octet: usize, max: u8) -> Result<u8, AddressError> {
    u8::try_from(octet)
        .ok()
        .filter(|value| (1..=max).contains(value))
        .ok_or(AddressError::OutOfRange { role, index })
}

/// Router ID for a spine
pub fn spine(index: usize) -> Result<Ipv4Addr, AddressError> {
    let octet = host_octet("spine", index, index + 1, 254)?;
    Ok(Ipv4Addr::new(10, 255, 0, octet))
}

/// Router ID for a leaf; `leaf_num` is 1 or 2 within the pair
pub fn leaf(pair_index: usize, leaf_num: usize) -> Result<Ipv4Addr, AddressError> {
    let slot = pair_index * 2 + leaf_num;
    let octet = host_octet("leaf", slot, slot, 254)?;
    Ok(Ipv4Addr::new(10, 255, 1, octet))
}

/// Router ID for a ToR, by global ToR index.
///
/// Indices 0..=254 map to 10.255.2.1..=10.255.2.255, later ones roll over
/// into 10.255.3.1 onwards.
pub fn tor(index: usize) -> Result<Ipv4Addr, AddressError> {
    if index < TOR_ROLLOVER {
        let octet = host_octet("tor", index, index + 1, 255)?;
        Ok(Ipv4Addr::new(10, 255, 2, octet))
    } else {
        let octet = host_octet("tor", index, index - 254, 254)?;
        Ok(Ipv4Addr::new(10, 255, 3, octet))
    }
}

/// Router ID for a border leaf
pub fn border_leaf(index: usize) -> Result<Ipv4Addr, AddressError> {
    let octet = host_octet("border-leaf", index, index + 1, 254)?;
    Ok(Ipv4Addr::new(10, 255, 254, octet))
}

/// Router ID for an external router
pub fn router(index: usize) -> Result<Ipv4Addr, AddressError> {
    let octet = host_octet("router", index, index + 1, 254)?;
    Ok(Ipv4Addr::new(10, 255, 255, octet))
}

/// Router ID for a server, by global server index.
///
/// Servers fill 10.0.0.1..=10.0.0.255, then 10.0.1.1 onwards. Router IDs
/// are /32 loopbacks, so .255 is an ordinary host address here.
pub fn server(index: usize) -> Result<Ipv4Addr, AddressError> {
    let block = u8::try_from(index / SERVERS_PER_BLOCK)
        .map_err(|_| AddressError::OutOfRange { role: "server", index })?;
    let octet = host_octet("server", index, index % SERVERS_PER_BLOCK + 1, 255)?;
    Ok(Ipv4Addr::new(10, 0, block, octet))
}
