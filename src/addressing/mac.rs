//! Link-layer addressing: locally administered MACs and the EUI-64
//! link-local IPv6 addresses derived from them (RFC 4291 §2.5.1).

use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use super::AddressError;

/// Universal/local bit of the first octet
const LOCAL_BIT: u8 = 0x02;

/// A 48-bit MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// True when the universal/local bit marks the address as locally administered
    pub const fn is_local(&self) -> bool {
        self.0[0] & LOCAL_BIT != 0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddr {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AddressError::InvalidMac(s.to_string());
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().filter(|p| p.len() == 2).ok_or_else(invalid)?;
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

/// MAC for a link endpoint: `02:` followed by the big-endian sequence
/// number and a trailing zero octet.
///
/// The last octet stays zero for every sequence number.
pub fn generate_mac(seq: u32) -> MacAddr {
    let [a, b, c, d] = seq.to_be_bytes();
    MacAddr([LOCAL_BIT, a, b, c, d, 0x00])
}

/// Link-local address for a MAC via modified EUI-64: insert `ff:fe` between
/// the third and fourth octets, flip the universal/local bit and place the
/// result under `fe80::/64`.
pub fn mac_to_lla(mac: MacAddr) -> Ipv6Addr {
    let [m0, m1, m2, m3, m4, m5] = mac.octets();
    Ipv6Addr::from([
        0xfe, 0x80, 0, 0, 0, 0, 0, 0,
        m0 ^ LOCAL_BIT, m1, m2, 0xff, 0xfe, m3, m4, m5,
    ])
}

/// Address with an interface scope suffix, e.g. `fe80::ff:fe00:1%eth0`
pub fn format_scoped(addr: impl fmt::Display, iface: &str) -> String {
    format!("{}%{}", addr, iface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mac_to_lla() {
        let vectors = [
            // Locally administered MACs (U/L bit already set)
            ("02:00:00:00:00:00", "fe80::ff:fe00:0"),
            ("02:00:00:00:01:00", "fe80::ff:fe00:100"),
            ("02:00:00:01:00:00", "fe80::ff:fe01:0"),
            // Universally administered MAC
            ("00:12:7f:eb:6b:40", "fe80::212:7fff:feeb:6b40"),
        ];

        for (mac, expected) in vectors {
            let mac: MacAddr = mac.parse().unwrap();
            assert_eq!(mac_to_lla(mac).to_string(), expected, "MAC {}", mac);
        }
    }

    #[test]
    fn test_generate_mac_layout() {
        assert_eq!(generate_mac(0).to_string(), "02:00:00:00:00:00");
        assert_eq!(generate_mac(1).to_string(), "02:00:00:00:01:00");
        assert_eq!(generate_mac(0x0a0b0c0d).to_string(), "02:0a:0b:0c:0d:00");
        assert_eq!(generate_mac(u32::MAX).octets(), [0x02, 0xff, 0xff, 0xff, 0xff, 0x00]);
    }

    #[test]
    fn test_generated_macs_unique_and_local() {
        let mut seen = HashSet::new();
        for seq in (0..4096).chain([u32::MAX - 1, u32::MAX]) {
            let mac = generate_mac(seq);
            assert!(mac.is_local());
            assert_eq!(mac.octets()[5], 0);
            assert!(seen.insert(mac));
        }
    }

    #[test]
    fn test_lla_is_link_local() {
        let lla = mac_to_lla(generate_mac(42));
        assert_eq!(lla.segments()[0], 0xfe80);
        assert_eq!(&lla.segments()[1..4], &[0, 0, 0]);
    }

    #[test]
    fn test_format_scoped() {
        let lla = mac_to_lla(generate_mac(1));
        assert_eq!(format_scoped(lla, "lf0"), "fe80::ff:fe00:100%lf0");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("02:00:00:00:00".parse::<MacAddr>().is_err());
        assert!("02:00:00:00:00:00:00".parse::<MacAddr>().is_err());
        assert!("02:00:00:00:00:zz".parse::<MacAddr>().is_err());
        assert!("020:0:00:00:00:00".parse::<MacAddr>().is_err());
    }
}
