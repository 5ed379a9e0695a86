//! Conversions between textual addresses and their D-Bus encodings.
//!
//! NetworkManager's legacy address properties carry IPv4 addresses as a
//! 32-bit integer holding the network-ordered octets reinterpreted in
//! native byte order, and IPv6 addresses as a plain 16-byte array. The
//! integer form is a byte reinterpretation, not a numeric conversion; on
//! a little-endian host the value looks byte-swapped.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::Result;
use crate::models::NetError;

/// Converts an IPv4 address to the integer encoding used on the bus.
pub fn ipv4_to_dbus(addr: Ipv4Addr) -> u32 {
    u32::from_ne_bytes(addr.octets())
}

/// Converts the bus integer encoding back to an IPv4 address.
pub fn ipv4_from_dbus(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw.to_ne_bytes())
}

/// Parses a dotted-quad string into the bus integer encoding.
pub fn ipv4_str_to_dbus(address: &str) -> Result<u32> {
    let addr: Ipv4Addr = address
        .parse()
        .map_err(|_| NetError::Address(format!("not an IPv4 address: {address}")))?;
    Ok(ipv4_to_dbus(addr))
}

/// Renders the bus integer encoding as a dotted-quad string.
pub fn ipv4_str_from_dbus(raw: u32) -> String {
    ipv4_from_dbus(raw).to_string()
}

/// Converts an IPv6 address to the byte-array encoding used on the bus.
pub fn ipv6_to_dbus(addr: Ipv6Addr) -> Vec<u8> {
    addr.octets().to_vec()
}

/// Converts the bus byte-array encoding back to an IPv6 address.
pub fn ipv6_from_dbus(bytes: &[u8]) -> Result<Ipv6Addr> {
    let octets: [u8; 16] = bytes
        .try_into()
        .map_err(|_| NetError::Address(format!("expected 16 bytes, got {}", bytes.len())))?;
    Ok(Ipv6Addr::from(octets))
}

/// Parses an IPv6 string into the bus byte-array encoding.
pub fn ipv6_str_to_dbus(address: &str) -> Result<Vec<u8>> {
    let addr: Ipv6Addr = address
        .parse()
        .map_err(|_| NetError::Address(format!("not an IPv6 address: {address}")))?;
    Ok(ipv6_to_dbus(addr))
}

/// Renders the bus byte-array encoding as an IPv6 string.
pub fn ipv6_str_from_dbus(bytes: &[u8]) -> Result<String> {
    Ok(ipv6_from_dbus(bytes)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_is_a_byte_reinterpretation() {
        // The encoding stores the octets in network order and reads them
        // back as a native integer, so it must match from_ne_bytes exactly.
        let addr: Ipv4Addr = "192.168.0.1".parse().unwrap();
        assert_eq!(ipv4_to_dbus(addr), u32::from_ne_bytes([192, 168, 0, 1]));

        let addr: Ipv4Addr = "10.0.0.138".parse().unwrap();
        assert_eq!(ipv4_to_dbus(addr), u32::from_ne_bytes([10, 0, 0, 138]));

        // A naive numeric conversion would differ on little-endian hosts.
        if cfg!(target_endian = "little") {
            assert_ne!(ipv4_to_dbus("192.168.0.1".parse().unwrap()), 0xC0A8_0001);
        }
    }

    #[test]
    fn ipv4_round_trip_integers() {
        for raw in [
            0u32,
            1,
            u32::from_ne_bytes([192, 168, 0, 1]),
            u32::from_ne_bytes([10, 11, 12, 13]),
            0xFFFF_FFFF,
            0x8000_0001,
        ] {
            assert_eq!(ipv4_to_dbus(ipv4_from_dbus(raw)), raw);
        }
    }

    #[test]
    fn ipv4_round_trip_strings() {
        for s in ["0.0.0.0", "127.0.0.1", "192.168.0.1", "255.255.255.255"] {
            let raw = ipv4_str_to_dbus(s).unwrap();
            assert_eq!(ipv4_str_from_dbus(raw), s);
        }
    }

    #[test]
    fn ipv4_rejects_garbage() {
        assert!(ipv4_str_to_dbus("not-an-address").is_err());
        assert!(ipv4_str_to_dbus("300.1.1.1").is_err());
        assert!(ipv4_str_to_dbus("::1").is_err());
    }

    #[test]
    fn ipv6_round_trip() {
        for s in ["::1", "fe80::1", "2001:db8::8a2e:370:7334"] {
            let bytes = ipv6_str_to_dbus(s).unwrap();
            assert_eq!(bytes.len(), 16);
            assert_eq!(ipv6_str_from_dbus(&bytes).unwrap(), s);
        }
    }

    #[test]
    fn ipv6_no_byte_reordering() {
        let bytes = ipv6_str_to_dbus("2001:db8::1").unwrap();
        assert_eq!(&bytes[..4], &[0x20, 0x01, 0x0d, 0xb8]);
        assert_eq!(bytes[15], 1);
    }

    #[test]
    fn ipv6_rejects_wrong_length() {
        assert!(ipv6_from_dbus(&[0u8; 4]).is_err());
        assert!(ipv6_from_dbus(&[0u8; 17]).is_err());
        assert!(ipv6_str_to_dbus("192.168.0.1").is_err());
    }
}
