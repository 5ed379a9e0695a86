//! IP configuration snapshots and DHCP-derived data.
//!
//! The config objects referenced by a device are only valid while the
//! device stays activated, and the state check and the detail fetch here
//! are separate round trips. A device that deactivates in between makes
//! the config object vanish; that race is answered with an empty
//! snapshot, never an error or a partially filled one.

use std::collections::HashMap;
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Result;
use crate::accessor::{PropertyAccessor, convert};
use crate::address;
use crate::constants::suffix;
use crate::device;
use crate::models::{DeviceState, IpAddress, IpConfig, IpVersion, NetError};
use crate::network::NetworkState;

/// Fetches a config-object property, folding "object vanished" and
/// "not set" into `None`.
async fn config_property(
    acc: &PropertyAccessor,
    config_path: &str,
    property: &str,
    interface_suffix: &str,
) -> Result<Option<OwnedValue>> {
    match acc.get(config_path, property, interface_suffix).await {
        Ok(lookup) => Ok(lookup.into_option()),
        Err(NetError::UnsupportedObject(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn decode_v4_addresses(value: OwnedValue) -> Result<Vec<IpAddress>> {
    let raw: Vec<Vec<u32>> = convert(value)?;
    raw.into_iter()
        .map(|entry| match entry[..] {
            [addr, prefix, gateway] => Ok(IpAddress {
                address: address::ipv4_str_from_dbus(addr),
                prefix,
                gateway: address::ipv4_str_from_dbus(gateway),
            }),
            _ => Err(NetError::Address(format!(
                "malformed IPv4 address entry of {} elements",
                entry.len()
            ))),
        })
        .collect()
}

fn decode_v6_addresses(value: OwnedValue) -> Result<Vec<IpAddress>> {
    let raw: Vec<(Vec<u8>, u32, Vec<u8>)> = convert(value)?;
    raw.into_iter()
        .map(|(addr, prefix, gateway)| {
            Ok(IpAddress {
                address: address::ipv6_str_from_dbus(&addr)?,
                prefix,
                gateway: address::ipv6_str_from_dbus(&gateway)?,
            })
        })
        .collect()
}

fn decode_v4_nameservers(value: OwnedValue) -> Result<Vec<String>> {
    let raw: Vec<u32> = convert(value)?;
    Ok(raw.into_iter().map(address::ipv4_str_from_dbus).collect())
}

fn decode_v6_nameservers(value: OwnedValue) -> Result<Vec<String>> {
    let raw: Vec<Vec<u8>> = convert(value)?;
    raw.iter()
        .map(|ns| address::ipv6_str_from_dbus(ns))
        .collect()
}

/// Snapshot of the device's IP configuration for one protocol version.
///
/// Empty unless the device is activated at query time, and empty again
/// if the config object vanishes mid-query.
pub(crate) async fn ip_configuration(
    net: &NetworkState,
    name: &str,
    version: IpVersion,
) -> Result<IpConfig> {
    if device::device_state(net, name).await? != DeviceState::Activated {
        return Ok(IpConfig::default());
    }

    let (config_prop, config_suffix) = match version {
        IpVersion::V4 => ("Ip4Config", suffix::IP4_CONFIG),
        IpVersion::V6 => ("Ip6Config", suffix::IP6_CONFIG),
    };

    let config_path: OwnedObjectPath =
        convert(device::device_property(net, name, config_prop).await?)?;
    if config_path.as_str() == "/" {
        return Ok(IpConfig::default());
    }

    let Some(acc) = net.try_accessor() else {
        return Ok(IpConfig::default());
    };

    let Some(value) = config_property(acc, config_path.as_str(), "Addresses", config_suffix).await?
    else {
        return Ok(IpConfig::default());
    };
    let addresses = match version {
        IpVersion::V4 => decode_v4_addresses(value)?,
        IpVersion::V6 => decode_v6_addresses(value)?,
    };

    let Some(value) =
        config_property(acc, config_path.as_str(), "Nameservers", config_suffix).await?
    else {
        return Ok(IpConfig::default());
    };
    let nameservers = match version {
        IpVersion::V4 => decode_v4_nameservers(value)?,
        IpVersion::V6 => decode_v6_nameservers(value)?,
    };

    Ok(IpConfig {
        addresses,
        nameservers,
    })
}

/// Just the address strings of [`ip_configuration`].
pub(crate) async fn ip_addresses(
    net: &NetworkState,
    name: &str,
    version: IpVersion,
) -> Result<Vec<String>> {
    let config = ip_configuration(net, name, version).await?;
    Ok(config.addresses.into_iter().map(|a| a.address).collect())
}

/// NTP servers handed out by DHCPv4 on every activated device, in
/// device-enumeration order. DHCPv6 leases are never queried; the
/// service does not expose NTP options for them.
pub(crate) async fn dhcp_ntp_servers(net: &NetworkState) -> Result<Vec<String>> {
    let mut servers = Vec::new();

    for device_name in device::list_activated_devices(net).await? {
        let lease_path: OwnedObjectPath =
            match device::device_property(net, &device_name, "Dhcp4Config").await {
                Ok(v) => convert(v)?,
                // The device can deactivate or vanish while we walk the list.
                Err(NetError::UnknownDevice(_) | NetError::PropertyNotFound(_)) => continue,
                Err(e) => return Err(e),
            };
        if lease_path.as_str() == "/" {
            continue;
        }

        let Some(acc) = net.try_accessor() else {
            break;
        };
        let Some(value) =
            config_property(acc, lease_path.as_str(), "Options", suffix::DHCP4_CONFIG).await?
        else {
            continue;
        };
        let mut options: HashMap<String, OwnedValue> = convert(value)?;

        if let Some(list) = options.remove("ntp_servers") {
            // The lease option is a single whitespace-delimited string.
            let list: String = convert(list)?;
            servers.extend(list.split_whitespace().map(str::to_owned));
        }
    }

    Ok(servers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{ipv4_str_to_dbus, ipv6_str_to_dbus};
    use zvariant::Value;

    fn owned(value: Value<'_>) -> OwnedValue {
        value.try_to_owned().unwrap()
    }

    #[test]
    fn v4_addresses_decode() {
        let raw = vec![
            vec![
                ipv4_str_to_dbus("192.168.0.1").unwrap(),
                24,
                ipv4_str_to_dbus("192.168.0.254").unwrap(),
            ],
            vec![ipv4_str_to_dbus("10.0.0.2").unwrap(), 8, 0],
        ];
        let decoded = decode_v4_addresses(owned(Value::from(raw))).unwrap();
        assert_eq!(
            decoded,
            vec![
                IpAddress {
                    address: "192.168.0.1".into(),
                    prefix: 24,
                    gateway: "192.168.0.254".into(),
                },
                IpAddress {
                    address: "10.0.0.2".into(),
                    prefix: 8,
                    gateway: "0.0.0.0".into(),
                },
            ]
        );
    }

    #[test]
    fn v4_addresses_reject_malformed_entries() {
        let raw = vec![vec![1u32, 2]];
        assert!(decode_v4_addresses(owned(Value::from(raw))).is_err());
    }

    #[test]
    fn v6_addresses_decode() {
        let raw = vec![(
            ipv6_str_to_dbus("2001:db8::1").unwrap(),
            64u32,
            ipv6_str_to_dbus("fe80::1").unwrap(),
        )];
        let decoded = decode_v6_addresses(owned(Value::from(raw))).unwrap();
        assert_eq!(
            decoded,
            vec![IpAddress {
                address: "2001:db8::1".into(),
                prefix: 64,
                gateway: "fe80::1".into(),
            }]
        );
    }

    #[test]
    fn nameservers_decode() {
        let v4 = vec![
            ipv4_str_to_dbus("192.168.0.53").unwrap(),
            ipv4_str_to_dbus("8.8.8.8").unwrap(),
        ];
        assert_eq!(
            decode_v4_nameservers(owned(Value::from(v4))).unwrap(),
            vec!["192.168.0.53".to_owned(), "8.8.8.8".to_owned()]
        );

        let v6 = vec![ipv6_str_to_dbus("2001:4860:4860::8888").unwrap()];
        assert_eq!(
            decode_v6_nameservers(owned(Value::from(v6))).unwrap(),
            vec!["2001:4860:4860::8888".to_owned()]
        );
    }
}
