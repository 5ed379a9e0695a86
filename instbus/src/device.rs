//! Device enumeration and property lookup against the foreign service.
//!
//! Properties of a device object live on the generic `.Device` interface
//! or on one type-specific sub-interface; the lookup here tries the
//! generic interface first and introspects for the subtype interface only
//! when the property is absent there. Results are never cached; every
//! call is answered from the service's current state.

use log::warn;
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Result;
use crate::accessor::{Lookup, PropertyAccessor, convert, method_error_name};
use crate::constants::{nm, suffix};
use crate::models::{
    ActiveConnectionState, ConnectivityState, DeviceRecord, DeviceState, DeviceType, NetError,
};
use crate::network::NetworkState;
use crate::proxies::NMProxy;

/// Hardware address reported for devices that do not expose one.
const NULL_HW_ADDRESS: &str = "00:00:00:00:00:00";

/// Maps a vanished-object failure to `None`, leaving other outcomes alone.
fn absorb_vanished<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(NetError::UnsupportedObject(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Overall connectivity state of the service.
///
/// Image and directory installs run without the service and assume the
/// network is already up.
pub(crate) async fn connectivity_state(net: &NetworkState) -> Result<ConnectivityState> {
    let lookup = match net.try_accessor() {
        Some(acc) => acc.get(nm::ROOT_PATH, "State", "").await?,
        None => Lookup::Absent,
    };

    match lookup {
        Lookup::Value(v) => Ok(ConnectivityState::from(convert::<u32>(v)?)),
        Lookup::Absent if !net.env().is_hardware => Ok(ConnectivityState::ConnectedGlobal),
        Lookup::Absent => Ok(ConnectivityState::Unknown),
    }
}

/// Interface names of all devices the installer supports, in the
/// service's enumeration order. An empty service graph gives an empty
/// list, not an error.
pub(crate) async fn list_devices(net: &NetworkState) -> Result<Vec<String>> {
    let Some(acc) = net.try_accessor() else {
        return Ok(Vec::new());
    };
    let proxy = NMProxy::new(acc.connection()).await?;

    let mut interfaces = Vec::new();
    for path in proxy.get_devices().await? {
        let device_type = match acc.get(path.as_str(), "DeviceType", suffix::DEVICE).await? {
            Lookup::Value(v) => DeviceType::from(convert::<u32>(v)?),
            Lookup::Absent => continue,
        };
        if !device_type.is_supported() {
            continue;
        }

        if let Lookup::Value(v) = acc.get(path.as_str(), "Interface", suffix::DEVICE).await? {
            interfaces.push(convert::<String>(v)?);
        }
    }

    Ok(interfaces)
}

/// Interface names of all devices that currently carry an activated
/// connection, preferring the routed IP interface name over the
/// link-layer one.
pub(crate) async fn list_activated_devices(net: &NetworkState) -> Result<Vec<String>> {
    let Some(acc) = net.try_accessor() else {
        return Ok(Vec::new());
    };

    let Some(value) = acc
        .get(nm::ROOT_PATH, "ActiveConnections", "")
        .await?
        .into_option()
    else {
        return Ok(Vec::new());
    };
    let active: Vec<OwnedObjectPath> = convert(value)?;

    let mut interfaces = Vec::new();
    for ac in active {
        // An active connection can disappear between enumeration and
        // this query; such entries are simply skipped.
        let state = match absorb_vanished(
            acc.get(ac.as_str(), "State", suffix::ACTIVE_CONNECTION).await,
        )? {
            Some(Lookup::Value(v)) => ActiveConnectionState::from(convert::<u32>(v)?),
            Some(Lookup::Absent) | None => continue,
        };
        if state != ActiveConnectionState::Activated {
            continue;
        }

        let devices: Vec<OwnedObjectPath> = match absorb_vanished(
            acc.get(ac.as_str(), "Devices", suffix::ACTIVE_CONNECTION)
                .await,
        )? {
            Some(Lookup::Value(v)) => convert(v)?,
            Some(Lookup::Absent) | None => continue,
        };

        for device in devices {
            match absorb_vanished(device_interface_name(acc, device.as_str()).await)? {
                Some(Some(name)) => interfaces.push(name),
                _ => continue,
            }
        }
    }

    Ok(interfaces)
}

/// The routed IP interface name of a device, falling back to the
/// link-layer name when no routed name is assigned.
async fn device_interface_name(
    acc: &PropertyAccessor,
    device_path: &str,
) -> Result<Option<String>> {
    if let Lookup::Value(v) = acc.get(device_path, "IpInterface", suffix::DEVICE).await? {
        let name: String = convert(v)?;
        if !name.is_empty() {
            return Ok(Some(name));
        }
    }

    match acc.get(device_path, "Interface", suffix::DEVICE).await? {
        Lookup::Value(v) => Ok(Some(convert(v)?)),
        Lookup::Absent => Ok(None),
    }
}

/// Resolves a device name to its object path.
async fn device_path(acc: &PropertyAccessor, name: &str) -> Result<OwnedObjectPath> {
    let proxy = NMProxy::new(acc.connection()).await?;
    proxy.get_device_by_ip_iface(name).await.map_err(|e| {
        if method_error_name(&e) == Some(nm::UNKNOWN_DEVICE_ERROR) {
            NetError::UnknownDevice(name.to_owned())
        } else {
            e.into()
        }
    })
}

/// First interface under the device-subtype namespace that is not the
/// statistics sub-interface, as a suffix of the base interface name.
async fn type_specific_suffix(
    acc: &PropertyAccessor,
    device_path: &str,
) -> Result<Option<String>> {
    for iface in acc.object_interfaces(device_path).await? {
        if iface.starts_with(suffix::DEVICE_SUBTYPE_PREFIX) && iface != suffix::DEVICE_STATISTICS {
            return Ok(iface.strip_prefix(nm::BASE_INTERFACE).map(str::to_owned));
        }
    }
    Ok(None)
}

/// Value of a device property, resolved first on the generic `.Device`
/// interface and then on the device's type-specific interface.
///
/// Fails with [`NetError::UnknownDevice`] when no device of that name
/// exists and with [`NetError::PropertyNotFound`] when the property is
/// absent on every resolvable interface.
pub(crate) async fn device_property(
    net: &NetworkState,
    name: &str,
    property: &str,
) -> Result<OwnedValue> {
    let Some(acc) = net.try_accessor() else {
        // An empty service graph has no devices at all.
        return Err(NetError::UnknownDevice(name.to_owned()));
    };
    let device = device_path(acc, name).await?;

    match acc.get(device.as_str(), property, suffix::DEVICE).await? {
        Lookup::Value(v) => Ok(v),
        Lookup::Absent => {
            if let Some(type_suffix) = type_specific_suffix(acc, device.as_str()).await? {
                if let Lookup::Value(v) = acc.get(device.as_str(), property, &type_suffix).await? {
                    return Ok(v);
                }
            }
            Err(NetError::PropertyNotFound(property.to_owned()))
        }
    }
}

pub(crate) async fn device_type(net: &NetworkState, name: &str) -> Result<DeviceType> {
    let raw: u32 = convert(device_property(net, name, "DeviceType").await?)?;
    Ok(DeviceType::from(raw))
}

pub(crate) async fn device_state(net: &NetworkState, name: &str) -> Result<DeviceState> {
    let raw: u32 = convert(device_property(net, name, "State").await?)?;
    Ok(DeviceState::from(raw))
}

pub(crate) async fn device_hw_address(net: &NetworkState, name: &str) -> Result<String> {
    convert(device_property(net, name, "HwAddress").await?)
}

/// The permanent hardware address, or `None` when the device does not
/// report one at all. A reported-but-empty address is still `Some`.
pub(crate) async fn device_perm_hw_address(
    net: &NetworkState,
    name: &str,
) -> Result<Option<String>> {
    match device_property(net, name, "PermHwAddress").await {
        Ok(v) => Ok(Some(convert(v)?)),
        Err(NetError::PropertyNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The hardware address that identifies the device for configuration
/// purposes: the permanent address for wired and wireless NICs, the
/// currently programmed one for everything else.
pub(crate) async fn valid_hardware_address(net: &NetworkState, name: &str) -> Result<String> {
    let device_type = device_type(net, name).await?;

    if device_type.has_permanent_address() {
        match device_perm_hw_address(net, name).await? {
            Some(permanent) => return Ok(permanent),
            None => warn!("device {name} does not report a permanent hardware address"),
        }
    }

    device_hw_address(net, name).await
}

/// Builds a fresh [`DeviceRecord`] from the service's current state.
pub(crate) async fn device_record(net: &NetworkState, name: &str) -> Result<DeviceRecord> {
    let device_type = device_type(net, name).await?;
    let state = device_state(net, name).await?;

    let hw_address = match device_hw_address(net, name).await {
        Ok(addr) => addr,
        Err(NetError::PropertyNotFound(_)) => {
            warn!("device {name} does not report a hardware address");
            NULL_HW_ADDRESS.to_owned()
        }
        Err(e) => return Err(e),
    };

    let perm_hw_address = if device_type.has_permanent_address() {
        device_perm_hw_address(net, name).await?
    } else {
        None
    };

    Ok(DeviceRecord {
        name: name.to_owned(),
        device_type,
        hw_address,
        perm_hw_address,
        state,
    })
}

impl DeviceRecord {
    /// The address [`valid_hardware_address`] would pick for this record:
    /// permanent when the device kind keeps one and it is reported (even
    /// as an empty string), current otherwise.
    pub fn preferred_hw_address(&self) -> &str {
        if self.device_type.has_permanent_address() {
            if let Some(permanent) = &self.perm_hw_address {
                return permanent;
            }
        }
        &self.hw_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        device_type: DeviceType,
        perm_hw_address: Option<&str>,
        hw_address: &str,
    ) -> DeviceRecord {
        DeviceRecord {
            name: "eth0".into(),
            device_type,
            hw_address: hw_address.into(),
            perm_hw_address: perm_hw_address.map(str::to_owned),
            state: DeviceState::Activated,
        }
    }

    #[test]
    fn preferred_address_takes_permanent_for_wired_and_wireless() {
        let r = record(
            DeviceType::Ethernet,
            Some("AA:BB:CC:DD:EE:00"),
            "AA:BB:CC:DD:EE:01",
        );
        assert_eq!(r.preferred_hw_address(), "AA:BB:CC:DD:EE:00");

        let r = record(
            DeviceType::Wifi,
            Some("AA:BB:CC:DD:EE:00"),
            "AA:BB:CC:DD:EE:01",
        );
        assert_eq!(r.preferred_hw_address(), "AA:BB:CC:DD:EE:00");
    }

    #[test]
    fn preferred_address_falls_back_only_when_permanent_is_absent() {
        let r = record(DeviceType::Ethernet, None, "AA:BB:CC:DD:EE:01");
        assert_eq!(r.preferred_hw_address(), "AA:BB:CC:DD:EE:01");

        // Present but empty still counts as present.
        let r = record(DeviceType::Ethernet, Some(""), "AA:BB:CC:DD:EE:01");
        assert_eq!(r.preferred_hw_address(), "");
    }

    #[test]
    fn preferred_address_ignores_permanent_for_virtual_devices() {
        let r = record(
            DeviceType::Bond,
            Some("AA:BB:CC:DD:EE:00"),
            "AA:BB:CC:DD:EE:01",
        );
        assert_eq!(r.preferred_hw_address(), "AA:BB:CC:DD:EE:01");
    }
}
