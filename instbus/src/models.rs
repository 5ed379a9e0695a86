use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// NetworkManager device types.
///
/// Only the kinds the installer can configure get their own variant;
/// everything else is carried as `Other` with the raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Type is not known to the service.
    Unknown,
    Ethernet,
    Wifi,
    Infiniband,
    Bond,
    Vlan,
    Bridge,
    Team,
    /// Device kind not mapped to a specific variant.
    Other(u32),
}

impl From<u32> for DeviceType {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Ethernet,
            2 => Self::Wifi,
            9 => Self::Infiniband,
            10 => Self::Bond,
            11 => Self::Vlan,
            13 => Self::Bridge,
            15 => Self::Team,
            v => Self::Other(v),
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Ethernet => write!(f, "ethernet"),
            Self::Wifi => write!(f, "wifi"),
            Self::Infiniband => write!(f, "infiniband"),
            Self::Bond => write!(f, "bond"),
            Self::Vlan => write!(f, "vlan"),
            Self::Bridge => write!(f, "bridge"),
            Self::Team => write!(f, "team"),
            Self::Other(v) => write!(f, "other ({v})"),
        }
    }
}

impl DeviceType {
    /// Whether the installer supports configuring this kind of device.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::Ethernet
                | Self::Wifi
                | Self::Infiniband
                | Self::Bond
                | Self::Vlan
                | Self::Bridge
                | Self::Team
        )
    }

    /// Whether the device reports a meaningful permanent hardware address.
    ///
    /// Wired and wireless NICs do; virtual devices report only the
    /// currently programmed address.
    pub fn has_permanent_address(&self) -> bool {
        matches!(self, Self::Ethernet | Self::Wifi)
    }
}

/// NetworkManager device states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Unknown,
    Unmanaged,
    Unavailable,
    Disconnected,
    Prepare,
    Config,
    NeedAuth,
    IpConfig,
    IpCheck,
    Secondaries,
    Activated,
    Deactivating,
    Failed,
    Other(u32),
}

impl From<u32> for DeviceState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            10 => Self::Unmanaged,
            20 => Self::Unavailable,
            30 => Self::Disconnected,
            40 => Self::Prepare,
            50 => Self::Config,
            60 => Self::NeedAuth,
            70 => Self::IpConfig,
            80 => Self::IpCheck,
            90 => Self::Secondaries,
            100 => Self::Activated,
            110 => Self::Deactivating,
            120 => Self::Failed,
            v => Self::Other(v),
        }
    }
}

impl Display for DeviceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Unmanaged => write!(f, "unmanaged"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Prepare => write!(f, "preparing"),
            Self::Config => write!(f, "configuring"),
            Self::NeedAuth => write!(f, "need auth"),
            Self::IpConfig => write!(f, "requesting IP configuration"),
            Self::IpCheck => write!(f, "checking IP configuration"),
            Self::Secondaries => write!(f, "waiting for secondaries"),
            Self::Activated => write!(f, "activated"),
            Self::Deactivating => write!(f, "deactivating"),
            Self::Failed => write!(f, "failed"),
            Self::Other(v) => write!(f, "unknown state ({v})"),
        }
    }
}

/// NetworkManager active connection states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveConnectionState {
    Unknown,
    Activating,
    Activated,
    Deactivating,
    Deactivated,
    Other(u32),
}

impl From<u32> for ActiveConnectionState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::Activating,
            2 => Self::Activated,
            3 => Self::Deactivating,
            4 => Self::Deactivated,
            v => Self::Other(v),
        }
    }
}

impl Display for ActiveConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Deactivating => write!(f, "deactivating"),
            Self::Deactivated => write!(f, "deactivated"),
            Self::Other(v) => write!(f, "unknown state ({v})"),
        }
    }
}

/// Overall connectivity state of the network-management service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Unknown,
    Asleep,
    Disconnected,
    Disconnecting,
    Connecting,
    ConnectedLocal,
    ConnectedSite,
    ConnectedGlobal,
    Other(u32),
}

impl From<u32> for ConnectivityState {
    fn from(code: u32) -> Self {
        match code {
            0 => Self::Unknown,
            10 => Self::Asleep,
            20 => Self::Disconnected,
            30 => Self::Disconnecting,
            40 => Self::Connecting,
            50 => Self::ConnectedLocal,
            60 => Self::ConnectedSite,
            70 => Self::ConnectedGlobal,
            v => Self::Other(v),
        }
    }
}

impl Display for ConnectivityState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Asleep => write!(f, "asleep"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Disconnecting => write!(f, "disconnecting"),
            Self::Connecting => write!(f, "connecting"),
            Self::ConnectedLocal => write!(f, "connected locally"),
            Self::ConnectedSite => write!(f, "connected to a site"),
            Self::ConnectedGlobal => write!(f, "globally connected"),
            Self::Other(v) => write!(f, "unknown state ({v})"),
        }
    }
}

/// Version of the IP protocol an [`IpConfig`] snapshot is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl Display for IpVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}

/// One address entry of an IP configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: String,
    pub prefix: u32,
    pub gateway: String,
}

/// Snapshot of a device's IP configuration.
///
/// Only meaningful while the owning device is activated; queries return an
/// empty snapshot (never a partially filled one) for any other state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConfig {
    pub addresses: Vec<IpAddress>,
    pub nameservers: Vec<String>,
}

impl IpConfig {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.nameservers.is_empty()
    }
}

/// A device as seen by the installer, rebuilt fresh on every query.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub name: String,
    pub device_type: DeviceType,
    pub hw_address: String,
    /// Reported only by devices whose hardware keeps a burned-in address.
    pub perm_hw_address: Option<String>,
    pub state: DeviceState,
}

/// Errors produced by the bus layer and the network query proxy.
#[derive(Debug, Error)]
pub enum NetError {
    /// No usable system bus. Fatal only in environments that promise one;
    /// elsewhere the service graph is simply treated as empty.
    #[error("system bus unavailable")]
    TransportUnavailable {
        #[source]
        source: Option<zbus::Error>,
    },

    /// The named device does not exist on the service.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The property is absent on every interface the object supports.
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    /// The object no longer answers property access at all, which usually
    /// means it vanished between enumeration and query.
    #[error("object no longer supports property access: {0}")]
    UnsupportedObject(String),

    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// A remote value did not have the expected type.
    #[error("unexpected value type: {0}")]
    ValueType(#[from] zvariant::Error),

    /// Introspection data could not be parsed.
    #[error("introspection parse error: {0}")]
    Introspection(String),

    /// A raw address encoding could not be converted to textual form.
    #[error("invalid address encoding: {0}")]
    Address(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_from_u32_all_variants() {
        assert_eq!(DeviceType::from(0), DeviceType::Unknown);
        assert_eq!(DeviceType::from(1), DeviceType::Ethernet);
        assert_eq!(DeviceType::from(2), DeviceType::Wifi);
        assert_eq!(DeviceType::from(9), DeviceType::Infiniband);
        assert_eq!(DeviceType::from(10), DeviceType::Bond);
        assert_eq!(DeviceType::from(11), DeviceType::Vlan);
        assert_eq!(DeviceType::from(13), DeviceType::Bridge);
        assert_eq!(DeviceType::from(15), DeviceType::Team);
        assert_eq!(DeviceType::from(999), DeviceType::Other(999));
    }

    #[test]
    fn device_type_supported_allow_list() {
        let supported = [
            DeviceType::Ethernet,
            DeviceType::Wifi,
            DeviceType::Infiniband,
            DeviceType::Bond,
            DeviceType::Vlan,
            DeviceType::Bridge,
            DeviceType::Team,
        ];
        for t in supported {
            assert!(t.is_supported(), "{t} should be supported");
        }

        // Everything outside the allow-list is filtered out, including
        // kinds the service knows but the installer does not configure.
        for code in [0u32, 5, 8, 14, 16, 32, 999] {
            let t = DeviceType::from(code);
            assert!(!t.is_supported(), "{t} should not be supported");
        }
    }

    #[test]
    fn device_type_permanent_address_rule() {
        assert!(DeviceType::Ethernet.has_permanent_address());
        assert!(DeviceType::Wifi.has_permanent_address());
        assert!(!DeviceType::Bond.has_permanent_address());
        assert!(!DeviceType::Team.has_permanent_address());
        assert!(!DeviceType::Other(42).has_permanent_address());
    }

    #[test]
    fn device_state_from_u32() {
        assert_eq!(DeviceState::from(0), DeviceState::Unknown);
        assert_eq!(DeviceState::from(10), DeviceState::Unmanaged);
        assert_eq!(DeviceState::from(30), DeviceState::Disconnected);
        assert_eq!(DeviceState::from(100), DeviceState::Activated);
        assert_eq!(DeviceState::from(110), DeviceState::Deactivating);
        assert_eq!(DeviceState::from(120), DeviceState::Failed);
        assert_eq!(DeviceState::from(55), DeviceState::Other(55));
    }

    #[test]
    fn active_connection_state_from_u32() {
        assert_eq!(ActiveConnectionState::from(0), ActiveConnectionState::Unknown);
        assert_eq!(
            ActiveConnectionState::from(2),
            ActiveConnectionState::Activated
        );
        assert_eq!(
            ActiveConnectionState::from(4),
            ActiveConnectionState::Deactivated
        );
        assert_eq!(
            ActiveConnectionState::from(99),
            ActiveConnectionState::Other(99)
        );
    }

    #[test]
    fn connectivity_state_from_u32() {
        assert_eq!(ConnectivityState::from(0), ConnectivityState::Unknown);
        assert_eq!(ConnectivityState::from(20), ConnectivityState::Disconnected);
        assert_eq!(
            ConnectivityState::from(70),
            ConnectivityState::ConnectedGlobal
        );
        assert_eq!(ConnectivityState::from(75), ConnectivityState::Other(75));
    }

    #[test]
    fn connectivity_state_display() {
        assert_eq!(
            format!("{}", ConnectivityState::ConnectedGlobal),
            "globally connected"
        );
        assert_eq!(format!("{}", ConnectivityState::Other(75)), "unknown state (75)");
    }

    #[test]
    fn ip_config_empty() {
        let config = IpConfig::default();
        assert!(config.is_empty());

        let config = IpConfig {
            addresses: vec![IpAddress {
                address: "192.168.0.1".into(),
                prefix: 24,
                gateway: "192.168.0.254".into(),
            }],
            nameservers: vec![],
        };
        assert!(!config.is_empty());
    }

    #[test]
    fn net_error_display() {
        assert_eq!(
            format!("{}", NetError::UnknownDevice("eth7".into())),
            "unknown device: eth7"
        );
        assert_eq!(
            format!("{}", NetError::PropertyNotFound("Udi".into())),
            "property not found: Udi"
        );
        assert_eq!(
            format!("{}", NetError::TransportUnavailable { source: None }),
            "system bus unavailable"
        );
    }
}
