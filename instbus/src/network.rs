//! High-level query interface to the network-management service.

use zbus::Connection;
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Result;
use crate::accessor::{PropertyAccessor, ServiceEndpoint};
use crate::bus;
use crate::config::Environment;
use crate::models::{
    ConnectivityState, DeviceRecord, DeviceState, DeviceType, IpConfig, IpVersion,
};
use crate::proxies::ConnectionSettings;
use crate::{device, ip_config, settings};

/// Read-only view of the network-management service's object graph.
///
/// Every query is answered from the service's current state with fresh
/// round trips; nothing is cached. Without a system bus (offline install
/// images) the service graph is treated as empty.
///
/// The queries block on bus round trips, so call them from a context
/// prepared to wait, not from an interactive loop.
#[derive(Clone)]
pub struct NetworkState {
    conn: Option<Connection>,
    accessor: Option<PropertyAccessor>,
    env: Environment,
}

impl NetworkState {
    /// Connects to the system bus.
    ///
    /// In environments that do not promise a system bus a failed
    /// connection yields an offline view; otherwise it is an error.
    pub async fn connect(env: Environment) -> Result<Self> {
        let conn = bus::system_bus(&env).await?;
        Ok(Self::from_connection(conn, env))
    }

    /// A view with no bus connection at all; every enumeration is empty.
    pub fn offline(env: Environment) -> Self {
        Self::from_connection(None, env)
    }

    fn from_connection(conn: Option<Connection>, env: Environment) -> Self {
        let accessor = conn
            .clone()
            .map(|c| PropertyAccessor::new(c, ServiceEndpoint::network_manager()));
        Self {
            conn,
            accessor,
            env,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Whether a bus connection is available.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    pub(crate) fn try_accessor(&self) -> Option<&PropertyAccessor> {
        self.accessor.as_ref()
    }

    /// Overall connectivity state of the service. Image installs without
    /// a service report global connectivity.
    pub async fn connectivity_state(&self) -> Result<ConnectivityState> {
        device::connectivity_state(self).await
    }

    /// Names of all devices the installer supports, in enumeration order.
    pub async fn list_devices(&self) -> Result<Vec<String>> {
        device::list_devices(self).await
    }

    /// Names of all devices carrying an activated connection.
    pub async fn list_activated_devices(&self) -> Result<Vec<String>> {
        device::list_activated_devices(self).await
    }

    /// Raw value of a device property, resolved across the generic and
    /// type-specific device interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NetError::UnknownDevice`] if no device of that
    /// name exists and [`crate::NetError::PropertyNotFound`] if the
    /// property is absent on every resolvable interface.
    pub async fn device_property(&self, name: &str, property: &str) -> Result<OwnedValue> {
        device::device_property(self, name, property).await
    }

    pub async fn device_type(&self, name: &str) -> Result<DeviceType> {
        device::device_type(self, name).await
    }

    /// Whether the named device is of the given kind.
    pub async fn device_type_is(&self, name: &str, kind: DeviceType) -> Result<bool> {
        Ok(device::device_type(self, name).await? == kind)
    }

    pub async fn device_state(&self, name: &str) -> Result<DeviceState> {
        device::device_state(self, name).await
    }

    /// The currently programmed hardware address of the device.
    pub async fn device_hw_address(&self, name: &str) -> Result<String> {
        device::device_hw_address(self, name).await
    }

    /// The permanent hardware address, or `None` when the device does
    /// not report one.
    pub async fn device_perm_hw_address(&self, name: &str) -> Result<Option<String>> {
        device::device_perm_hw_address(self, name).await
    }

    /// The address identifying the device for configuration: permanent
    /// for wired and wireless NICs, current for everything else.
    pub async fn valid_hardware_address(&self, name: &str) -> Result<String> {
        device::valid_hardware_address(self, name).await
    }

    /// A fresh snapshot of the named device.
    pub async fn device_record(&self, name: &str) -> Result<DeviceRecord> {
        device::device_record(self, name).await
    }

    /// IP configuration of the device for one protocol version; empty
    /// unless the device is activated at query time.
    pub async fn ip_configuration(&self, name: &str, version: IpVersion) -> Result<IpConfig> {
        ip_config::ip_configuration(self, name, version).await
    }

    /// Just the configured address strings of the device.
    pub async fn ip_addresses(&self, name: &str, version: IpVersion) -> Result<Vec<String>> {
        ip_config::ip_addresses(self, name, version).await
    }

    /// NTP servers obtained from DHCPv4 leases of activated devices.
    pub async fn dhcp_ntp_servers(&self) -> Result<Vec<String>> {
        ip_config::dhcp_ntp_servers(self).await
    }

    /// Paths of stored profiles whose `section.key` setting equals
    /// `value`.
    pub async fn find_connections_by_setting(
        &self,
        value: &OwnedValue,
        section: &str,
        key: &str,
    ) -> Result<Vec<OwnedObjectPath>> {
        settings::find_connections_by_setting(self, value, section, key).await
    }

    /// Settings of every stored connection profile.
    pub async fn all_connection_settings(&self) -> Result<Vec<ConnectionSettings>> {
        settings::all_connection_settings(self).await
    }
}
