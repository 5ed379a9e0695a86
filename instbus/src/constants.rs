//! Constants for the foreign NetworkManager service and the installer bus.
//!
//! These name the fixed service endpoints and the interface suffixes
//! appended to the NetworkManager base interface. The numeric state and
//! type codes of the service live as enums in [`crate::models`].

/// The foreign network-management service endpoint.
pub mod nm {
    /// Well-known bus name of the service.
    pub const SERVICE: &str = "org.freedesktop.NetworkManager";
    /// Root object of the service.
    pub const ROOT_PATH: &str = "/org/freedesktop/NetworkManager";
    /// Base interface name; suffixes below are appended to it.
    pub const BASE_INTERFACE: &str = "org.freedesktop.NetworkManager";
    /// Connection-profile store sub-object.
    pub const SETTINGS_PATH: &str = "/org/freedesktop/NetworkManager/Settings";
    /// Error name raised by `GetDeviceByIpIface` for unknown names.
    pub const UNKNOWN_DEVICE_ERROR: &str = "org.freedesktop.NetworkManager.UnknownDevice";
}

/// Interface suffixes addressing sub-aspects of NetworkManager objects.
pub mod suffix {
    pub const DEVICE: &str = ".Device";
    pub const ACTIVE_CONNECTION: &str = ".Connection.Active";
    pub const IP4_CONFIG: &str = ".IP4Config";
    pub const IP6_CONFIG: &str = ".IP6Config";
    pub const DHCP4_CONFIG: &str = ".DHCP4Config";
    pub const SETTINGS_CONNECTION: &str = ".Settings.Connection";

    /// Namespace of the device-subtype interfaces.
    pub const DEVICE_SUBTYPE_PREFIX: &str = "org.freedesktop.NetworkManager.Device.";
    /// Statistics sub-interface, skipped by the subtype lookup.
    pub const DEVICE_STATISTICS: &str = "org.freedesktop.NetworkManager.Device.Statistics";
}

/// Generic D-Bus interfaces and error names used for property access.
pub mod dbus {
    pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";
    pub const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";

    pub const ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";
    pub const INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";
    pub const UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";
}

/// The installer module service.
pub mod installer {
    /// Well-known bus name claimed by the module service.
    pub const SERVICE: &str = "org.instbus.Installer";
    /// Localization module object.
    pub const LOCALIZATION_PATH: &str = "/org/instbus/Installer/Localization";
    /// Localization module interface.
    pub const LOCALIZATION_INTERFACE: &str = "org.instbus.Installer.Localization";
    /// Prefix under which task objects are registered.
    pub const TASKS_PATH_PREFIX: &str = "/org/instbus/Installer/Tasks";
    /// Task interface.
    pub const TASK_INTERFACE: &str = "org.instbus.Installer.Task";
}
