//! D-Bus proxy traits.
//!
//! The `zbus::proxy` macro generates the client-side proxies. Only the
//! method surface lives here; property reads against NetworkManager
//! objects go through [`crate::accessor::PropertyAccessor`] instead,
//! because the owning interface is assembled per call.
//!
//! # Object layout
//!
//! - `/org/freedesktop/NetworkManager` - root service object
//! - `/org/freedesktop/NetworkManager/Settings` - connection profile store
//! - `/org/freedesktop/NetworkManager/Settings/*` - stored profiles
//! - `/org/instbus/Installer/Localization` - localization module
//! - `/org/instbus/Installer/Tasks/*` - started tasks

use std::collections::HashMap;
use zbus::proxy;
use zvariant::{OwnedObjectPath, OwnedValue};

/// Settings of one stored connection profile, keyed by section then key.
pub type ConnectionSettings = HashMap<String, HashMap<String, OwnedValue>>;

/// Proxy for the root NetworkManager object.
#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
pub trait NM {
    /// Returns paths to all network devices.
    fn get_devices(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    /// Resolves a device by its routed IP interface name.
    fn get_device_by_ip_iface(&self, iface: &str) -> zbus::Result<OwnedObjectPath>;
}

/// Proxy for the connection profile store.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager/Settings"
)]
pub trait NMSettings {
    /// Paths of all stored connection profiles.
    fn list_connections(&self) -> zbus::Result<Vec<OwnedObjectPath>>;
}

/// Proxy for one stored connection profile.
#[proxy(
    interface = "org.freedesktop.NetworkManager.Settings.Connection",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMSettingsConnection {
    /// The profile's settings, keyed by section then key.
    fn get_settings(&self) -> zbus::Result<ConnectionSettings>;
}

/// Proxy for the localization module of the installer service.
#[proxy(
    interface = "org.instbus.Installer.Localization",
    default_service = "org.instbus.Installer",
    default_path = "/org/instbus/Installer/Localization"
)]
pub trait Localization {
    /// The language the installed system will use.
    #[zbus(property)]
    fn language(&self) -> zbus::Result<String>;

    fn set_language(&self, language: &str) -> zbus::Result<()>;

    /// Languages for which support packages will be installed.
    #[zbus(property)]
    fn language_support(&self) -> zbus::Result<Vec<String>>;

    fn set_language_support(&self, language_support: Vec<String>) -> zbus::Result<()>;

    /// Whether the language came from a trusted provisioning source.
    #[zbus(property)]
    fn language_provisioned(&self) -> zbus::Result<bool>;

    fn set_language_provisioned(&self, provisioned: bool) -> zbus::Result<()>;

    /// Generic keyboard specification.
    #[zbus(property)]
    fn keyboard(&self) -> zbus::Result<String>;

    fn set_keyboard(&self, keyboard: &str) -> zbus::Result<()>;

    /// Virtual console keymap name.
    #[zbus(property)]
    fn virtual_console_keymap(&self) -> zbus::Result<String>;

    fn set_virtual_console_keymap(&self, keymap: &str) -> zbus::Result<()>;

    /// X layout specifications.
    #[zbus(property)]
    fn x_layouts(&self) -> zbus::Result<Vec<String>>;

    fn set_x_layouts(&self, layouts: Vec<String>) -> zbus::Result<()>;

    /// Options for switching between X layouts.
    #[zbus(property)]
    fn layout_switch_options(&self) -> zbus::Result<Vec<String>>;

    fn set_layout_switch_options(&self, options: Vec<String>) -> zbus::Result<()>;

    /// Whether the keyboard came from a trusted provisioning source.
    #[zbus(property)]
    fn keyboard_provisioned(&self) -> zbus::Result<bool>;

    fn set_keyboard_provisioned(&self, provisioned: bool) -> zbus::Result<()>;

    /// Starts installing language support into `sysroot`; returns the
    /// path of the task handle.
    fn install_language_with_task(&self, sysroot: &str) -> zbus::Result<OwnedObjectPath>;

    /// Emitted once per changed property, carrying only its name.
    #[zbus(signal)]
    fn property_changed(&self, name: String);
}

/// Proxy for a started task.
#[proxy(
    interface = "org.instbus.Installer.Task",
    default_service = "org.instbus.Installer"
)]
pub trait Task {
    /// Begins executing the task's work.
    fn start(&self) -> zbus::Result<()>;

    /// Returns the task's outcome; raises the task's failure if it
    /// failed, or `NotFinished` if called before completion.
    fn finish(&self) -> zbus::Result<()>;

    /// The single terminal event; no payload.
    #[zbus(signal)]
    fn finished(&self);
}
