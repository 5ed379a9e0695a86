//! Installer configuration modules over D-Bus, plus a query proxy for
//! NetworkManager.
//!
//! This crate provides the two halves of the installer's bus layer:
//!
//! - A read-only query interface to the running NetworkManager service:
//!   device enumeration, per-device properties with type-specific
//!   interface fallback, IP configuration snapshots, DHCP-provided NTP
//!   servers and stored connection profiles
//! - A property facade for installer modules: a module's fields become
//!   named remote properties with per-property change notification, and
//!   long-running work is handed out as remotely watchable task objects
//!
//! # Example
//!
//! ```no_run
//! use instbus::{Environment, IpVersion, NetworkState};
//!
//! # async fn example() -> instbus::Result<()> {
//! let net = NetworkState::connect(Environment::hardware()).await?;
//!
//! for name in net.list_devices().await? {
//!     let config = net.ip_configuration(&name, IpVersion::V4).await?;
//!     println!("{name}: {} addresses", config.addresses.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Queries return `Result<T, NetError>`. Lookups distinguish a missing
//! device (`UnknownDevice`) from a missing property (`PropertyNotFound`).
//! Races with the service, such as objects vanishing mid-query or devices
//! deactivating between two fetches, are absorbed into empty results
//! rather than surfaced as errors.
//!
//! # Offline operation
//!
//! Minimal install images run without a system bus. Constructed with an
//! [`Environment`] that does not promise one, [`NetworkState`] degrades
//! to an empty service graph instead of failing.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade. Add an
//! implementation such as `env_logger` to see output.

// Internal implementation modules
mod bus;
mod device;
mod ip_config;
mod settings;

// Public API modules
pub mod accessor;
pub mod address;
pub mod config;
pub mod constants;
pub mod facade;
pub mod localization;
pub mod models;
pub mod network;
pub mod proxies;
pub mod task;

// Re-exported public API
pub use accessor::{Lookup, PropertyAccessor, ServiceEndpoint};
pub use config::Environment;
pub use facade::{FacadeError, PropertyBinding, PropertyKind, PropertyTable, PropertyValue};
pub use localization::{LocalizationModule, localization_bindings, serve as serve_localization};
pub use models::{
    ActiveConnectionState, ConnectivityState, DeviceRecord, DeviceState, DeviceType, IpAddress,
    IpConfig, IpVersion, NetError,
};
pub use network::NetworkState;
pub use task::{TaskError, TaskFailure, async_run_task, register_task};

/// A specialized `Result` type for bus and network operations.
pub type Result<T> = std::result::Result<T, NetError>;
