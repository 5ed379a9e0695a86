//! Execution-environment description threaded through the bus layer.

/// What kind of installation environment the process runs in.
///
/// Passed explicitly to every constructor that cares, so behavior never
/// depends on process-global configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    /// Whether a system bus is expected to exist. When `false`, a failed
    /// bus connection degrades to an empty service graph instead of an
    /// error.
    pub provides_system_bus: bool,
    /// Whether the installation target is real hardware. Image and
    /// directory installs assume the network is already up.
    pub is_hardware: bool,
}

impl Environment {
    /// A regular installation on real hardware with a system bus.
    pub fn hardware() -> Self {
        Self {
            provides_system_bus: true,
            is_hardware: true,
        }
    }

    /// A minimal image or directory install: no system bus, no hardware
    /// to configure.
    pub fn image() -> Self {
        Self {
            provides_system_bus: false,
            is_hardware: false,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::hardware()
    }
}
