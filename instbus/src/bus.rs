//! System bus connection setup.

use log::error;
use zbus::Connection;

use crate::Result;
use crate::config::Environment;
use crate::models::NetError;

/// Connects to the system bus.
///
/// Returns `Ok(None)` when the environment is known to run without a
/// system bus (minimal or offline install images); downstream queries
/// treat that as an empty service graph. In environments that promise a
/// bus, a connection failure is fatal.
pub async fn system_bus(env: &Environment) -> Result<Option<Connection>> {
    match Connection::system().await {
        Ok(conn) => Ok(Some(conn)),
        Err(e) => {
            if env.provides_system_bus {
                return Err(NetError::TransportUnavailable { source: Some(e) });
            }

            error!("system bus connection failed: {e}");
            Ok(None)
        }
    }
}
