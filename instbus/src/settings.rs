//! Queries over the stored connection profiles.
//!
//! Profiles can be deleted by the service at any time, so a profile
//! whose settings fetch fails mid-walk is skipped rather than failing
//! the whole query.

use log::debug;
use zvariant::{OwnedObjectPath, OwnedValue};

use crate::Result;
use crate::network::NetworkState;
use crate::proxies::{ConnectionSettings, NMSettingsConnectionProxy, NMSettingsProxy};

async fn each_profile(
    net: &NetworkState,
) -> Result<Vec<(OwnedObjectPath, ConnectionSettings)>> {
    let Some(conn) = net.connection() else {
        return Ok(Vec::new());
    };

    let settings = NMSettingsProxy::new(conn).await?;
    let mut profiles = Vec::new();

    for path in settings.list_connections().await? {
        let profile = NMSettingsConnectionProxy::builder(conn)
            .path(path.clone())?
            .build()
            .await?;

        match profile.get_settings().await {
            Ok(s) => profiles.push((path, s)),
            Err(e) => {
                // The profile may be deleted concurrently by the service.
                debug!("skipping connection profile {path}: {e}");
            }
        }
    }

    Ok(profiles)
}

/// Paths of all profiles whose `section.key` setting equals `value`, in
/// the service's enumeration order.
pub(crate) async fn find_connections_by_setting(
    net: &NetworkState,
    value: &OwnedValue,
    section: &str,
    key: &str,
) -> Result<Vec<OwnedObjectPath>> {
    let mut matches = Vec::new();

    for (path, settings) in each_profile(net).await? {
        let Some(found) = settings.get(section).and_then(|s| s.get(key)) else {
            continue;
        };
        if found == value {
            matches.push(path);
        }
    }

    Ok(matches)
}

/// Settings of every stored profile, mostly useful for logging dumps.
pub(crate) async fn all_connection_settings(net: &NetworkState) -> Result<Vec<ConnectionSettings>> {
    Ok(each_profile(net)
        .await?
        .into_iter()
        .map(|(_, settings)| settings)
        .collect())
}
