//! Property access against remote objects of a foreign service.
//!
//! The foreign service spreads one object's attributes over several
//! interfaces that share a common base name, so properties are fetched
//! through the generic `org.freedesktop.DBus.Properties` interface with
//! the target interface assembled from the endpoint's base name plus a
//! suffix. Failure classification matters more than the happy path here:
//! a denied or unknown property means "not set", while a missing `Get`
//! method means the object itself is gone.

use log::debug;
use zbus::Connection;
use zvariant::{OwnedValue, Value};

use crate::Result;
use crate::constants::{dbus, nm};
use crate::models::NetError;

/// Identity of a remote service: well-known name, root object and the
/// base interface that suffixes are appended to. Immutable once built.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    name: String,
    root_path: String,
    base_interface: String,
}

impl ServiceEndpoint {
    pub fn new(
        name: impl Into<String>,
        root_path: impl Into<String>,
        base_interface: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            base_interface: base_interface.into(),
        }
    }

    /// The NetworkManager service endpoint.
    pub fn network_manager() -> Self {
        Self::new(nm::SERVICE, nm::ROOT_PATH, nm::BASE_INTERFACE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Full interface name for a suffix; the empty suffix addresses the
    /// base interface itself.
    pub fn interface_for(&self, suffix: &str) -> String {
        format!("{}{}", self.base_interface, suffix)
    }
}

/// Result of a property lookup that did not fail outright.
///
/// `Absent` is a normal outcome ("not set"), distinct from any value the
/// property could hold, including empty lists and empty strings.
#[derive(Debug)]
pub enum Lookup {
    Value(OwnedValue),
    Absent,
}

impl Lookup {
    pub fn into_option(self) -> Option<OwnedValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// How a failed property call is to be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// Property is not set on this interface; not an error.
    Absent,
    /// The object does not answer `Get` at all; it most likely vanished.
    Unsupported,
    /// Genuine transport failure.
    Transport,
}

fn classify_error_name(name: &str) -> FailureKind {
    match name {
        dbus::ACCESS_DENIED | dbus::INVALID_ARGS => FailureKind::Absent,
        dbus::UNKNOWN_METHOD => FailureKind::Unsupported,
        _ => FailureKind::Transport,
    }
}

pub(crate) fn method_error_name(err: &zbus::Error) -> Option<&str> {
    match err {
        zbus::Error::MethodError(name, _, _) => Some(name.as_str()),
        _ => None,
    }
}

/// Converts an [`OwnedValue`] into a concrete type, mapping conversion
/// failures to [`NetError::ValueType`].
pub(crate) fn convert<T>(value: OwnedValue) -> Result<T>
where
    T: TryFrom<OwnedValue>,
    T::Error: Into<zvariant::Error>,
{
    T::try_from(value).map_err(|e| NetError::ValueType(e.into()))
}

/// Reads and writes properties of a foreign service's objects by name.
#[derive(Debug, Clone)]
pub struct PropertyAccessor {
    conn: Connection,
    endpoint: ServiceEndpoint,
}

impl PropertyAccessor {
    pub fn new(conn: Connection, endpoint: ServiceEndpoint) -> Self {
        Self { conn, endpoint }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Builds a dynamic proxy on the endpoint's service with property
    /// caching and signal delivery left off; every access is a fresh
    /// round trip.
    pub(crate) async fn proxy(&self, path: &str, interface: &str) -> Result<zbus::Proxy<'_>> {
        Ok(zbus::proxy::Builder::new(&self.conn)
            .destination(self.endpoint.name.as_str())?
            .path(path.to_owned())?
            .interface(interface.to_owned())?
            .cache_properties(zbus::proxy::CacheProperties::No)
            .build()
            .await?)
    }

    /// Reads a property of the object at `path` on the interface named by
    /// `interface_suffix`.
    ///
    /// Permission-denied and invalid-argument replies map to
    /// [`Lookup::Absent`]; an unknown-method reply becomes
    /// [`NetError::UnsupportedObject`]; other failures propagate.
    pub async fn get(&self, path: &str, property: &str, interface_suffix: &str) -> Result<Lookup> {
        let interface = self.endpoint.interface_for(interface_suffix);
        let proxy = self.proxy(path, dbus::PROPERTIES_INTERFACE).await?;

        let reply = match proxy
            .call_method("Get", &(interface.as_str(), property))
            .await
        {
            Ok(reply) => reply,
            Err(e) => return self.failed(path, property, e).map(|()| Lookup::Absent),
        };

        let body = reply.body();
        let value: Value<'_> = body.deserialize()?;
        Ok(Lookup::Value(value.try_to_owned()?))
    }

    /// Writes a property of the object at `path`.
    ///
    /// The same failure classification as [`PropertyAccessor::get`]
    /// applies; an "absent" outcome reports whether the write took.
    pub async fn set(
        &self,
        path: &str,
        property: &str,
        interface_suffix: &str,
        value: Value<'_>,
    ) -> Result<bool> {
        let interface = self.endpoint.interface_for(interface_suffix);
        let proxy = self.proxy(path, dbus::PROPERTIES_INTERFACE).await?;

        match proxy
            .call_method("Set", &(interface.as_str(), property, value))
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => self.failed(path, property, e).map(|()| false),
        }
    }

    /// Names of the interfaces the object at `path` currently supports.
    pub async fn object_interfaces(&self, path: &str) -> Result<Vec<String>> {
        let proxy = self.proxy(path, dbus::INTROSPECTABLE_INTERFACE).await?;

        let reply = match proxy.call_method("Introspect", &()).await {
            Ok(reply) => reply,
            Err(e) => {
                if method_error_name(&e).map(classify_error_name)
                    == Some(FailureKind::Unsupported)
                {
                    return Err(NetError::UnsupportedObject(path.to_owned()));
                }
                return Err(e.into());
            }
        };

        let xml: String = reply.body().deserialize()?;
        let node = zbus_xml::Node::from_reader(xml.as_bytes())
            .map_err(|e| NetError::Introspection(e.to_string()))?;
        Ok(node
            .interfaces()
            .iter()
            .map(|iface| iface.name().to_string())
            .collect())
    }

    fn failed(&self, path: &str, property: &str, err: zbus::Error) -> Result<()> {
        match method_error_name(&err).map(classify_error_name) {
            Some(FailureKind::Absent) => {
                debug!("property {property} absent on {path}");
                Ok(())
            }
            Some(FailureKind::Unsupported) => Err(NetError::UnsupportedObject(path.to_owned())),
            _ => Err(err.into()),
        }
    }
}
