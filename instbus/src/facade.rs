//! Generic machinery for exposing a module's fields as remote properties.
//!
//! A module's remote face is described by a statically declared binding
//! table: one entry per remote property naming its value kind, a getter,
//! an optional setter and the implementation-side change source it is
//! driven by. The table is checked once at construction; after that it
//! only dispatches by name and maps change sources back to property
//! names for the change-notification pump.

use std::fmt::{Display, Formatter};
use thiserror::Error;
use tokio::sync::broadcast;

/// Buffered change events per subscriber before the hub starts lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// The value kinds a remote property can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Str,
    Bool,
    StrList,
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str => write!(f, "string"),
            Self::Bool => write!(f, "boolean"),
            Self::StrList => write!(f, "string list"),
        }
    }
}

/// A property value in transit between a module and its remote face.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Str(String),
    Bool(bool),
    StrList(Vec<String>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Str(_) => PropertyKind::Str,
            Self::Bool(_) => PropertyKind::Bool,
            Self::StrList(_) => PropertyKind::StrList,
        }
    }
}

/// Reads a property value out of a module.
pub type Getter<M> = fn(&M) -> PropertyValue;

/// Writes a kind-checked property value into a module. The table
/// verifies the kind before calling, so setters may destructure with
/// `if let`.
pub type Setter<M> = fn(&mut M, PropertyValue);

/// One remote property of a module: its name, value kind, accessors and
/// the implementation change source that announces it.
#[derive(Debug)]
pub struct PropertyBinding<M> {
    pub property: &'static str,
    pub kind: PropertyKind,
    pub source: &'static str,
    pub get: Getter<M>,
    pub set: Option<Setter<M>>,
}

/// Errors of the binding table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FacadeError {
    #[error("duplicate property binding: {0}")]
    DuplicateProperty(String),

    #[error("duplicate change source: {0}")]
    DuplicateSource(String),

    #[error("property {property} is declared {declared} but its getter returns {actual}")]
    KindMismatch {
        property: String,
        declared: PropertyKind,
        actual: PropertyKind,
    },

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("property is read-only: {0}")]
    ReadOnly(String),

    #[error("property {property} expects a {expected}, got a {actual}")]
    ValueKind {
        property: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },
}

/// The checked binding table of one module facade.
///
/// Built once at facade construction and never mutated afterwards.
#[derive(Debug)]
pub struct PropertyTable<M> {
    bindings: Vec<PropertyBinding<M>>,
}

impl<M> PropertyTable<M> {
    /// Checks and freezes a binding table.
    ///
    /// Rejects duplicate property names, duplicate change sources, and
    /// bindings whose getter (probed against `module`) returns a
    /// different kind than declared.
    pub fn new(bindings: Vec<PropertyBinding<M>>, module: &M) -> Result<Self, FacadeError> {
        for (i, binding) in bindings.iter().enumerate() {
            if bindings[..i].iter().any(|b| b.property == binding.property) {
                return Err(FacadeError::DuplicateProperty(binding.property.to_owned()));
            }
            if bindings[..i].iter().any(|b| b.source == binding.source) {
                return Err(FacadeError::DuplicateSource(binding.source.to_owned()));
            }

            let actual = (binding.get)(module).kind();
            if actual != binding.kind {
                return Err(FacadeError::KindMismatch {
                    property: binding.property.to_owned(),
                    declared: binding.kind,
                    actual,
                });
            }
        }

        Ok(Self { bindings })
    }

    fn binding(&self, property: &str) -> Result<&PropertyBinding<M>, FacadeError> {
        self.bindings
            .iter()
            .find(|b| b.property == property)
            .ok_or_else(|| FacadeError::UnknownProperty(property.to_owned()))
    }

    /// Reads a property by its remote name.
    pub fn get(&self, module: &M, property: &str) -> Result<PropertyValue, FacadeError> {
        Ok((self.binding(property)?.get)(module))
    }

    /// Writes a property by its remote name, enforcing its value kind.
    pub fn set(
        &self,
        module: &mut M,
        property: &str,
        value: PropertyValue,
    ) -> Result<(), FacadeError> {
        let binding = self.binding(property)?;
        let set = binding
            .set
            .ok_or_else(|| FacadeError::ReadOnly(property.to_owned()))?;

        if value.kind() != binding.kind {
            return Err(FacadeError::ValueKind {
                property: property.to_owned(),
                expected: binding.kind,
                actual: value.kind(),
            });
        }

        set(module, value);
        Ok(())
    }

    /// The remote property announced by an implementation change source.
    pub fn property_for_source(&self, source: &str) -> Option<&'static str> {
        self.bindings
            .iter()
            .find(|b| b.source == source)
            .map(|b| b.property)
    }

    /// All bound property names, in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.iter().map(|b| b.property)
    }
}

/// Fan-out of implementation change notifications.
///
/// A module owns one hub and signals a source name from every setter;
/// the facade's pump subscribes and republishes each event as a remote
/// property-changed notification.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<&'static str>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Announces a change; a hub without subscribers drops the event.
    pub fn notify(&self, source: &'static str) {
        let _ = self.tx.send(source);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<&'static str> {
        self.tx.subscribe()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Toy {
        name: String,
        ready: bool,
        tags: Vec<String>,
    }

    fn toy() -> Toy {
        Toy {
            name: "toy".into(),
            ready: false,
            tags: vec![],
        }
    }

    fn bindings() -> Vec<PropertyBinding<Toy>> {
        vec![
            PropertyBinding {
                property: "Name",
                kind: PropertyKind::Str,
                source: "name",
                get: |m| PropertyValue::Str(m.name.clone()),
                set: Some(|m, v| {
                    if let PropertyValue::Str(s) = v {
                        m.name = s;
                    }
                }),
            },
            PropertyBinding {
                property: "Ready",
                kind: PropertyKind::Bool,
                source: "ready",
                get: |m| PropertyValue::Bool(m.ready),
                set: None,
            },
            PropertyBinding {
                property: "Tags",
                kind: PropertyKind::StrList,
                source: "tags",
                get: |m| PropertyValue::StrList(m.tags.clone()),
                set: Some(|m, v| {
                    if let PropertyValue::StrList(t) = v {
                        m.tags = t;
                    }
                }),
            },
        ]
    }

    #[test]
    fn construction_accepts_a_clean_table() {
        let table = PropertyTable::new(bindings(), &toy()).unwrap();
        assert_eq!(
            table.properties().collect::<Vec<_>>(),
            vec!["Name", "Ready", "Tags"]
        );
    }

    #[test]
    fn construction_rejects_duplicate_property() {
        let mut b = bindings();
        b[1].property = "Name";
        match PropertyTable::new(b, &toy()) {
            Err(FacadeError::DuplicateProperty(p)) => assert_eq!(p, "Name"),
            other => panic!("expected DuplicateProperty, got {other:?}"),
        }
    }

    #[test]
    fn construction_rejects_duplicate_source() {
        let mut b = bindings();
        b[2].source = "name";
        match PropertyTable::new(b, &toy()) {
            Err(FacadeError::DuplicateSource(s)) => assert_eq!(s, "name"),
            other => panic!("expected DuplicateSource, got {other:?}"),
        }
    }

    #[test]
    fn construction_rejects_kind_mismatch() {
        let mut b = bindings();
        b[0].kind = PropertyKind::Bool;
        match PropertyTable::new(b, &toy()) {
            Err(FacadeError::KindMismatch {
                property,
                declared,
                actual,
            }) => {
                assert_eq!(property, "Name");
                assert_eq!(declared, PropertyKind::Bool);
                assert_eq!(actual, PropertyKind::Str);
            }
            other => panic!("expected KindMismatch, got {other:?}"),
        }
    }

    #[test]
    fn get_and_set_dispatch_by_name() {
        let table = PropertyTable::new(bindings(), &toy()).unwrap();
        let mut module = toy();

        table
            .set(&mut module, "Name", PropertyValue::Str("other".into()))
            .unwrap();
        assert_eq!(
            table.get(&module, "Name").unwrap(),
            PropertyValue::Str("other".into())
        );

        assert_eq!(
            table.get(&module, "Ready").unwrap(),
            PropertyValue::Bool(false)
        );
    }

    #[test]
    fn set_enforces_kind_and_mutability() {
        let table = PropertyTable::new(bindings(), &toy()).unwrap();
        let mut module = toy();

        match table.set(&mut module, "Ready", PropertyValue::Bool(true)) {
            Err(FacadeError::ReadOnly(p)) => assert_eq!(p, "Ready"),
            other => panic!("expected ReadOnly, got {other:?}"),
        }

        match table.set(&mut module, "Name", PropertyValue::Bool(true)) {
            Err(FacadeError::ValueKind { property, .. }) => assert_eq!(property, "Name"),
            other => panic!("expected ValueKind, got {other:?}"),
        }

        match table.get(&module, "Nope") {
            Err(FacadeError::UnknownProperty(p)) => assert_eq!(p, "Nope"),
            other => panic!("expected UnknownProperty, got {other:?}"),
        }
    }

    #[test]
    fn source_maps_back_to_property() {
        let table = PropertyTable::new(bindings(), &toy()).unwrap();
        assert_eq!(table.property_for_source("tags"), Some("Tags"));
        assert_eq!(table.property_for_source("nope"), None);
    }

    #[tokio::test]
    async fn hub_fans_out_to_subscribers() {
        let hub = ChangeHub::new();

        // Without subscribers the event is dropped, not an error.
        hub.notify("name");

        let mut rx = hub.subscribe();
        hub.notify("tags");
        assert_eq!(rx.recv().await.unwrap(), "tags");
        assert!(rx.try_recv().is_err());
    }
}
