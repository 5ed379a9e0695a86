//! Tests for the property facade as seen through the public API.
//!
//! These drive the localization module's binding table the same way the
//! remote face does: get/set dispatch by property name, kind
//! enforcement, and the change-source to property-name mapping that
//! feeds the notification pump.

use instbus::{
    FacadeError, LocalizationModule, PropertyTable, PropertyValue, localization_bindings,
};

fn table_and_module() -> (PropertyTable<LocalizationModule>, LocalizationModule) {
    let module = LocalizationModule::new();
    let table = PropertyTable::new(localization_bindings(), &module)
        .expect("localization bindings must construct");
    (table, module)
}

#[test]
fn every_localization_property_is_writable() {
    let (table, mut module) = table_and_module();

    let writes = [
        ("Language", PropertyValue::Str("cs_CZ.UTF-8".into())),
        (
            "LanguageSupport",
            PropertyValue::StrList(vec!["cs_CZ.UTF-8".into(), "sk_SK.UTF-8".into()]),
        ),
        ("LanguageProvisioned", PropertyValue::Bool(true)),
        ("Keyboard", PropertyValue::Str("cz".into())),
        ("VirtualConsoleKeymap", PropertyValue::Str("cz-lat2".into())),
        (
            "XLayouts",
            PropertyValue::StrList(vec!["cz (qwerty)".into()]),
        ),
        (
            "LayoutSwitchOptions",
            PropertyValue::StrList(vec!["grp:alt_shift_toggle".into()]),
        ),
        ("KeyboardProvisioned", PropertyValue::Bool(true)),
    ];

    for (property, value) in writes {
        table.set(&mut module, property, value.clone()).unwrap();
        assert_eq!(table.get(&module, property).unwrap(), value);
    }
}

#[test]
fn set_produces_one_notification_naming_the_property() {
    let (table, mut module) = table_and_module();
    let mut changes = module.subscribe();

    table
        .set(
            &mut module,
            "VirtualConsoleKeymap",
            PropertyValue::Str("cz-lat2".into()),
        )
        .unwrap();

    let source = changes.try_recv().unwrap();
    assert_eq!(table.property_for_source(source), Some("VirtualConsoleKeymap"));
    assert!(changes.try_recv().is_err(), "only one notification per set");
}

#[test]
fn kind_enforcement_rejects_mismatched_writes() {
    let (table, mut module) = table_and_module();

    match table.set(&mut module, "Language", PropertyValue::Bool(true)) {
        Err(FacadeError::ValueKind { property, .. }) => assert_eq!(property, "Language"),
        other => panic!("expected ValueKind, got {other:?}"),
    }

    // A rejected write leaves the module untouched and makes no noise.
    let mut changes = module.subscribe();
    assert_eq!(
        table.get(&module, "Language").unwrap(),
        PropertyValue::Str(String::new())
    );
    assert!(changes.try_recv().is_err());
}

#[test]
fn unknown_properties_are_reported_by_name() {
    let (table, module) = table_and_module();
    match table.get(&module, "Timezone") {
        Err(FacadeError::UnknownProperty(p)) => assert_eq!(p, "Timezone"),
        other => panic!("expected UnknownProperty, got {other:?}"),
    }
}
