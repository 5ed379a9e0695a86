//! The localization module and its remote face.
//!
//! The module itself is plain state: language and keyboard settings plus
//! the flags recording whether they came from a trusted provisioning
//! source. Its remote face republishes every field as a D-Bus property
//! through the binding table in [`localization_bindings`], forwards the
//! `SetX` methods to the module, and announces each implementation
//! change as a single `PropertyChanged` signal carrying the property
//! name.

use log::{debug, info, warn};
use std::path::Path;
use tokio::sync::broadcast;
use zbus::object_server::SignalEmitter;
use zbus::{Connection, ObjectServer, fdo, interface};
use zvariant::OwnedObjectPath;

use crate::constants::installer;
use crate::facade::{ChangeHub, PropertyBinding, PropertyKind, PropertyTable, PropertyValue};
use crate::task::{self, TaskFailure, TaskWork};

/// Implementation-side change sources, one per field.
pub mod change {
    pub const LANGUAGE: &str = "language";
    pub const LANGUAGE_SUPPORT: &str = "language_support";
    pub const LANGUAGE_PROVISIONED: &str = "language_provisioned";
    pub const KEYBOARD: &str = "keyboard";
    pub const VC_KEYMAP: &str = "vc_keymap";
    pub const X_LAYOUTS: &str = "x_layouts";
    pub const SWITCH_OPTIONS: &str = "switch_options";
    pub const KEYBOARD_PROVISIONED: &str = "keyboard_provisioned";
}

/// In-process implementation of the localization module.
///
/// Every setter stores the value and signals its own change source;
/// setting a value never touches its companion provisioned flag.
#[derive(Debug, Default)]
pub struct LocalizationModule {
    language: String,
    language_support: Vec<String>,
    language_provisioned: bool,
    keyboard: String,
    vc_keymap: String,
    x_layouts: Vec<String>,
    switch_options: Vec<String>,
    keyboard_provisioned: bool,
    changes: ChangeHub,
}

impl LocalizationModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the module's change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<&'static str> {
        self.changes.subscribe()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: String) {
        self.language = language;
        self.changes.notify(change::LANGUAGE);
    }

    pub fn language_support(&self) -> &[String] {
        &self.language_support
    }

    pub fn set_language_support(&mut self, language_support: Vec<String>) {
        self.language_support = language_support;
        self.changes.notify(change::LANGUAGE_SUPPORT);
    }

    pub fn language_provisioned(&self) -> bool {
        self.language_provisioned
    }

    pub fn set_language_provisioned(&mut self, provisioned: bool) {
        self.language_provisioned = provisioned;
        self.changes.notify(change::LANGUAGE_PROVISIONED);
    }

    pub fn keyboard(&self) -> &str {
        &self.keyboard
    }

    pub fn set_keyboard(&mut self, keyboard: String) {
        self.keyboard = keyboard;
        self.changes.notify(change::KEYBOARD);
    }

    pub fn vc_keymap(&self) -> &str {
        &self.vc_keymap
    }

    pub fn set_vc_keymap(&mut self, vc_keymap: String) {
        self.vc_keymap = vc_keymap;
        self.changes.notify(change::VC_KEYMAP);
    }

    pub fn x_layouts(&self) -> &[String] {
        &self.x_layouts
    }

    pub fn set_x_layouts(&mut self, x_layouts: Vec<String>) {
        self.x_layouts = x_layouts;
        self.changes.notify(change::X_LAYOUTS);
    }

    pub fn switch_options(&self) -> &[String] {
        &self.switch_options
    }

    pub fn set_switch_options(&mut self, switch_options: Vec<String>) {
        self.switch_options = switch_options;
        self.changes.notify(change::SWITCH_OPTIONS);
    }

    pub fn keyboard_provisioned(&self) -> bool {
        self.keyboard_provisioned
    }

    pub fn set_keyboard_provisioned(&mut self, provisioned: bool) {
        self.keyboard_provisioned = provisioned;
        self.changes.notify(change::KEYBOARD_PROVISIONED);
    }
}

/// The module's remote property surface.
pub fn localization_bindings() -> Vec<PropertyBinding<LocalizationModule>> {
    vec![
        PropertyBinding {
            property: "Language",
            kind: PropertyKind::Str,
            source: change::LANGUAGE,
            get: |m| PropertyValue::Str(m.language.clone()),
            set: Some(|m, v| {
                if let PropertyValue::Str(s) = v {
                    m.set_language(s);
                }
            }),
        },
        PropertyBinding {
            property: "LanguageSupport",
            kind: PropertyKind::StrList,
            source: change::LANGUAGE_SUPPORT,
            get: |m| PropertyValue::StrList(m.language_support.clone()),
            set: Some(|m, v| {
                if let PropertyValue::StrList(l) = v {
                    m.set_language_support(l);
                }
            }),
        },
        PropertyBinding {
            property: "LanguageProvisioned",
            kind: PropertyKind::Bool,
            source: change::LANGUAGE_PROVISIONED,
            get: |m| PropertyValue::Bool(m.language_provisioned),
            set: Some(|m, v| {
                if let PropertyValue::Bool(b) = v {
                    m.set_language_provisioned(b);
                }
            }),
        },
        PropertyBinding {
            property: "Keyboard",
            kind: PropertyKind::Str,
            source: change::KEYBOARD,
            get: |m| PropertyValue::Str(m.keyboard.clone()),
            set: Some(|m, v| {
                if let PropertyValue::Str(s) = v {
                    m.set_keyboard(s);
                }
            }),
        },
        PropertyBinding {
            property: "VirtualConsoleKeymap",
            kind: PropertyKind::Str,
            source: change::VC_KEYMAP,
            get: |m| PropertyValue::Str(m.vc_keymap.clone()),
            set: Some(|m, v| {
                if let PropertyValue::Str(s) = v {
                    m.set_vc_keymap(s);
                }
            }),
        },
        PropertyBinding {
            property: "XLayouts",
            kind: PropertyKind::StrList,
            source: change::X_LAYOUTS,
            get: |m| PropertyValue::StrList(m.x_layouts.clone()),
            set: Some(|m, v| {
                if let PropertyValue::StrList(l) = v {
                    m.set_x_layouts(l);
                }
            }),
        },
        PropertyBinding {
            property: "LayoutSwitchOptions",
            kind: PropertyKind::StrList,
            source: change::SWITCH_OPTIONS,
            get: |m| PropertyValue::StrList(m.switch_options.clone()),
            set: Some(|m, v| {
                if let PropertyValue::StrList(l) = v {
                    m.set_switch_options(l);
                }
            }),
        },
        PropertyBinding {
            property: "KeyboardProvisioned",
            kind: PropertyKind::Bool,
            source: change::KEYBOARD_PROVISIONED,
            get: |m| PropertyValue::Bool(m.keyboard_provisioned),
            set: Some(|m, v| {
                if let PropertyValue::Bool(b) = v {
                    m.set_keyboard_provisioned(b);
                }
            }),
        },
    ]
}

/// Remote face of the localization module.
pub struct LocalizationInterface {
    module: LocalizationModule,
}

#[interface(name = "org.instbus.Installer.Localization")]
impl LocalizationInterface {
    /// The language the installed system will use.
    #[zbus(property)]
    fn language(&self) -> String {
        self.module.language().to_owned()
    }

    /// Sets the language used during installation and as the default of
    /// the installed system. The value is a language ID in `$LANG` form.
    fn set_language(&mut self, language: String) {
        self.module.set_language(language);
    }

    /// Languages for which support packages will be installed.
    #[zbus(property)]
    fn language_support(&self) -> Vec<String> {
        self.module.language_support().to_vec()
    }

    fn set_language_support(&mut self, language_support: Vec<String>) {
        self.module.set_language_support(language_support);
    }

    /// Whether the language came from a trusted provisioning source.
    #[zbus(property)]
    fn language_provisioned(&self) -> bool {
        self.module.language_provisioned()
    }

    fn set_language_provisioned(&mut self, provisioned: bool) {
        self.module.set_language_provisioned(provisioned);
    }

    /// Generic keyboard specification: either a console keymap or an X
    /// layout. Prefer the specific properties.
    #[zbus(property)]
    fn keyboard(&self) -> String {
        self.module.keyboard().to_owned()
    }

    fn set_keyboard(&mut self, keyboard: String) {
        self.module.set_keyboard(keyboard);
    }

    /// Virtual console keymap name.
    #[zbus(property)]
    fn virtual_console_keymap(&self) -> String {
        self.module.vc_keymap().to_owned()
    }

    fn set_virtual_console_keymap(&mut self, keymap: String) {
        self.module.set_vc_keymap(keymap);
    }

    /// X layout specifications, in `layout` or `layout (variant)` form.
    #[zbus(property)]
    fn x_layouts(&self) -> Vec<String> {
        self.module.x_layouts().to_vec()
    }

    fn set_x_layouts(&mut self, layouts: Vec<String>) {
        self.module.set_x_layouts(layouts);
    }

    /// Options for switching between X layouts.
    #[zbus(property)]
    fn layout_switch_options(&self) -> Vec<String> {
        self.module.switch_options().to_vec()
    }

    fn set_layout_switch_options(&mut self, options: Vec<String>) {
        self.module.set_switch_options(options);
    }

    /// Whether the keyboard came from a trusted provisioning source.
    #[zbus(property)]
    fn keyboard_provisioned(&self) -> bool {
        self.module.keyboard_provisioned()
    }

    fn set_keyboard_provisioned(&mut self, provisioned: bool) {
        self.module.set_keyboard_provisioned(provisioned);
    }

    /// Registers a task installing support for the selected language
    /// into `sysroot` and returns its handle path unchanged.
    async fn install_language_with_task(
        &self,
        sysroot: String,
        #[zbus(object_server)] server: &ObjectServer,
    ) -> fdo::Result<OwnedObjectPath> {
        let work = install_language_work(self.module.language().to_owned(), sysroot);
        task::register_task(server, work)
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    /// Announces one changed property by name. Carries no value; callers
    /// re-fetch on demand.
    #[zbus(signal)]
    async fn property_changed(emitter: &SignalEmitter<'_>, name: &str) -> zbus::Result<()>;
}

fn install_language_work(language: String, sysroot: String) -> TaskWork {
    Box::pin(async move {
        if language.is_empty() {
            return Err(TaskFailure::Discovery("no language is selected".into()));
        }

        let root = Path::new(&sysroot);
        if !root.is_dir() {
            return Err(TaskFailure::Discovery(format!(
                "installation root {sysroot} does not exist"
            )));
        }

        info!("installing language support for {language} into {sysroot}");
        Ok(())
    })
}

/// Publishes the localization module on `connection` and starts the
/// change pump that turns implementation notifications into
/// `PropertyChanged` signals.
pub async fn serve(connection: &Connection, module: LocalizationModule) -> zbus::Result<()> {
    let table = PropertyTable::new(localization_bindings(), &module)
        .map_err(|e| zbus::Error::Failure(e.to_string()))?;
    let changes = module.subscribe();

    connection
        .object_server()
        .at(installer::LOCALIZATION_PATH, LocalizationInterface { module })
        .await?;

    let emitter = SignalEmitter::new(connection, installer::LOCALIZATION_PATH)?;
    tokio::spawn(change_pump(emitter, table, changes));

    Ok(())
}

async fn change_pump(
    emitter: SignalEmitter<'static>,
    table: PropertyTable<LocalizationModule>,
    mut changes: broadcast::Receiver<&'static str>,
) {
    loop {
        match changes.recv().await {
            Ok(source) => {
                let Some(property) = table.property_for_source(source) else {
                    debug!("change source {source} has no bound property");
                    continue;
                };
                if let Err(e) = LocalizationInterface::property_changed(&emitter, property).await {
                    warn!("could not announce change of {property}: {e}");
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("change pump lagged, {missed} notifications dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_table_is_well_formed() {
        let module = LocalizationModule::new();
        let table = PropertyTable::new(localization_bindings(), &module).unwrap();

        assert_eq!(
            table.properties().collect::<Vec<_>>(),
            vec![
                "Language",
                "LanguageSupport",
                "LanguageProvisioned",
                "Keyboard",
                "VirtualConsoleKeymap",
                "XLayouts",
                "LayoutSwitchOptions",
                "KeyboardProvisioned",
            ]
        );
    }

    #[test]
    fn set_then_get_with_exactly_one_notification() {
        let mut module = LocalizationModule::new();
        let table = PropertyTable::new(localization_bindings(), &module).unwrap();
        let mut changes = module.subscribe();

        table
            .set(
                &mut module,
                "Language",
                PropertyValue::Str("cs_CZ.UTF-8".into()),
            )
            .unwrap();

        assert_eq!(
            table.get(&module, "Language").unwrap(),
            PropertyValue::Str("cs_CZ.UTF-8".into())
        );
        assert_eq!(
            table.property_for_source(changes.try_recv().unwrap()),
            Some("Language")
        );
        // Exactly one notification per set.
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn provisioned_flags_are_independent_of_their_values() {
        let mut module = LocalizationModule::new();
        let table = PropertyTable::new(localization_bindings(), &module).unwrap();

        table
            .set(
                &mut module,
                "Language",
                PropertyValue::Str("cs_CZ.UTF-8".into()),
            )
            .unwrap();
        assert_eq!(
            table.get(&module, "LanguageProvisioned").unwrap(),
            PropertyValue::Bool(false)
        );

        table
            .set(&mut module, "KeyboardProvisioned", PropertyValue::Bool(true))
            .unwrap();
        assert_eq!(
            table.get(&module, "Keyboard").unwrap(),
            PropertyValue::Str(String::new())
        );
        assert_eq!(
            table.get(&module, "KeyboardProvisioned").unwrap(),
            PropertyValue::Bool(true)
        );
    }

    #[test]
    fn every_setter_signals_its_own_source() {
        let mut module = LocalizationModule::new();
        let mut changes = module.subscribe();

        module.set_language("en_US.UTF-8".into());
        module.set_language_support(vec!["en_US.UTF-8".into()]);
        module.set_language_provisioned(true);
        module.set_keyboard("us".into());
        module.set_vc_keymap("us".into());
        module.set_x_layouts(vec!["us".into(), "cz (qwerty)".into()]);
        module.set_switch_options(vec!["grp:alt_shift_toggle".into()]);
        module.set_keyboard_provisioned(true);

        let expected = [
            change::LANGUAGE,
            change::LANGUAGE_SUPPORT,
            change::LANGUAGE_PROVISIONED,
            change::KEYBOARD,
            change::VC_KEYMAP,
            change::X_LAYOUTS,
            change::SWITCH_OPTIONS,
            change::KEYBOARD_PROVISIONED,
        ];
        for source in expected {
            assert_eq!(changes.try_recv().unwrap(), source);
        }
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn install_work_requires_a_language() {
        let outcome = install_language_work(String::new(), "/".into()).await;
        assert_eq!(
            outcome,
            Err(TaskFailure::Discovery("no language is selected".into()))
        );
    }

    #[tokio::test]
    async fn install_work_requires_an_existing_root() {
        let outcome =
            install_language_work("cs_CZ.UTF-8".into(), "/definitely/not/here".into()).await;
        assert!(matches!(outcome, Err(TaskFailure::Discovery(_))));
    }

    #[tokio::test]
    async fn install_work_succeeds_with_a_valid_root() {
        let outcome = install_language_work("cs_CZ.UTF-8".into(), "/".into()).await;
        assert_eq!(outcome, Ok(()));
    }
}
