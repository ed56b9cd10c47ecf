//! Port Registry.
//!
//! The registry is the single source of truth for which pin plays which role.
//! It is bounded by the board's pin table, ordered (output-capable pins first),
//! and only ever mutated through [`PortRegistry::configure`].
//!
//! # Loading
//!
//! [`PortRegistry::from_persisted`] never fails. Entries that cannot be
//! honoured are dropped or corrected and reported as [`LoadIssue`]s so the
//! caller can log them:
//!
//! - unknown or repeated pins are skipped;
//! - `ir_output` on an input-only pin is downgraded to `disabled`;
//! - known pins missing from the persisted set are appended as `disabled`.
//!
//! An empty persisted set yields the defaults.

use crate::error::{Error, Result};
use crate::pins::{Gpio, PinCapability, PinTable};
use crate::port::{Port, PortMode};

/// Correction applied while loading a persisted port set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadIssue {
    /// The entry names a pin the board does not have.
    UnknownPin(Gpio),
    /// A second entry for a pin that was already loaded.
    DuplicatePin(Gpio),
    /// An output entry on an input-only pin was reset to disabled.
    OutputOnInputOnly(Gpio),
    /// A known pin had no entry and was added as disabled.
    MissingPin(Gpio),
}

/// Number of ports in each mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeCounts {
    pub disabled: usize,
    pub output: usize,
    pub input: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRegistry {
    pins: PinTable,
    ports: Vec<Port>,
}

impl PortRegistry {
    /// One disabled port per known pin, output-capable pins first.
    pub fn with_defaults(pins: PinTable) -> Self {
        let ports = pins.pins().map(Port::disabled).collect();
        Self { pins, ports }
    }

    /// Rebuild a registry from persisted ports, correcting what it must.
    pub fn from_persisted(pins: PinTable, persisted: Vec<Port>) -> (Self, Vec<LoadIssue>) {
        if persisted.is_empty() {
            return (Self::with_defaults(pins), Vec::new());
        }

        let mut issues = Vec::new();
        let mut ports: Vec<Port> = Vec::with_capacity(pins.len());

        for mut port in persisted {
            let Some(capability) = pins.capability(port.gpio) else {
                issues.push(LoadIssue::UnknownPin(port.gpio));
                continue;
            };
            if ports.iter().any(|p| p.gpio == port.gpio) {
                issues.push(LoadIssue::DuplicatePin(port.gpio));
                continue;
            }
            if port.mode.is_output() && capability == PinCapability::InputOnly {
                issues.push(LoadIssue::OutputOnInputOnly(port.gpio));
                port.mode = PortMode::Disabled;
            }
            ports.push(port);
        }

        for gpio in pins.pins() {
            if !ports.iter().any(|p| p.gpio == gpio) {
                issues.push(LoadIssue::MissingPin(gpio));
                ports.push(Port::disabled(gpio));
            }
        }

        (Self { pins, ports }, issues)
    }

    /// Linear lookup by pin.
    pub fn find(&self, gpio: Gpio) -> Option<&Port> {
        self.ports.iter().find(|p| p.gpio == gpio)
    }

    /// Change the mode and name of the port on `gpio`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownPort`] if the registry has no port for `gpio`.
    /// - [`Error::InputOnlyPin`] if `mode` is [`PortMode::IrOutput`] and the pin
    ///   is input-only.
    ///
    /// The registry is left untouched on error.
    pub fn configure(
        &mut self,
        gpio: Gpio,
        mode: PortMode,
        name: impl Into<String>,
    ) -> Result<&Port> {
        if mode.is_output() && self.pins.is_input_only(gpio) {
            return Err(Error::InputOnlyPin { gpio });
        }
        let port = self
            .ports
            .iter_mut()
            .find(|p| p.gpio == gpio)
            .ok_or(Error::UnknownPort { gpio })?;

        port.mode = mode;
        port.name = name.into();
        Ok(port)
    }

    /// Ports in registry order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn pins(&self) -> &PinTable {
        &self.pins
    }

    pub fn capability(&self, gpio: Gpio) -> Option<PinCapability> {
        self.pins.capability(gpio)
    }

    /// Ports currently in `mode`.
    pub fn ports_in_mode(&self, mode: PortMode) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(move |p| p.mode == mode)
    }

    pub fn counts(&self) -> ModeCounts {
        self.ports
            .iter()
            .fold(ModeCounts::default(), |mut counts, port| {
                match port.mode {
                    PortMode::Disabled => counts.disabled += 1,
                    PortMode::IrOutput => counts.output += 1,
                    PortMode::IrInput => counts.input += 1,
                }
                counts
            })
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::BoardVariant;
    use proptest::prelude::*;

    fn small_table() -> PinTable {
        PinTable::new(vec![Gpio(4), Gpio(5)], vec![Gpio(34)]).unwrap()
    }

    #[test]
    fn test_defaults_are_disabled_in_order() {
        let registry = PortRegistry::with_defaults(small_table());
        let gpios: Vec<_> = registry.ports().iter().map(|p| p.gpio).collect();
        assert_eq!(gpios, vec![Gpio(4), Gpio(5), Gpio(34)]);
        assert!(registry.ports().iter().all(|p| p.mode == PortMode::Disabled));
        assert!(registry.ports().iter().all(|p| p.name.is_empty()));
    }

    #[test]
    fn test_find_missing_is_none() {
        let registry = PortRegistry::with_defaults(small_table());
        assert!(registry.find(Gpio(7)).is_none());
    }

    #[test]
    fn test_configure_output() {
        let mut registry = PortRegistry::with_defaults(small_table());
        let port = registry.configure(Gpio(4), PortMode::IrOutput, "tv").unwrap();
        assert_eq!(port, &Port::new(Gpio(4), PortMode::IrOutput, "tv"));
        assert_eq!(registry.find(Gpio(4)).unwrap().name, "tv");
    }

    #[test]
    fn test_configure_output_on_input_only_fails_unchanged() {
        let mut registry = PortRegistry::with_defaults(small_table());
        registry.configure(Gpio(34), PortMode::IrInput, "sensor").unwrap();
        let before = registry.clone();

        let result = registry.configure(Gpio(34), PortMode::IrOutput, "x");
        assert_eq!(result.unwrap_err(), Error::InputOnlyPin { gpio: Gpio(34) });
        assert_eq!(registry, before);
    }

    #[test]
    fn test_configure_unknown_gpio() {
        let mut registry = PortRegistry::with_defaults(small_table());
        let result = registry.configure(Gpio(7), PortMode::IrInput, "");
        assert_eq!(result.unwrap_err(), Error::UnknownPort { gpio: Gpio(7) });
    }

    #[test]
    fn test_counts() {
        let mut registry = PortRegistry::with_defaults(small_table());
        registry.configure(Gpio(4), PortMode::IrOutput, "").unwrap();
        registry.configure(Gpio(34), PortMode::IrInput, "").unwrap();
        assert_eq!(
            registry.counts(),
            ModeCounts {
                disabled: 1,
                output: 1,
                input: 1
            }
        );
    }

    #[test]
    fn test_from_persisted_empty_gives_defaults() {
        let (registry, issues) = PortRegistry::from_persisted(small_table(), vec![]);
        assert_eq!(registry, PortRegistry::with_defaults(small_table()));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_from_persisted_corrections() {
        let persisted = vec![
            Port::new(Gpio(5), PortMode::IrOutput, "amp"),
            Port::new(Gpio(99), PortMode::IrOutput, "ghost"),
            Port::new(Gpio(5), PortMode::IrInput, "dup"),
            Port::new(Gpio(34), PortMode::IrOutput, "bad"),
        ];
        let (registry, issues) = PortRegistry::from_persisted(small_table(), persisted);

        assert_eq!(
            issues,
            vec![
                LoadIssue::UnknownPin(Gpio(99)),
                LoadIssue::DuplicatePin(Gpio(5)),
                LoadIssue::OutputOnInputOnly(Gpio(34)),
                LoadIssue::MissingPin(Gpio(4)),
            ]
        );
        let ports = registry.ports();
        assert_eq!(ports[0], Port::new(Gpio(5), PortMode::IrOutput, "amp"));
        assert_eq!(ports[1], Port::new(Gpio(34), PortMode::Disabled, "bad"));
        assert_eq!(ports[2], Port::disabled(Gpio(4)));
    }

    fn any_mode() -> impl Strategy<Value = PortMode> {
        prop_oneof![
            Just(PortMode::Disabled),
            Just(PortMode::IrOutput),
            Just(PortMode::IrInput),
        ]
    }

    proptest! {
        #[test]
        fn prop_defaults_cover_every_pin(variant in prop_oneof![
            Just(BoardVariant::Esp32PoeIso),
            Just(BoardVariant::Esp32Devkit),
        ]) {
            let table = variant.pin_table();
            let registry = PortRegistry::with_defaults(table.clone());
            prop_assert_eq!(registry.len(), table.len());
            for gpio in table.pins() {
                let port = registry.find(gpio).unwrap();
                prop_assert_eq!(port.mode, PortMode::Disabled);
            }
        }

        #[test]
        fn prop_output_on_input_only_always_fails(idx in 0usize..4, name in ".{0,16}") {
            let table = BoardVariant::Esp32PoeIso.pin_table();
            let gpio = table.input_only()[idx];
            let mut registry = PortRegistry::with_defaults(table);
            prop_assert!(registry.configure(gpio, PortMode::IrOutput, name).is_err());
            prop_assert_eq!(registry.find(gpio).unwrap().mode, PortMode::Disabled);
        }

        #[test]
        fn prop_input_always_succeeds(idx in 0usize..16) {
            let table = BoardVariant::Esp32PoeIso.pin_table();
            let gpio = table.pins().nth(idx).unwrap();
            let mut registry = PortRegistry::with_defaults(table);
            prop_assert!(registry.configure(gpio, PortMode::IrInput, "rx").is_ok());
        }

        #[test]
        fn prop_reload_reproduces_registry(
            changes in proptest::collection::vec((0usize..16, any_mode(), "[a-z ]{0,8}"), 0..24)
        ) {
            let table = BoardVariant::Esp32PoeIso.pin_table();
            let mut registry = PortRegistry::with_defaults(table.clone());
            for (idx, mode, name) in changes {
                let gpio = table.pins().nth(idx).unwrap();
                let _ = registry.configure(gpio, mode, name);
            }

            let (reloaded, issues) =
                PortRegistry::from_persisted(table, registry.ports().to_vec());
            prop_assert!(issues.is_empty());
            prop_assert_eq!(reloaded, registry);
        }
    }
}
