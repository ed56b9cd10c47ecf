//! Pin capability tables.
//!
//! Every supported board exposes a fixed universe of GPIO pins split into two
//! disjoint sets: pins that can drive an IR LED and pins that can only be read.
//! A [`PinTable`] is immutable once built.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_PORTS;
use crate::error::{Error, Result};

/// Hardware pin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gpio(pub u8);

impl Gpio {
    /// Raw pin number.
    #[inline]
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }
}

impl From<u8> for Gpio {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Gpio {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Capability set a pin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinCapability {
    /// Pin can be driven as an output (and read as an input).
    OutputCapable,
    /// Pin can only be read.
    InputOnly,
}

impl PinCapability {
    /// Returns `true` if the pin can drive an IR LED.
    #[inline]
    #[must_use]
    pub fn can_output(self) -> bool {
        matches!(self, PinCapability::OutputCapable)
    }
}

/// The two disjoint pin sets of a board, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinTable {
    output_capable: Vec<Gpio>,
    input_only: Vec<Gpio>,
}

impl PinTable {
    /// Build a table from explicit pin lists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPinTable`] if a pin appears twice, if the two
    /// sets overlap, or if the total exceeds [`MAX_PORTS`].
    pub fn new(output_capable: Vec<Gpio>, input_only: Vec<Gpio>) -> Result<Self> {
        let total = output_capable.len() + input_only.len();
        if total > MAX_PORTS {
            return Err(Error::InvalidPinTable(format!(
                "{total} pins exceed the capacity of {MAX_PORTS}"
            )));
        }

        let mut seen = HashSet::with_capacity(total);
        for gpio in output_capable.iter().chain(input_only.iter()) {
            if !seen.insert(*gpio) {
                return Err(Error::InvalidPinTable(format!("{gpio} declared twice")));
            }
        }

        Ok(Self {
            output_capable,
            input_only,
        })
    }

    fn from_numbers(output_capable: &[u8], input_only: &[u8]) -> Self {
        Self {
            output_capable: output_capable.iter().copied().map(Gpio).collect(),
            input_only: input_only.iter().copied().map(Gpio).collect(),
        }
    }

    /// Capability of `gpio`, or `None` if the board has no such pin.
    #[must_use]
    pub fn capability(&self, gpio: Gpio) -> Option<PinCapability> {
        if self.output_capable.contains(&gpio) {
            Some(PinCapability::OutputCapable)
        } else if self.input_only.contains(&gpio) {
            Some(PinCapability::InputOnly)
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, gpio: Gpio) -> bool {
        self.capability(gpio).is_some()
    }

    #[must_use]
    pub fn is_input_only(&self, gpio: Gpio) -> bool {
        self.input_only.contains(&gpio)
    }

    pub fn output_capable(&self) -> &[Gpio] {
        &self.output_capable
    }

    pub fn input_only(&self) -> &[Gpio] {
        &self.input_only
    }

    /// All pins, output-capable first, each set in declaration order.
    pub fn pins(&self) -> impl Iterator<Item = Gpio> + '_ {
        self.output_capable
            .iter()
            .chain(self.input_only.iter())
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.output_capable.len() + self.input_only.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Supported board variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardVariant {
    /// Olimex ESP32-POE-ISO, Ethernet with PoE.
    #[default]
    Esp32PoeIso,
    /// Generic ESP32 devkit on WiFi.
    Esp32Devkit,
}

impl BoardVariant {
    /// Pin table of this board.
    #[must_use]
    pub fn pin_table(self) -> PinTable {
        match self {
            BoardVariant::Esp32PoeIso => PinTable::from_numbers(
                &[0, 1, 2, 3, 4, 5, 13, 14, 15, 16, 32, 33],
                &[34, 35, 36, 39],
            ),
            BoardVariant::Esp32Devkit => PinTable::from_numbers(
                &[4, 5, 13, 14, 16, 17, 18, 19, 21, 22, 23, 25, 26, 27, 32, 33],
                &[34, 35, 36, 39],
            ),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BoardVariant::Esp32PoeIso => "esp32-poe-iso",
            BoardVariant::Esp32Devkit => "esp32-devkit",
        }
    }
}

impl fmt::Display for BoardVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "esp32-poe-iso" => Ok(BoardVariant::Esp32PoeIso),
            "esp32-devkit" => Ok(BoardVariant::Esp32Devkit),
            other => Err(Error::UnknownBoardVariant(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn gpios(numbers: &[u8]) -> Vec<Gpio> {
        numbers.iter().copied().map(Gpio).collect()
    }

    #[test]
    fn test_gpio_display() {
        assert_eq!(Gpio(34).to_string(), "GPIO34");
        assert_eq!(Gpio(0).to_string(), "GPIO0");
    }

    #[test]
    fn test_pin_table_order_output_first() {
        let table = PinTable::new(gpios(&[5, 4]), gpios(&[34])).unwrap();
        let pins: Vec<_> = table.pins().collect();
        assert_eq!(pins, gpios(&[5, 4, 34]));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_pin_table_capability() {
        let table = PinTable::new(gpios(&[4, 5]), gpios(&[34])).unwrap();
        assert_eq!(table.capability(Gpio(4)), Some(PinCapability::OutputCapable));
        assert_eq!(table.capability(Gpio(34)), Some(PinCapability::InputOnly));
        assert_eq!(table.capability(Gpio(7)), None);
        assert!(table.is_input_only(Gpio(34)));
        assert!(!table.is_input_only(Gpio(4)));
    }

    #[test]
    fn test_pin_table_rejects_overlap() {
        let result = PinTable::new(gpios(&[4, 34]), gpios(&[34]));
        assert!(matches!(result, Err(Error::InvalidPinTable(_))));
    }

    #[test]
    fn test_pin_table_rejects_duplicates() {
        let result = PinTable::new(gpios(&[4, 4]), vec![]);
        assert!(matches!(result, Err(Error::InvalidPinTable(_))));
    }

    #[test]
    fn test_pin_table_rejects_oversized() {
        let outputs: Vec<Gpio> = (0..=MAX_PORTS as u8).map(Gpio).collect();
        let result = PinTable::new(outputs, vec![]);
        assert!(matches!(result, Err(Error::InvalidPinTable(_))));
    }

    #[rstest]
    #[case(BoardVariant::Esp32PoeIso, 12, 4)]
    #[case(BoardVariant::Esp32Devkit, 16, 4)]
    fn test_builtin_tables_are_valid(
        #[case] variant: BoardVariant,
        #[case] outputs: usize,
        #[case] inputs: usize,
    ) {
        let table = variant.pin_table();
        let rebuilt =
            PinTable::new(table.output_capable().to_vec(), table.input_only().to_vec()).unwrap();
        assert_eq!(rebuilt, table);
        assert_eq!(table.output_capable().len(), outputs);
        assert_eq!(table.input_only().len(), inputs);
    }

    #[rstest]
    #[case("esp32-poe-iso", BoardVariant::Esp32PoeIso)]
    #[case("ESP32-DEVKIT", BoardVariant::Esp32Devkit)]
    #[case(" esp32-devkit ", BoardVariant::Esp32Devkit)]
    fn test_board_variant_from_str(#[case] input: &str, #[case] expected: BoardVariant) {
        assert_eq!(input.parse::<BoardVariant>().unwrap(), expected);
    }

    #[test]
    fn test_board_variant_unknown() {
        assert!(matches!(
            "arduino".parse::<BoardVariant>(),
            Err(Error::UnknownBoardVariant(_))
        ));
    }

    #[test]
    fn test_board_variant_serde_matches_display() {
        let json = serde_json::to_string(&BoardVariant::Esp32Devkit).unwrap();
        assert_eq!(json, "\"esp32-devkit\"");
    }
}
