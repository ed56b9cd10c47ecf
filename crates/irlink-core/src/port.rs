//! Port model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins::Gpio;

/// Role a pin plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMode {
    #[default]
    Disabled,
    IrOutput,
    IrInput,
}

impl PortMode {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PortMode::Disabled => "disabled",
            PortMode::IrOutput => "ir_output",
            PortMode::IrInput => "ir_input",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(self, PortMode::IrOutput)
    }

    #[inline]
    #[must_use]
    pub fn is_input(self) -> bool {
        matches!(self, PortMode::IrInput)
    }
}

impl fmt::Display for PortMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(PortMode::Disabled),
            "ir_output" => Ok(PortMode::IrOutput),
            "ir_input" => Ok(PortMode::IrInput),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// Assignment of one pin to a role.
///
/// Ports are keyed by `gpio`; a registry never holds two ports for the same
/// pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub gpio: Gpio,
    #[serde(default)]
    pub mode: PortMode,
    #[serde(default)]
    pub name: String,
}

impl Port {
    pub fn new(gpio: Gpio, mode: PortMode, name: impl Into<String>) -> Self {
        Self {
            gpio,
            mode,
            name: name.into(),
        }
    }

    /// A disabled port with an empty name.
    pub fn disabled(gpio: Gpio) -> Self {
        Self::new(gpio, PortMode::Disabled, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("disabled", PortMode::Disabled)]
    #[case("ir_output", PortMode::IrOutput)]
    #[case("ir_input", PortMode::IrInput)]
    fn test_mode_parse_and_display(#[case] wire: &str, #[case] mode: PortMode) {
        assert_eq!(wire.parse::<PortMode>().unwrap(), mode);
        assert_eq!(mode.to_string(), wire);
    }

    #[rstest]
    #[case("IR_OUTPUT")]
    #[case("output")]
    #[case("")]
    fn test_mode_parse_rejects_unknown(#[case] wire: &str) {
        assert!(matches!(wire.parse::<PortMode>(), Err(Error::InvalidMode(_))));
    }

    #[test]
    fn test_port_deserialize_fills_defaults() {
        let port: Port = serde_json::from_str(r#"{"gpio": 4}"#).unwrap();
        assert_eq!(port, Port::disabled(Gpio(4)));
    }

    #[test]
    fn test_port_serialize_wire_names() {
        let port = Port::new(Gpio(4), PortMode::IrOutput, "tv");
        let json = serde_json::to_value(&port).unwrap();
        assert_eq!(json["gpio"], 4);
        assert_eq!(json["mode"], "ir_output");
        assert_eq!(json["name"], "tv");
    }
}
