//! IR code and protocol types.
//!
//! The firmware does not encode waveforms itself; it passes the protocol
//! name, value and bit count through to the codec behind
//! [`IrTransmitter`](crate::traits::IrTransmitter).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HardwareError, Result};

/// IR protocols understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IrProtocol {
    #[default]
    Nec,
    Sony,
    Rc5,
    Rc6,
    Samsung,
    Lg,
    Panasonic,
    Jvc,
    Sharp,
}

impl IrProtocol {
    pub const ALL: [IrProtocol; 9] = [
        IrProtocol::Nec,
        IrProtocol::Sony,
        IrProtocol::Rc5,
        IrProtocol::Rc6,
        IrProtocol::Samsung,
        IrProtocol::Lg,
        IrProtocol::Panasonic,
        IrProtocol::Jvc,
        IrProtocol::Sharp,
    ];

    /// Frame length used when the caller gives no bit count.
    #[must_use]
    pub fn default_bits(self) -> u16 {
        match self {
            IrProtocol::Nec | IrProtocol::Samsung => 32,
            IrProtocol::Sony | IrProtocol::Rc5 => 12,
            IrProtocol::Rc6 => 20,
            IrProtocol::Lg => 28,
            IrProtocol::Panasonic => 48,
            IrProtocol::Jvc => 16,
            IrProtocol::Sharp => 15,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IrProtocol::Nec => "nec",
            IrProtocol::Sony => "sony",
            IrProtocol::Rc5 => "rc5",
            IrProtocol::Rc6 => "rc6",
            IrProtocol::Samsung => "samsung",
            IrProtocol::Lg => "lg",
            IrProtocol::Panasonic => "panasonic",
            IrProtocol::Jvc => "jvc",
            IrProtocol::Sharp => "sharp",
        }
    }

    /// Parse a protocol name, falling back to NEC for anything unknown.
    ///
    /// The second element is `true` when the fallback was taken.
    #[must_use]
    pub fn parse_lossy(name: &str) -> (IrProtocol, bool) {
        match name.parse() {
            Ok(protocol) => (protocol, false),
            Err(_) => (IrProtocol::default(), true),
        }
    }
}

impl fmt::Display for IrProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IrProtocol {
    type Err = HardwareError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        IrProtocol::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| HardwareError::invalid_code(format!("unknown protocol {name:?}")))
    }
}

/// A decoded or to-be-sent IR frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrCode {
    pub protocol: IrProtocol,
    pub value: u64,
    pub bits: u16,
}

impl IrCode {
    /// Frame with the protocol's default bit count.
    pub fn new(protocol: IrProtocol, value: u64) -> Self {
        Self {
            protocol,
            value,
            bits: protocol.default_bits(),
        }
    }

    /// Override the bit count.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InvalidCode`] unless `1 <= bits <= 64`.
    pub fn with_bits(mut self, bits: u16) -> Result<Self> {
        if !(1..=64).contains(&bits) {
            return Err(HardwareError::invalid_code(format!(
                "bit count {bits} outside 1..=64"
            )));
        }
        self.bits = bits;
        Ok(self)
    }

    /// Value as `0x`-prefixed upper-case hex, e.g. `0x20DF10EF`.
    pub fn value_hex(&self) -> String {
        format!("0x{:X}", self.value)
    }
}

impl fmt::Display for IrCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} ({} bits)", self.protocol, self.value_hex(), self.bits)
    }
}

/// Parse a hex code value with an optional `0x` prefix.
///
/// # Errors
///
/// Returns [`HardwareError::InvalidCode`] for empty input, non-hex digits or
/// values wider than 64 bits.
pub fn parse_code_value(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(HardwareError::invalid_code("empty code"));
    }
    if digits.len() > 16 {
        return Err(HardwareError::invalid_code(format!(
            "code {trimmed:?} is wider than 64 bits"
        )));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|_| HardwareError::invalid_code(format!("code {trimmed:?} is not hex")))
}
