//! Board identity and adoption.
//!
//! A board boots with an identity derived from its MAC address. Adoption by a
//! hub replaces the id and display name and flips the board into the
//! [`AdoptionState::Adopted`] state, which is permanent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_BOARD_ID_LENGTH;
use crate::error::{Error, Result};

/// Adoption lifecycle. The only transition is `Unadopted -> Adopted`;
/// adopting again renames the board and stays `Adopted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoptionState {
    Unadopted,
    Adopted,
}

impl fmt::Display for AdoptionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AdoptionState::Unadopted => write!(f, "Unadopted"),
            AdoptionState::Adopted => write!(f, "Adopted"),
        }
    }
}

/// Hardware address of the network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Parse `aa:bb:cc:dd:ee:ff` (or with `-` separators).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMacAddress`] if the input is not six hex octets.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidMacAddress(input.to_string());
        let mut octets = [0u8; 6];
        let mut parts = input.trim().split([':', '-']);

        for octet in &mut octets {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Lower-case hex of the last three octets, unique per board in practice.
    pub fn suffix(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.0[3], self.0[4], self.0[5])
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Identity of the board as seen by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub adopted: bool,
}

impl BoardIdentity {
    /// First-boot identity: `ir-<suffix>` / `IR Controller <suffix>`.
    pub fn derive_from_mac(mac: &MacAddress) -> Self {
        let suffix = mac.suffix();
        Self {
            id: format!("ir-{suffix}"),
            name: format!("IR Controller {suffix}"),
            adopted: false,
        }
    }

    pub fn state(&self) -> AdoptionState {
        if self.adopted {
            AdoptionState::Adopted
        } else {
            AdoptionState::Unadopted
        }
    }

    /// Apply an adoption request.
    ///
    /// The id is trimmed and validated with [`validate_board_id`]. A missing
    /// or blank `name` keeps the current display name. Returns the state the
    /// board was in before the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoardId`] and leaves the identity unchanged if
    /// the id is rejected.
    pub fn adopt(&mut self, id: &str, name: Option<&str>) -> Result<AdoptionState> {
        let id = validate_board_id(id)?;
        let previous = self.state();
        self.id = id;
        if let Some(name) = name.map(str::trim)
            && !name.is_empty()
        {
            self.name = name.to_string();
        }
        self.adopted = true;
        Ok(previous)
    }
}

/// Trim and check a board id.
///
/// The id must be non-empty, at most [`MAX_BOARD_ID_LENGTH`] bytes, and made
/// of ASCII letters, digits, `-` and `_`.
pub fn validate_board_id(raw: &str) -> Result<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(Error::InvalidBoardId("board id must not be empty".to_string()));
    }
    if id.len() > MAX_BOARD_ID_LENGTH {
        return Err(Error::InvalidBoardId(format!(
            "board id is longer than {MAX_BOARD_ID_LENGTH} bytes"
        )));
    }
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(Error::InvalidBoardId(format!(
            "board id contains invalid character {c:?}"
        )));
    }
    Ok(id.to_string())
}
