use thiserror::Error;

use crate::pins::Gpio;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Port model errors
    #[error("Unknown port: {gpio} is not a pin of this board")]
    UnknownPort { gpio: Gpio },

    #[error("{gpio} is input-only and cannot be used as an IR output")]
    InputOnlyPin { gpio: Gpio },

    #[error("Invalid port mode: {0}")]
    InvalidMode(String),

    // Board table errors
    #[error("Invalid pin table: {0}")]
    InvalidPinTable(String),

    #[error("Unknown board variant: {0}")]
    UnknownBoardVariant(String),

    // Identity errors
    #[error("Invalid board id: {0}")]
    InvalidBoardId(String),

    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),
}

pub type Result<T> = std::result::Result<T, Error>;
