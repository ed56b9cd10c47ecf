//! Error types for IR hardware operations.

use irlink_core::Gpio;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving IR transmitters and receivers.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No transmitter is bound to the pin.
    #[error("No transmitter bound to {gpio}")]
    NoTransmitter { gpio: Gpio },

    /// IR code could not be parsed or is out of range.
    #[error("Invalid IR code: {message}")]
    InvalidCode { message: String },

    /// Transmitter or receiver could not be created on the pin.
    #[error("Initialization failed on {gpio}: {message}")]
    InitializationFailed { gpio: Gpio, message: String },

    /// The peripheral went away after it was bound.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new missing transmitter error.
    pub fn no_transmitter(gpio: Gpio) -> Self {
        Self::NoTransmitter { gpio }
    }

    /// Create a new invalid code error.
    pub fn invalid_code(message: impl Into<String>) -> Self {
        Self::InvalidCode {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(gpio: Gpio, message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            gpio,
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_transmitter_error() {
        let error = HardwareError::no_transmitter(Gpio(4));
        assert!(matches!(error, HardwareError::NoTransmitter { .. }));
        assert_eq!(error.to_string(), "No transmitter bound to GPIO4");
    }

    #[test]
    fn test_initialization_failed_error() {
        let error = HardwareError::initialization_failed(Gpio(13), "RMT channel busy");
        assert_eq!(
            error.to_string(),
            "Initialization failed on GPIO13: RMT channel busy"
        );
    }

    #[test]
    fn test_invalid_code_error() {
        let error = HardwareError::invalid_code("empty code");
        assert!(matches!(error, HardwareError::InvalidCode { .. }));
        assert_eq!(error.to_string(), "Invalid IR code: empty code");
    }
}
