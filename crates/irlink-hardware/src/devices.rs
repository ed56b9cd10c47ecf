//! Enum wrappers for IR backend dispatch.
//!
//! The controller and HTTP layer are generic over [`IrBackend`], but the
//! binary picks its backend at run time. [`AnyIrBackend`] gives that choice
//! a concrete type without boxing, in the same way the handles it produces
//! are wrapped by [`AnyTransmitter`] and [`AnyReceiver`].
//!
//! # Examples
//!
//! ```
//! use irlink_hardware::devices::AnyIrBackend;
//! use irlink_hardware::manager::IrResourceManager;
//! use irlink_hardware::mock::MockIrBackend;
//!
//! let (backend, _handle) = MockIrBackend::new();
//! let manager = IrResourceManager::new(AnyIrBackend::Mock(backend));
//! assert!(manager.stats().transmitters.is_empty());
//! ```

use irlink_core::Gpio;

use crate::Result;
use crate::mock::{MockIrBackend, MockIrReceiver, MockIrTransmitter};
use crate::traits::{IrBackend, IrReceiver, IrTransmitter};
use crate::types::IrCode;

/// Enum wrapper for backend dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyIrBackend {
    /// Simulated backend for development and testing.
    Mock(MockIrBackend),
}

impl IrBackend for AnyIrBackend {
    type Transmitter = AnyTransmitter;
    type Receiver = AnyReceiver;

    fn create_transmitter(&mut self, gpio: Gpio) -> Result<AnyTransmitter> {
        match self {
            Self::Mock(backend) => backend.create_transmitter(gpio).map(AnyTransmitter::Mock),
        }
    }

    fn create_receiver(&mut self, gpio: Gpio) -> Result<AnyReceiver> {
        match self {
            Self::Mock(backend) => backend.create_receiver(gpio).map(AnyReceiver::Mock),
        }
    }
}

/// Enum wrapper for transmitter dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransmitter {
    Mock(MockIrTransmitter),
}

impl IrTransmitter for AnyTransmitter {
    fn gpio(&self) -> Gpio {
        match self {
            Self::Mock(device) => device.gpio(),
        }
    }

    fn send(&mut self, code: &IrCode) -> Result<()> {
        match self {
            Self::Mock(device) => device.send(code),
        }
    }

    fn emit_test_pattern(&mut self, duration_ms: u32) -> Result<()> {
        match self {
            Self::Mock(device) => device.emit_test_pattern(duration_ms),
        }
    }
}

/// Enum wrapper for receiver dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyReceiver {
    Mock(MockIrReceiver),
}

impl IrReceiver for AnyReceiver {
    fn gpio(&self) -> Gpio {
        match self {
            Self::Mock(device) => device.gpio(),
        }
    }

    fn try_decode(&mut self) -> Result<Option<IrCode>> {
        match self {
            Self::Mock(device) => device.try_decode(),
        }
    }

    fn resume(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.resume(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IrProtocol;

    #[test]
    fn test_any_backend_dispatch() {
        let (backend, handle) = MockIrBackend::new();
        let mut backend = AnyIrBackend::Mock(backend);

        let mut transmitter = backend.create_transmitter(Gpio(4)).unwrap();
        let mut receiver = backend.create_receiver(Gpio(34)).unwrap();
        assert_eq!(transmitter.gpio(), Gpio(4));
        assert_eq!(receiver.gpio(), Gpio(34));

        let code = IrCode::new(IrProtocol::Lg, 0x20DF);
        transmitter.send(&code).unwrap();
        assert_eq!(handle.sent_codes(Gpio(4)), vec![code]);

        handle.inject_frame(Gpio(34), code).unwrap();
        assert_eq!(receiver.try_decode().unwrap(), Some(code));
        receiver.resume().unwrap();
    }
}
