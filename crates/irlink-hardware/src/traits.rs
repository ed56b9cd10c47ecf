//! IR peripheral trait definitions.
//!
//! These traits are the seam between the resource manager and whatever drives
//! the pins: the simulated backend in [`crate::mock`] or a real codec on the
//! target. Calls are synchronous and non-blocking; the IR codec on the board
//! does its timing in hardware.

use irlink_core::Gpio;

use crate::error::Result;
use crate::types::IrCode;

/// Handle to an IR LED driver bound to one pin.
///
/// Dropping the handle releases the pin.
pub trait IrTransmitter: Send {
    /// Pin the transmitter drives.
    fn gpio(&self) -> Gpio;

    /// Transmit one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec rejects the frame or the driver is gone.
    fn send(&mut self, code: &IrCode) -> Result<()>;

    /// Emit an unmodulated carrier burst for `duration_ms`, used to check the
    /// wiring with a phone camera.
    fn emit_test_pattern(&mut self, duration_ms: u32) -> Result<()>;
}

/// Handle to an IR demodulator bound to one pin.
///
/// After a frame has been decoded the receiver stays paused until
/// [`resume`](IrReceiver::resume) is called. Dropping the handle releases the
/// pin.
pub trait IrReceiver: Send {
    /// Pin the receiver listens on.
    fn gpio(&self) -> Gpio;

    /// Return a decoded frame if one is ready. Never blocks.
    fn try_decode(&mut self) -> Result<Option<IrCode>>;

    /// Re-arm the receiver after a decode.
    fn resume(&mut self) -> Result<()>;
}

/// Factory for transmitter and receiver handles.
pub trait IrBackend: Send {
    type Transmitter: IrTransmitter;
    type Receiver: IrReceiver;

    /// Claim `gpio` as an IR output.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`](crate::HardwareError::InitializationFailed)
    /// if the driver cannot take the pin.
    fn create_transmitter(&mut self, gpio: Gpio) -> Result<Self::Transmitter>;

    /// Claim `gpio` as an IR input. The receiver starts armed.
    fn create_receiver(&mut self, gpio: Gpio) -> Result<Self::Receiver>;
}
