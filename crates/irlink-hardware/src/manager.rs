//! IR resource manager.
//!
//! The manager owns every live transmitter and the single active receiver.
//! It enforces two rules:
//!
//! - at most one receiver exists; binding a new one always tears down the
//!   previous one first, whatever pin it was on;
//! - transmitters are independent and keyed by pin; rebinding a pin replaces
//!   its handle.
//!
//! Handles hold no persisted state, so the manager is rebuilt from the
//! [`PortRegistry`](irlink_core::PortRegistry) at boot and re-driven after
//! every port change.
//!
//! # Examples
//!
//! ```
//! use irlink_core::Gpio;
//! use irlink_hardware::manager::IrResourceManager;
//! use irlink_hardware::mock::MockIrBackend;
//!
//! let (backend, handle) = MockIrBackend::new();
//! let mut manager = IrResourceManager::new(backend);
//!
//! manager.bind_transmitter(Gpio(4)).unwrap();
//! let outcome = manager.send(Gpio(4), "nec", 0x20DF10EF, None).unwrap();
//! assert!(!outcome.protocol_fallback);
//! assert_eq!(handle.sent_codes(Gpio(4)).len(), 1);
//! ```

use std::collections::BTreeMap;

use irlink_core::Gpio;
use irlink_core::constants::MAX_TEST_DURATION_MS;
use tracing::{debug, info, warn};

use crate::error::{HardwareError, Result};
use crate::traits::{IrBackend, IrReceiver, IrTransmitter};
use crate::types::{IrCode, IrProtocol};

/// Result of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    /// Frame that went out.
    pub code: IrCode,

    /// `true` if the requested protocol was unknown and NEC was used.
    pub protocol_fallback: bool,
}

/// Snapshot of bound resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrStats {
    /// Pins with a live transmitter, ascending.
    pub transmitters: Vec<Gpio>,

    /// Pin of the active receiver.
    pub receiver: Option<Gpio>,
}

pub struct IrResourceManager<B: IrBackend> {
    backend: B,
    transmitters: BTreeMap<Gpio, B::Transmitter>,
    receiver: Option<B::Receiver>,
}

impl<B: IrBackend> IrResourceManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            transmitters: BTreeMap::new(),
            receiver: None,
        }
    }

    /// Destroy any transmitter on `gpio` and create a fresh one.
    pub fn bind_transmitter(&mut self, gpio: Gpio) -> Result<()> {
        if self.transmitters.remove(&gpio).is_some() {
            debug!(gpio = %gpio, "Replacing existing transmitter");
        }
        let transmitter = self.backend.create_transmitter(gpio)?;
        self.transmitters.insert(gpio, transmitter);
        info!(gpio = %gpio, "IR transmitter bound");
        Ok(())
    }

    /// Tear down the transmitter on `gpio`. Returns `true` if one existed.
    pub fn release_transmitter(&mut self, gpio: Gpio) -> bool {
        let released = self.transmitters.remove(&gpio).is_some();
        if released {
            info!(gpio = %gpio, "IR transmitter released");
        }
        released
    }

    /// Replace the active receiver with one on `gpio`.
    ///
    /// The previous receiver is destroyed before the new one is created, so
    /// a failure leaves no receiver at all.
    pub fn bind_receiver(&mut self, gpio: Gpio) -> Result<()> {
        if let Some(previous) = self.receiver.take() {
            debug!(previous = %previous.gpio(), gpio = %gpio, "Tearing down active receiver");
        }
        let receiver = self.backend.create_receiver(gpio)?;
        self.receiver = Some(receiver);
        info!(gpio = %gpio, "IR receiver bound");
        Ok(())
    }

    /// Tear down the active receiver. Returns the pin it was on.
    pub fn release_receiver(&mut self) -> Option<Gpio> {
        let gpio = self.receiver.take().map(|r| r.gpio());
        if let Some(gpio) = gpio {
            info!(gpio = %gpio, "IR receiver released");
        }
        gpio
    }

    pub fn receiver_gpio(&self) -> Option<Gpio> {
        self.receiver.as_ref().map(IrReceiver::gpio)
    }

    pub fn has_transmitter(&self, gpio: Gpio) -> bool {
        self.transmitters.contains_key(&gpio)
    }

    /// Send a frame by protocol name.
    ///
    /// Unknown protocol names fall back to NEC and are reported in
    /// [`SendOutcome::protocol_fallback`].
    ///
    /// # Errors
    ///
    /// - [`HardwareError::NoTransmitter`] if `gpio` has no live transmitter.
    /// - [`HardwareError::InvalidCode`] if `bits` is out of range.
    pub fn send(
        &mut self,
        gpio: Gpio,
        protocol: &str,
        value: u64,
        bits: Option<u16>,
    ) -> Result<SendOutcome> {
        let (resolved, protocol_fallback) = IrProtocol::parse_lossy(protocol);
        if protocol_fallback {
            warn!(gpio = %gpio, requested = %protocol, "Unknown IR protocol, falling back to NEC");
        }

        let mut code = IrCode::new(resolved, value);
        if let Some(bits) = bits {
            code = code.with_bits(bits)?;
        }

        self.send_code(gpio, &code)?;
        Ok(SendOutcome {
            code,
            protocol_fallback,
        })
    }

    /// Send an already-built frame.
    pub fn send_code(&mut self, gpio: Gpio, code: &IrCode) -> Result<()> {
        let transmitter = self
            .transmitters
            .get_mut(&gpio)
            .ok_or_else(|| HardwareError::no_transmitter(gpio))?;
        transmitter.send(code)?;
        info!(gpio = %gpio, code = %code, "IR code sent");
        Ok(())
    }

    /// Emit a carrier burst on `gpio`. Returns the duration actually used,
    /// clamped to `1..=MAX_TEST_DURATION_MS`.
    pub fn test_output(&mut self, gpio: Gpio, duration_ms: u32) -> Result<u32> {
        let duration_ms = duration_ms.clamp(1, MAX_TEST_DURATION_MS);
        let transmitter = self
            .transmitters
            .get_mut(&gpio)
            .ok_or_else(|| HardwareError::no_transmitter(gpio))?;
        transmitter.emit_test_pattern(duration_ms)?;
        info!(gpio = %gpio, duration_ms, "IR test pattern emitted");
        Ok(duration_ms)
    }

    /// Take a decoded frame from the active receiver, if any.
    ///
    /// A returned frame is consumed and the receiver is re-armed before this
    /// returns, so a frame is delivered once and the receiver never stays
    /// paused.
    pub fn poll_received(&mut self) -> Result<Option<IrCode>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Ok(None);
        };
        let Some(code) = receiver.try_decode()? else {
            return Ok(None);
        };
        receiver.resume()?;
        info!(gpio = %receiver.gpio(), code = %code, "IR code received");
        Ok(Some(code))
    }

    pub fn stats(&self) -> IrStats {
        IrStats {
            transmitters: self.transmitters.keys().copied().collect(),
            receiver: self.receiver_gpio(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
