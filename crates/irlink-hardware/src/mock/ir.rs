//! Mock IR backend.
//!
//! [`MockIrBackend::new`] returns the backend together with a
//! [`MockIrHandle`]. The backend goes to the resource manager; the handle
//! stays with the test and plays the part of the outside world: it "points a
//! remote" at a pin with [`MockIrHandle::inject_frame`] and reads back what
//! the transmitters emitted.
//!
//! # Examples
//!
//! ```
//! use irlink_core::Gpio;
//! use irlink_hardware::mock::MockIrBackend;
//! use irlink_hardware::traits::{IrBackend, IrReceiver};
//! use irlink_hardware::types::{IrCode, IrProtocol};
//!
//! let (mut backend, handle) = MockIrBackend::new();
//! let mut receiver = backend.create_receiver(Gpio(34)).unwrap();
//!
//! let code = IrCode::new(IrProtocol::Nec, 0x20DF10EF);
//! handle.inject_frame(Gpio(34), code).unwrap();
//!
//! assert_eq!(receiver.try_decode().unwrap(), Some(code));
//! ```

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use irlink_core::Gpio;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::error::{HardwareError, Result};
use crate::traits::{IrBackend, IrReceiver, IrTransmitter};
use crate::types::IrCode;

/// Frames a receiver can hold before injection fails.
const RECEIVER_QUEUE_DEPTH: usize = 32;

/// Emissions kept by the bus; older ones are dropped.
pub const EMISSION_LOG_DEPTH: usize = 256;

/// Something a mock transmitter put on the air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    Sent { gpio: Gpio, code: IrCode },
    TestPattern { gpio: Gpio, duration_ms: u32 },
}

#[derive(Debug, Default)]
struct MockBus {
    next_id: u64,
    transmitters: BTreeMap<Gpio, u64>,
    receivers: BTreeMap<Gpio, (u64, mpsc::Sender<IrCode>)>,
    emissions: VecDeque<Emission>,
    failing: BTreeSet<Gpio>,
}

impl MockBus {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, emission: Emission) {
        if self.emissions.len() == EMISSION_LOG_DEPTH {
            self.emissions.pop_front();
        }
        self.emissions.push_back(emission);
    }
}

fn lock(bus: &Mutex<MockBus>) -> MutexGuard<'_, MockBus> {
    bus.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated IR backend.
#[derive(Debug, Clone)]
pub struct MockIrBackend {
    bus: Arc<Mutex<MockBus>>,
}

impl MockIrBackend {
    /// Create a backend and the handle that observes it.
    pub fn new() -> (Self, MockIrHandle) {
        let bus = Arc::new(Mutex::new(MockBus::default()));
        (
            Self { bus: bus.clone() },
            MockIrHandle { bus },
        )
    }
}

impl IrBackend for MockIrBackend {
    type Transmitter = MockIrTransmitter;
    type Receiver = MockIrReceiver;

    fn create_transmitter(&mut self, gpio: Gpio) -> Result<MockIrTransmitter> {
        let mut bus = lock(&self.bus);
        if bus.failing.contains(&gpio) {
            return Err(HardwareError::initialization_failed(
                gpio,
                "simulated driver failure",
            ));
        }
        let id = bus.allocate_id();
        bus.transmitters.insert(gpio, id);

        Ok(MockIrTransmitter {
            gpio,
            id,
            bus: self.bus.clone(),
        })
    }

    fn create_receiver(&mut self, gpio: Gpio) -> Result<MockIrReceiver> {
        let mut bus = lock(&self.bus);
        if bus.failing.contains(&gpio) {
            return Err(HardwareError::initialization_failed(
                gpio,
                "simulated driver failure",
            ));
        }
        let id = bus.allocate_id();
        let (frame_tx, frame_rx) = mpsc::channel(RECEIVER_QUEUE_DEPTH);
        bus.receivers.insert(gpio, (id, frame_tx));

        Ok(MockIrReceiver {
            gpio,
            id,
            frames: frame_rx,
            armed: true,
            bus: self.bus.clone(),
        })
    }
}

/// Transmitter handle produced by [`MockIrBackend`].
#[derive(Debug)]
pub struct MockIrTransmitter {
    gpio: Gpio,
    id: u64,
    bus: Arc<Mutex<MockBus>>,
}

impl IrTransmitter for MockIrTransmitter {
    fn gpio(&self) -> Gpio {
        self.gpio
    }

    fn send(&mut self, code: &IrCode) -> Result<()> {
        lock(&self.bus).record(Emission::Sent {
            gpio: self.gpio,
            code: *code,
        });
        Ok(())
    }

    fn emit_test_pattern(&mut self, duration_ms: u32) -> Result<()> {
        lock(&self.bus).record(Emission::TestPattern {
            gpio: self.gpio,
            duration_ms,
        });
        Ok(())
    }
}

impl Drop for MockIrTransmitter {
    fn drop(&mut self) {
        let mut bus = lock(&self.bus);
        if bus.transmitters.get(&self.gpio) == Some(&self.id) {
            bus.transmitters.remove(&self.gpio);
        }
    }
}

/// Receiver handle produced by [`MockIrBackend`].
#[derive(Debug)]
pub struct MockIrReceiver {
    gpio: Gpio,
    id: u64,
    frames: mpsc::Receiver<IrCode>,
    armed: bool,
    bus: Arc<Mutex<MockBus>>,
}

impl MockIrReceiver {
    /// Check whether the receiver is waiting for a frame.
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl IrReceiver for MockIrReceiver {
    fn gpio(&self) -> Gpio {
        self.gpio
    }

    fn try_decode(&mut self) -> Result<Option<IrCode>> {
        if !self.armed {
            return Ok(None);
        }
        match self.frames.try_recv() {
            Ok(code) => {
                self.armed = false;
                Ok(Some(code))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HardwareError::disconnected(format!(
                "IR receiver on {}",
                self.gpio
            ))),
        }
    }

    fn resume(&mut self) -> Result<()> {
        self.armed = true;
        Ok(())
    }
}

impl Drop for MockIrReceiver {
    fn drop(&mut self) {
        let mut bus = lock(&self.bus);
        if matches!(bus.receivers.get(&self.gpio), Some((id, _)) if *id == self.id) {
            bus.receivers.remove(&self.gpio);
        }
    }
}

/// Test-side view of a [`MockIrBackend`].
#[derive(Debug, Clone)]
pub struct MockIrHandle {
    bus: Arc<Mutex<MockBus>>,
}

impl MockIrHandle {
    /// Deliver a frame to the receiver listening on `gpio`.
    ///
    /// # Errors
    ///
    /// Fails if no receiver is bound to `gpio` or its queue is full.
    pub fn inject_frame(&self, gpio: Gpio, code: IrCode) -> Result<()> {
        let bus = lock(&self.bus);
        let (_, frames) = bus
            .receivers
            .get(&gpio)
            .ok_or_else(|| HardwareError::other(format!("no receiver listening on {gpio}")))?;
        frames
            .try_send(code)
            .map_err(|e| HardwareError::other(format!("cannot deliver frame to {gpio}: {e}")))
    }

    /// Make every later attempt to claim `gpio` fail.
    pub fn fail_pin(&self, gpio: Gpio) {
        lock(&self.bus).failing.insert(gpio);
    }

    pub fn clear_failure(&self, gpio: Gpio) {
        lock(&self.bus).failing.remove(&gpio);
    }

    /// Pins with a live transmitter, ascending.
    pub fn live_transmitters(&self) -> Vec<Gpio> {
        lock(&self.bus).transmitters.keys().copied().collect()
    }

    /// Pins with a live receiver, ascending.
    pub fn live_receivers(&self) -> Vec<Gpio> {
        lock(&self.bus).receivers.keys().copied().collect()
    }

    /// The last [`EMISSION_LOG_DEPTH`] emissions, oldest first.
    pub fn emissions(&self) -> Vec<Emission> {
        lock(&self.bus).emissions.iter().copied().collect()
    }

    /// Frames sent on `gpio`, oldest first.
    pub fn sent_codes(&self, gpio: Gpio) -> Vec<IrCode> {
        lock(&self.bus)
            .emissions
            .iter()
            .filter_map(|e| match e {
                Emission::Sent { gpio: g, code } if *g == gpio => Some(*code),
                _ => None,
            })
            .collect()
    }

    /// Test burst durations emitted on `gpio`, oldest first.
    pub fn test_patterns(&self, gpio: Gpio) -> Vec<u32> {
        lock(&self.bus)
            .emissions
            .iter()
            .filter_map(|e| match e {
                Emission::TestPattern { gpio: g, duration_ms } if *g == gpio => Some(*duration_ms),
                _ => None,
            })
            .collect()
    }
}
