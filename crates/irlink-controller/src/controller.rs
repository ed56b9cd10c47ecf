//! Board controller.
//!
//! [`BoardController`] owns the port registry, the board identity and the IR
//! resource manager, and runs every operation the HTTP surface exposes. Each
//! mutating operation follows the same order, synchronously:
//!
//! 1. validate and mutate the in-memory state;
//! 2. re-drive the IR resource manager for the affected pin;
//! 3. persist the configuration.
//!
//! The controller is not internally synchronised; callers share it behind a
//! single async mutex so one request is fully handled before the next one
//! observes state.

use std::time::Duration;

use irlink_core::constants::{
    DEFAULT_LEARNING_TIMEOUT_SECS, DEFAULT_TEST_DURATION_MS, MAX_LEARNING_TIMEOUT_SECS,
    MIN_LEARNING_TIMEOUT_SECS,
};
use irlink_core::{
    BoardIdentity, Gpio, ModeCounts, PinCapability, PinTable, Port, PortMode, PortRegistry,
};
use irlink_hardware::{
    IrBackend, IrCode, IrResourceManager, IrStats, SendOutcome, parse_code_value,
};
use irlink_storage::{ConfigRepository, KeyValueStore};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::discovery::ServiceAdvertiser;
use crate::error::{ControllerError, Result};
use crate::platform::Platform;

/// Everything the controller needs at boot.
pub struct BootConfig<B, S> {
    pub backend: B,
    pub store: S,
    pub pins: PinTable,
    pub platform: Box<dyn Platform>,
    pub advertiser: Box<dyn ServiceAdvertiser>,
    pub http_port: u16,
}

/// Payload of `GET /info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardInfo {
    pub board_id: String,
    pub board_name: String,
    pub mac_address: String,
    pub ip_address: Option<String>,
    pub firmware_version: String,
    pub total_ports: usize,
    pub output_count: usize,
    pub input_count: usize,
    pub uptime_seconds: u64,
    pub adopted: bool,
}

/// Payload of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardStatus {
    pub board_id: String,
    pub online: bool,
    pub uptime_seconds: u64,
    pub free_heap: u64,
    pub learning_active: bool,
}

/// A port together with the capability of its pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortView {
    pub port: Port,
    pub capability: PinCapability,
}

/// State of the learning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningStatus {
    pub active: bool,
    pub port: Option<Gpio>,
    pub received_code: Option<IrCode>,
    /// Whole seconds since the session started; 0 when inactive.
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, Copy)]
struct LearningSession {
    gpio: Gpio,
    received: Option<IrCode>,
    started: Instant,
    timeout: Duration,
}

impl LearningSession {
    fn expired(&self) -> bool {
        self.started.elapsed() >= self.timeout
    }
}

pub struct BoardController<B: IrBackend, S: KeyValueStore> {
    registry: PortRegistry,
    identity: BoardIdentity,
    manager: IrResourceManager<B>,
    repository: ConfigRepository<S>,
    platform: Box<dyn Platform>,
    advertiser: Box<dyn ServiceAdvertiser>,
    http_port: u16,
    learning: Option<LearningSession>,
    booted_at: Instant,
}

impl<B: IrBackend, S: KeyValueStore> BoardController<B, S> {
    /// Load configuration, bind IR resources and announce the board.
    ///
    /// Boot does not fail: unreadable configuration is replaced by defaults,
    /// and pins that cannot be bound are logged and left unbound.
    pub async fn boot(config: BootConfig<B, S>) -> Self {
        let BootConfig {
            backend,
            store,
            pins,
            platform,
            advertiser,
            http_port,
        } = config;

        let repository = ConfigRepository::new(store);
        let fallback = BoardIdentity::derive_from_mac(&platform.mac_address());
        let loaded = repository.load(&pins, &fallback).await;

        if loaded.needs_save()
            && let Err(e) = repository.save(&loaded.identity, &loaded.registry).await
        {
            warn!(error = %e, "Failed to write initial configuration");
        }

        let mut controller = Self {
            registry: loaded.registry,
            identity: loaded.identity,
            manager: IrResourceManager::new(backend),
            repository,
            platform,
            advertiser,
            http_port,
            learning: None,
            booted_at: Instant::now(),
        };

        controller.bind_configured_ports();
        controller
            .advertiser
            .advertise(&controller.identity.id, controller.http_port);

        let counts = controller.registry.counts();
        info!(
            board_id = %controller.identity.id,
            adopted = controller.identity.adopted,
            ports = controller.registry.len(),
            outputs = counts.output,
            inputs = counts.input,
            "Board ready"
        );
        controller
    }

    fn bind_configured_ports(&mut self) {
        let ports: Vec<Port> = self.registry.ports().to_vec();
        for port in ports.iter().filter(|p| p.mode != PortMode::Disabled) {
            if port.mode.is_input()
                && let Some(previous) = self.manager.receiver_gpio()
            {
                warn!(
                    previous = %previous,
                    gpio = %port.gpio,
                    "Several IR inputs configured, only the last one receives"
                );
            }
            if let Err(e) = self.apply_port(port) {
                warn!(
                    gpio = %port.gpio,
                    mode = %port.mode,
                    error = %e,
                    "Failed to bind port at boot"
                );
            }
        }
    }

    /// Drive the resource manager to match `port`.
    ///
    /// When the receiver is taken off this pin it moves to the configured IR
    /// input, if another port has one.
    fn apply_port(&mut self, port: &Port) -> irlink_hardware::Result<()> {
        let gpio = port.gpio;
        let receiver_here = self.manager.receiver_gpio() == Some(gpio);
        match port.mode {
            PortMode::IrOutput => {
                if receiver_here {
                    self.manager.release_receiver();
                    self.restore_configured_receiver();
                }
                self.manager.bind_transmitter(gpio)
            }
            PortMode::IrInput => {
                self.manager.release_transmitter(gpio);
                self.manager.bind_receiver(gpio)
            }
            PortMode::Disabled => {
                self.manager.release_transmitter(gpio);
                if receiver_here {
                    self.manager.release_receiver();
                    self.restore_configured_receiver();
                }
                Ok(())
            }
        }
    }

    /// Bind the receiver to the configured IR input, the last one in
    /// registry order.
    fn restore_configured_receiver(&mut self) {
        let Some(gpio) = self
            .registry
            .ports_in_mode(PortMode::IrInput)
            .last()
            .map(|p| p.gpio)
        else {
            return;
        };
        if let Err(e) = self.manager.bind_receiver(gpio) {
            warn!(gpio = %gpio, error = %e, "Failed to restore IR input");
        }
    }

    /// End the learning session if it timed out or its receiver is gone.
    fn sync_learning(&mut self) {
        let Some(session) = self.learning else {
            return;
        };
        if self.manager.receiver_gpio() != Some(session.gpio) {
            info!(gpio = %session.gpio, "Learning session ended by port change");
            self.learning = None;
        } else if session.expired() {
            info!(
                gpio = %session.gpio,
                timeout_secs = session.timeout.as_secs(),
                "Learning session timed out"
            );
            self.end_learning(session);
        }
    }

    /// Hand the receiver back after a session.
    ///
    /// The receiver stays bound when the pin is configured as an IR input;
    /// otherwise it returns to the configured input port, if any.
    fn end_learning(&mut self, session: LearningSession) {
        self.learning = None;
        let keep = self
            .registry
            .find(session.gpio)
            .is_some_and(|p| p.mode.is_input());
        if !keep {
            self.manager.release_receiver();
            self.restore_configured_receiver();
        }
    }

    /// Write identity and registry. Takes field borrows: the future must not
    /// borrow the whole controller.
    async fn persist(
        repository: &ConfigRepository<S>,
        identity: &BoardIdentity,
        registry: &PortRegistry,
    ) -> Result<()> {
        repository.save(identity, registry).await.map_err(|e| {
            warn!(error = %e, "Failed to persist configuration");
            ControllerError::from(e)
        })
    }

    /// Reconfigure one port.
    ///
    /// The registry is the source of truth: if rebinding the pin fails, the
    /// new configuration is still persisted and the hardware error returned.
    ///
    /// # Errors
    ///
    /// - [`irlink_core::Error::UnknownPort`] / [`irlink_core::Error::InputOnlyPin`]
    ///   with nothing changed.
    /// - [`ControllerError::Storage`] if the configuration could not be written.
    /// - [`ControllerError::Hardware`] if the pin could not be rebound.
    pub async fn configure_port(
        &mut self,
        gpio: Gpio,
        mode: PortMode,
        name: &str,
    ) -> Result<Port> {
        let port = self.registry.configure(gpio, mode, name)?.clone();
        info!(gpio = %gpio, mode = %mode, name = %port.name, "Port configured");

        let rebound = self.apply_port(&port);
        self.sync_learning();
        Self::persist(&self.repository, &self.identity, &self.registry).await?;

        if let Err(e) = rebound {
            warn!(gpio = %gpio, mode = %mode, error = %e, "Failed to rebind port");
            return Err(e.into());
        }
        Ok(port)
    }

    /// Adopt the board under a new id.
    ///
    /// Returns the identity after adoption. The discovery announcement is
    /// re-registered under the new id even if persisting fails.
    pub async fn adopt(
        &mut self,
        board_id: &str,
        board_name: Option<&str>,
    ) -> Result<BoardIdentity> {
        let previous_id = self.identity.id.clone();
        let previous_state = self.identity.adopt(board_id, board_name)?;
        info!(
            previous = %previous_id,
            board_id = %self.identity.id,
            board_name = %self.identity.name,
            was = %previous_state,
            "Board adopted"
        );

        let persisted = Self::persist(&self.repository, &self.identity, &self.registry).await;
        self.advertiser.withdraw();
        self.advertiser.advertise(&self.identity.id, self.http_port);
        persisted?;

        Ok(self.identity.clone())
    }

    fn output_port(&self, gpio: Gpio) -> Result<&Port> {
        let port = self
            .registry
            .find(gpio)
            .ok_or(irlink_core::Error::UnknownPort { gpio })?;
        if !port.mode.is_output() {
            return Err(ControllerError::NotOutputPort { gpio });
        }
        Ok(port)
    }

    /// Transmit a code on an output port.
    ///
    /// `code` is hex with an optional `0x` prefix. A missing protocol means
    /// NEC; an unknown one falls back to NEC and is flagged in the outcome.
    pub fn send_ir(
        &mut self,
        gpio: Gpio,
        code: &str,
        protocol: Option<&str>,
        bits: Option<u16>,
    ) -> Result<SendOutcome> {
        let value = parse_code_value(code)?;
        self.output_port(gpio)?;
        let protocol = protocol.unwrap_or("nec");
        Ok(self.manager.send(gpio, protocol, value, bits)?)
    }

    /// Emit a test burst on an output port. Returns the duration used.
    pub fn test_output(&mut self, gpio: Gpio, duration_ms: Option<u32>) -> Result<u32> {
        self.output_port(gpio)?;
        let duration_ms = duration_ms.unwrap_or(DEFAULT_TEST_DURATION_MS);
        Ok(self.manager.test_output(gpio, duration_ms)?)
    }

    /// Bind the single receiver to `gpio` and start capturing.
    ///
    /// Any receiver elsewhere, including one from an earlier session, is
    /// torn down first. The session ends by itself after `timeout_secs`
    /// (default 10, clamped to 5..=60); the clamped value is returned.
    pub fn start_learning(&mut self, gpio: Gpio, timeout_secs: Option<u32>) -> Result<u32> {
        if self.registry.find(gpio).is_none() {
            return Err(irlink_core::Error::UnknownPort { gpio }.into());
        }
        let timeout_secs = timeout_secs
            .unwrap_or(DEFAULT_LEARNING_TIMEOUT_SECS)
            .clamp(MIN_LEARNING_TIMEOUT_SECS, MAX_LEARNING_TIMEOUT_SECS);

        self.learning = None;
        self.manager.bind_receiver(gpio)?;
        self.learning = Some(LearningSession {
            gpio,
            received: None,
            started: Instant::now(),
            timeout: Duration::from_secs(u64::from(timeout_secs)),
        });
        info!(gpio = %gpio, timeout_secs, "Learning started");
        Ok(timeout_secs)
    }

    /// End the learning session. Returns whether one was active; a session
    /// that already timed out does not count.
    pub fn stop_learning(&mut self) -> bool {
        self.sync_learning();
        let Some(session) = self.learning else {
            return false;
        };
        self.end_learning(session);
        info!(gpio = %session.gpio, "Learning stopped");
        true
    }

    /// Poll the receiver and report the session, keeping the latest frame.
    pub fn learning_status(&mut self) -> Result<LearningStatus> {
        self.sync_learning();
        let Some(session) = self.learning.as_mut() else {
            return Ok(LearningStatus {
                active: false,
                port: None,
                received_code: None,
                elapsed_seconds: 0,
            });
        };

        if let Some(code) = self.manager.poll_received()? {
            info!(gpio = %session.gpio, code = %code, "Learned IR code");
            session.received = Some(code);
        }

        Ok(LearningStatus {
            active: true,
            port: Some(session.gpio),
            received_code: session.received,
            elapsed_seconds: session.started.elapsed().as_secs(),
        })
    }

    pub fn info(&self) -> BoardInfo {
        let ModeCounts { output, input, .. } = self.registry.counts();
        let link = self.platform.link_status();
        BoardInfo {
            board_id: self.identity.id.clone(),
            board_name: self.identity.name.clone(),
            mac_address: self.platform.mac_address().to_string(),
            ip_address: link.ip_address.map(|ip| ip.to_string()),
            firmware_version: irlink_core::constants::FIRMWARE_VERSION.to_string(),
            total_ports: self.registry.len(),
            output_count: output,
            input_count: input,
            uptime_seconds: self.uptime_seconds(),
            adopted: self.identity.adopted,
        }
    }

    pub fn status(&self) -> BoardStatus {
        BoardStatus {
            board_id: self.identity.id.clone(),
            online: self.platform.link_status().connected,
            uptime_seconds: self.uptime_seconds(),
            free_heap: self.platform.free_heap(),
            learning_active: self.learning.is_some_and(|s| !s.expired()),
        }
    }

    /// Ports in registry order with their pin capability.
    pub fn ports(&self) -> Vec<PortView> {
        self.registry
            .ports()
            .iter()
            .filter_map(|port| {
                self.registry.capability(port.gpio).map(|capability| PortView {
                    port: port.clone(),
                    capability,
                })
            })
            .collect()
    }

    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &BoardIdentity {
        &self.identity
    }

    pub fn ir_stats(&self) -> IrStats {
        self.manager.stats()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.booted_at.elapsed().as_secs()
    }
}
