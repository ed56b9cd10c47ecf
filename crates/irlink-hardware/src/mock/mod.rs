//! Simulated IR backend for testing and development.
//!
//! This module provides a backend whose transmitters and receivers live on a
//! shared in-process bus, so tests can inject received frames and inspect
//! what was transmitted without any hardware.

pub mod ir;

// Re-export commonly used types
pub use ir::{
    EMISSION_LOG_DEPTH, Emission, MockIrBackend, MockIrHandle, MockIrReceiver, MockIrTransmitter,
};
