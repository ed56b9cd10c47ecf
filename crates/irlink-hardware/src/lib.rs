//! IR hardware abstraction layer for irlink.
//!
//! This crate owns everything that touches the IR peripherals:
//!
//! - [`traits`]: the transmitter / receiver / backend seam.
//! - [`manager::IrResourceManager`]: lifecycle of bound handles, the
//!   single-receiver rule, send / test / poll operations.
//! - [`mock`]: a simulated backend used by tests and by `irlinkd` on a host.
//! - [`devices`]: enum dispatch over the available backends.
//!
//! # Thread Safety
//!
//! Backends and handles are `Send`. The manager itself is not shared; the
//! controller that owns it sits behind a single async mutex.

pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use manager::{IrResourceManager, IrStats, SendOutcome};
pub use traits::{IrBackend, IrReceiver, IrTransmitter};
pub use types::{IrCode, IrProtocol, parse_code_value};
