//! Core domain types for the irlink IR transceiver.
//!
//! This crate holds everything that does not touch hardware, storage or the
//! network: the pin capability table of each supported board, the port model,
//! the [`PortRegistry`] that is the single source of truth for pin
//! assignments, and the board identity with its one-way adoption state.

pub mod constants;
pub mod error;
pub mod identity;
pub mod pins;
pub mod port;
pub mod registry;

pub use error::{Error, Result};
pub use identity::{AdoptionState, BoardIdentity, MacAddress, validate_board_id};
pub use pins::{BoardVariant, Gpio, PinCapability, PinTable};
pub use port::{Port, PortMode};
pub use registry::{LoadIssue, ModeCounts, PortRegistry};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
