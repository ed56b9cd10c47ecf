//! Board orchestration for irlink.
//!
//! This crate ties the port registry, the IR resource manager and the
//! configuration store together into a [`BoardController`], and defines the
//! two remaining seams of the board: service discovery and platform
//! information.

pub mod controller;
pub mod discovery;
pub mod error;
pub mod platform;

pub use controller::{
    BoardController, BoardInfo, BoardStatus, BootConfig, LearningStatus, PortView,
};
pub use discovery::{DiscoveryEvent, LoggingAdvertiser, RecordingAdvertiser, ServiceAdvertiser};
pub use error::{ControllerError, Result};
pub use platform::{HostPlatform, LinkStatus, Platform};
