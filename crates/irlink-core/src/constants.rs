//! Constants shared across the irlink crates.
//!
//! Values that appear on the wire (HTTP port, persistence keys, schema
//! version) live here so every crate agrees on them.

// ============================================================================
// Firmware
// ============================================================================

/// Firmware version reported by `GET /info`.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default TCP port of the HTTP surface.
pub const HTTP_PORT: u16 = 80;

/// Service type under which the board advertises itself for discovery.
pub const MDNS_SERVICE: &str = "_http._tcp";

/// Maximum length of a board id in bytes.
///
/// The id doubles as the discovery host label, and DNS labels are limited to
/// 63 bytes.
pub const MAX_BOARD_ID_LENGTH: usize = 63;

// ============================================================================
// Port Registry
// ============================================================================

/// Maximum number of ports a registry can hold.
///
/// Pin tables larger than this are rejected at construction.
pub const MAX_PORTS: usize = 32;

// ============================================================================
// IR output test
// ============================================================================

/// Burst duration used by `POST /test_output` when the body omits one.
pub const DEFAULT_TEST_DURATION_MS: u32 = 500;

/// Longest accepted test burst; longer requests are clamped.
pub const MAX_TEST_DURATION_MS: u32 = 5000;

// ============================================================================
// IR learning
// ============================================================================

/// Session length used by `POST /learning/start` when the body omits one.
pub const DEFAULT_LEARNING_TIMEOUT_SECS: u32 = 10;

/// Accepted session lengths; requests outside are clamped.
pub const MIN_LEARNING_TIMEOUT_SECS: u32 = 5;
pub const MAX_LEARNING_TIMEOUT_SECS: u32 = 60;

// ============================================================================
// Persistence
// ============================================================================

/// Key of the structured configuration record.
pub const CONFIG_KEY: &str = "irlink.config";

/// Schema version written into the configuration record.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
