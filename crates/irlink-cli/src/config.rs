//! Daemon configuration.
//!
//! Values are layered: command line (and `IRLINK_*` environment variables)
//! over an optional TOML file over built-in defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use irlink_core::constants::HTTP_PORT;
use irlink_core::{BoardVariant, MacAddress};
use serde::Deserialize;

/// Selects the volatile store instead of a SQLite file.
pub const MEMORY_DATABASE: &str = ":memory:";

pub const DEFAULT_DATABASE_PATH: &str = "irlink.db";
pub const DEFAULT_MAC_ADDRESS: &str = "02:00:00:00:00:01";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// IR transceiver board daemon.
#[derive(Debug, Parser)]
#[command(name = "irlinkd", version, about)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "IRLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTTP listen address
    #[arg(long, env = "IRLINK_BIND_ADDR")]
    pub bind_addr: Option<SocketAddr>,

    /// SQLite database file, or `:memory:`
    #[arg(long, env = "IRLINK_DATABASE_PATH")]
    pub database_path: Option<String>,

    /// Board pin layout (esp32-poe-iso, esp32-devkit)
    #[arg(long, env = "IRLINK_BOARD_VARIANT")]
    pub board_variant: Option<BoardVariant>,

    /// MAC address the board identity is derived from
    #[arg(long, env = "IRLINK_MAC_ADDRESS")]
    pub mac_address: Option<String>,

    /// IP address reported by /info
    #[arg(long, env = "IRLINK_IP_ADDRESS")]
    pub ip_address: Option<IpAddr>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "IRLINK_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// The settings given on the command line, as a layer.
    pub fn overrides(&self) -> FileConfig {
        FileConfig {
            bind_addr: self.bind_addr,
            database_path: self.database_path.clone(),
            board_variant: self.board_variant,
            mac_address: self.mac_address.clone(),
            ip_address: self.ip_address,
            log_level: self.log_level.clone(),
        }
    }
}

/// Contents of the TOML file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub bind_addr: Option<SocketAddr>,
    pub database_path: Option<String>,
    pub board_variant: Option<BoardVariant>,
    pub mac_address: Option<String>,
    pub ip_address: Option<IpAddr>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Values from `over` win where present.
    pub fn layer(self, over: FileConfig) -> FileConfig {
        FileConfig {
            bind_addr: over.bind_addr.or(self.bind_addr),
            database_path: over.database_path.or(self.database_path),
            board_variant: over.board_variant.or(self.board_variant),
            mac_address: over.mac_address.or(self.mac_address),
            ip_address: over.ip_address.or(self.ip_address),
            log_level: over.log_level.or(self.log_level),
        }
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub board_variant: BoardVariant,
    pub mac_address: MacAddress,
    pub ip_address: Option<IpAddr>,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(config: FileConfig) -> anyhow::Result<Self> {
        let mac = config
            .mac_address
            .as_deref()
            .unwrap_or(DEFAULT_MAC_ADDRESS);
        let mac_address = MacAddress::parse(mac).context("invalid mac_address")?;

        Ok(Self {
            bind_addr: config
                .bind_addr
                .unwrap_or(SocketAddr::from((Ipv4Addr::UNSPECIFIED, HTTP_PORT))),
            database_path: config
                .database_path
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            board_variant: config.board_variant.unwrap_or_default(),
            mac_address,
            ip_address: config.ip_address,
            log_level: config
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_path == MEMORY_DATABASE
    }
}
