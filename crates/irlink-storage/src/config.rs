//! Configuration persistence adapter.
//!
//! The board identity and the port registry are stored as one JSON record
//! under [`CONFIG_KEY`]:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "board": { "id": "ir-ddeeff", "name": "IR Controller ddeeff", "adopted": false },
//!   "ports": [ { "gpio": 4, "mode": "ir_output", "name": "tv" } ],
//!   "saved_at": "2025-10-18T09:30:00Z"
//! }
//! ```
//!
//! Unknown fields are ignored and missing ones take defaults. Boards that
//! were last written by older firmware have one key per field instead
//! (`board_id`, `port_count`, `port_<i>_mode`, ...); [`ConfigRepository::load`]
//! reads that layout when the record is absent.
//!
//! Loading never fails. Anything unreadable is logged and replaced by a
//! default so the board always boots.

use chrono::{DateTime, Utc};
use irlink_core::constants::{CONFIG_KEY, CONFIG_SCHEMA_VERSION, MAX_PORTS};
use irlink_core::{BoardIdentity, Gpio, LoadIssue, PinTable, Port, PortMode, PortRegistry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StorageResult;
use crate::store::KeyValueStore;

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// The structured record.
    Stored,
    /// Per-field keys written by older firmware.
    Legacy,
    /// Nothing usable was stored.
    Defaults,
}

/// Result of [`ConfigRepository::load`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub identity: BoardIdentity,
    pub registry: PortRegistry,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Whether the structured record should be written right away.
    pub fn needs_save(&self) -> bool {
        self.source != ConfigSource::Stored
    }
}

// Every field is read on its own: a malformed value costs that field (or
// that port entry), never the rest of the record.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigRecord {
    #[serde(default, deserialize_with = "lenient")]
    schema_version: u32,
    #[serde(default, deserialize_with = "lenient")]
    board: StoredBoard,
    #[serde(default, deserialize_with = "lenient_ports")]
    ports: Vec<StoredPort>,
    #[serde(default, deserialize_with = "lenient")]
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredBoard {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    adopted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPort {
    #[serde(default)]
    gpio: u8,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default)]
    name: String,
}

fn default_mode() -> String {
    PortMode::Disabled.as_str().to_string()
}

/// Deserialize `T`, or its default if the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring malformed configuration field");
        T::default()
    }))
}

/// Deserialize the port list entry by entry, dropping malformed entries.
fn lenient_ports<'de, D>(deserializer: D) -> Result<Vec<StoredPort>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<Value> = lenient(deserializer)?;
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(port) => Some(port),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed persisted port");
                None
            }
        })
        .collect())
}

impl StoredBoard {
    fn resolve(self, fallback: &BoardIdentity) -> BoardIdentity {
        BoardIdentity {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| fallback.id.clone()),
            name: self.name.unwrap_or_else(|| fallback.name.clone()),
            adopted: self.adopted,
        }
    }
}

impl StoredPort {
    fn resolve(self) -> Port {
        let gpio = Gpio(self.gpio);
        let mode = self.mode.parse().unwrap_or_else(|_| {
            warn!(gpio = %gpio, mode = %self.mode, "Unknown persisted port mode, using disabled");
            PortMode::Disabled
        });
        Port::new(gpio, mode, self.name)
    }
}

/// Reads and writes the board configuration through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct ConfigRepository<S> {
    store: S,
}

impl<S: KeyValueStore> ConfigRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load identity and registry.
    ///
    /// `fallback` is the identity used for anything not stored, normally the
    /// one derived from the MAC address.
    pub async fn load(&self, pins: &PinTable, fallback: &BoardIdentity) -> LoadedConfig {
        let (board, ports, source) = match self.load_record().await {
            Some(record) => {
                if record.schema_version > CONFIG_SCHEMA_VERSION {
                    warn!(
                        schema_version = record.schema_version,
                        supported = CONFIG_SCHEMA_VERSION,
                        "Configuration written by newer firmware, reading known fields only"
                    );
                }
                (record.board, record.ports, ConfigSource::Stored)
            }
            None => self.load_legacy().await,
        };

        let identity = board.resolve(fallback);
        let persisted = ports.into_iter().map(StoredPort::resolve).collect();
        let (registry, issues) = PortRegistry::from_persisted(pins.clone(), persisted);
        log_issues(&issues);

        info!(
            source = ?source,
            board_id = %identity.id,
            adopted = identity.adopted,
            ports = registry.len(),
            "Configuration loaded"
        );

        LoadedConfig {
            identity,
            registry,
            source,
        }
    }

    /// Write the structured record.
    pub async fn save(
        &self,
        identity: &BoardIdentity,
        registry: &PortRegistry,
    ) -> StorageResult<()> {
        let record = ConfigRecord {
            schema_version: CONFIG_SCHEMA_VERSION,
            board: StoredBoard {
                id: Some(identity.id.clone()),
                name: Some(identity.name.clone()),
                adopted: identity.adopted,
            },
            ports: registry
                .ports()
                .iter()
                .map(|p| StoredPort {
                    gpio: p.gpio.number(),
                    mode: p.mode.as_str().to_string(),
                    name: p.name.clone(),
                })
                .collect(),
            saved_at: Some(Utc::now()),
        };

        let json = serde_json::to_string(&record)?;
        self.store.put(CONFIG_KEY, &json).await?;
        debug!(bytes = json.len(), "Configuration saved");
        Ok(())
    }

    async fn load_record(&self) -> Option<ConfigRecord> {
        let raw = match self.store.get(CONFIG_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read configuration record");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Corrupt configuration record, ignoring it");
                None
            }
        }
    }

    async fn load_legacy(&self) -> (StoredBoard, Vec<StoredPort>, ConfigSource) {
        let board_id = self.read_key("board_id").await;
        let board_name = self.read_key("board_name").await;
        let adopted = self.read_key("adopted").await;
        let stored_count = self
            .read_key("port_count")
            .await
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let count = usize::try_from(stored_count).map_or(MAX_PORTS, |n| n.min(MAX_PORTS));
        if stored_count > count as u64 {
            warn!(
                port_count = stored_count,
                max = MAX_PORTS,
                "Legacy port count exceeds board capacity, reading the first entries only"
            );
        }

        let mut ports = Vec::with_capacity(count);
        for i in 0..count {
            let gpio = self
                .read_key(&format!("port_{i}_gpio"))
                .await
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            let mode = self
                .read_key(&format!("port_{i}_mode"))
                .await
                .unwrap_or_else(default_mode);
            let name = self
                .read_key(&format!("port_{i}_name"))
                .await
                .unwrap_or_default();
            ports.push(StoredPort { gpio, mode, name });
        }

        let found_any =
            board_id.is_some() || board_name.is_some() || adopted.is_some() || count > 0;
        let source = if found_any {
            ConfigSource::Legacy
        } else {
            ConfigSource::Defaults
        };

        let board = StoredBoard {
            id: board_id,
            name: board_name,
            adopted: adopted.is_some_and(|v| parse_flag(&v)),
        };
        (board, ports, source)
    }

    async fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read legacy setting");
                None
            }
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True")
}

fn log_issues(issues: &[LoadIssue]) {
    for issue in issues {
        match issue {
            LoadIssue::UnknownPin(gpio) => {
                warn!(gpio = %gpio, "Skipping persisted port for a pin this board does not have");
            }
            LoadIssue::DuplicatePin(gpio) => {
                warn!(gpio = %gpio, "Skipping duplicate persisted port");
            }
            LoadIssue::OutputOnInputOnly(gpio) => {
                warn!(gpio = %gpio, "Persisted IR output on input-only pin, disabling it");
            }
            LoadIssue::MissingPin(gpio) => {
                debug!(gpio = %gpio, "Adding disabled port for pin missing from configuration");
            }
        }
    }
}
