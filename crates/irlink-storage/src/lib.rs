//! Persistence layer for irlink.
//!
//! Provides the durable key-value store the board writes its configuration
//! to, and the adapter that maps the board identity and port registry onto
//! it.
//!
//! - [`connection`]: SQLite pool with WAL journaling and embedded migrations.
//! - [`store`]: the [`KeyValueStore`] trait with SQLite and in-memory
//!   implementations.
//! - [`config`]: [`ConfigRepository`], the versioned configuration record
//!   and the reader for the legacy per-field layout.
//!
//! # Example
//!
//! ```no_run
//! use irlink_core::{BoardIdentity, BoardVariant, MacAddress};
//! use irlink_storage::{ConfigRepository, Database, DatabaseConfig, SqliteKeyValueStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("irlink.db")).await?;
//! let repo = ConfigRepository::new(SqliteKeyValueStore::new(db));
//!
//! let mac = MacAddress::parse("02:00:00:00:00:01")?;
//! let fallback = BoardIdentity::derive_from_mac(&mac);
//! let loaded = repo.load(&BoardVariant::Esp32PoeIso.pin_table(), &fallback).await;
//! if loaded.needs_save() {
//!     repo.save(&loaded.identity, &loaded.registry).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod store;

pub use config::{ConfigRepository, ConfigSource, LoadedConfig};
pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use store::{AnyKeyValueStore, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
