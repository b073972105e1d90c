//! Mining driver configuration.
//!
//! Every toggle the driver honors is an explicit named field here; nothing is
//! read from globals. Connection target and credentials ride along so entry
//! points accept them as parameters, even though the network driver itself
//! lives behind the [`Connection`](crate::connection::Connection) seam.

use crate::error::{MinerError, Result};
use std::time::Duration;

/// Where the schema dictionary snapshot is written by `build_dictionary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionaryTarget {
    /// Snapshot schema metadata into the redo stream itself.
    RedoLogs,
    /// Write the dictionary to an external flat file on the server.
    FlatFile {
        /// Server directory object holding the dictionary file.
        directory: String,
        /// Dictionary file name.
        file_name: String,
    },
}

/// Dictionary source the mining engine resolves object names from while a
/// session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningStrategy {
    /// Read the dictionary embedded in the redo stream, tracking DDL.
    RedoLogDictionary,
    /// Resolve names from the live online catalog.
    OnlineCatalog,
}

/// Configuration for one mining session lifecycle.
///
/// `Debug` redacts the password so the struct can be logged safely.
#[derive(Clone)]
pub struct MinerConfig {
    /// Connection target (e.g. `//db1.example.com:1521/orcl`).
    pub url: String,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: Option<String>,
    /// Restrict selection to archived segments only.
    pub archive_only: bool,
    /// Only segments created within this window are eligible for selection.
    /// Zero means unrestricted.
    pub retention: Duration,
    /// Named archive destination to select from. `None` uses the first
    /// locally valid destination.
    pub destination: Option<String>,
    /// Where `build_dictionary` writes the schema snapshot.
    pub dictionary_target: DictionaryTarget,
    /// Dictionary source for the running session.
    pub strategy: MiningStrategy,
    /// Ask the engine to keep mining past the registered segment set.
    pub continuous_mining: bool,
    /// Extra fragments a reassembled record may span before it is truncated.
    pub max_continuation_rows: u32,
}

impl std::fmt::Debug for MinerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinerConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("archive_only", &self.archive_only)
            .field("retention", &self.retention)
            .field("destination", &self.destination)
            .field("dictionary_target", &self.dictionary_target)
            .field("strategy", &self.strategy)
            .field("continuous_mining", &self.continuous_mining)
            .field("max_continuation_rows", &self.max_continuation_rows)
            .finish()
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: None,
            archive_only: false,
            retention: Duration::ZERO,
            destination: None,
            dictionary_target: DictionaryTarget::RedoLogs,
            strategy: MiningStrategy::RedoLogDictionary,
            continuous_mining: false,
            max_continuation_rows: 9,
        }
    }
}

impl MinerConfig {
    /// Create a new builder.
    pub fn builder() -> MinerConfigBuilder {
        MinerConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(MinerError::config("connection url is required"));
        }
        if self.username.is_empty() {
            return Err(MinerError::config("username is required"));
        }
        if let Some(dest) = &self.destination {
            if dest.is_empty() {
                return Err(MinerError::config(
                    "archive destination name must not be empty when set",
                ));
            }
        }
        if let DictionaryTarget::FlatFile { directory, file_name } = &self.dictionary_target {
            if directory.is_empty() || file_name.is_empty() {
                return Err(MinerError::config(
                    "flat-file dictionary target needs a directory and a file name",
                ));
            }
        }
        Ok(())
    }
}

/// Builder for [`MinerConfig`].
#[derive(Default)]
pub struct MinerConfigBuilder {
    config: MinerConfig,
}

impl MinerConfigBuilder {
    /// Set the connection target.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Restrict selection to archived segments only (default: false).
    pub fn archive_only(mut self, archive_only: bool) -> Self {
        self.config.archive_only = archive_only;
        self
    }

    /// Limit selection to segments created within `retention` (default:
    /// zero, unrestricted). The filter is applied with hour granularity.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.retention = retention;
        self
    }

    /// Select from the named archive destination instead of the first
    /// locally valid one.
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.config.destination = Some(destination.into());
        self
    }

    /// Set where the dictionary snapshot is written (default: redo logs).
    pub fn dictionary_target(mut self, target: DictionaryTarget) -> Self {
        self.config.dictionary_target = target;
        self
    }

    /// Set the session dictionary source (default: redo log dictionary).
    pub fn strategy(mut self, strategy: MiningStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Enable continuous mining (default: false).
    pub fn continuous_mining(mut self, continuous: bool) -> Self {
        self.config.continuous_mining = continuous;
        self
    }

    /// Set how many extra fragments a record may span before truncation
    /// (default: 9).
    pub fn max_continuation_rows(mut self, rows: u32) -> Self {
        self.config.max_continuation_rows = rows;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<MinerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
