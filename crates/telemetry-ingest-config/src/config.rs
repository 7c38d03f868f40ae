// crates/telemetry-ingest-config/src/config.rs
// ============================================================================
// Module: Telemetry Ingest Configuration
// Description: Configuration loading and validation for ingestion jobs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: telemetry-ingest-core, telemetry-ingest-store-*, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `TELEMETRY_INGEST_CONFIG`, then
//! `telemetry-ingest.toml` in the working directory. Only the implicit default
//! file may be absent, in which case built-in defaults apply. Invalid
//! configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use telemetry_ingest_core::ConflictPolicies;
use telemetry_ingest_core::ConflictPolicy;
use telemetry_ingest_core::EventLevel;
use telemetry_ingest_core::FactTable;
use telemetry_ingest_core::RunTypeRule;
use telemetry_ingest_core::RunTypeRules;
use telemetry_ingest_store_postgres::PostgresStoreConfig;
use telemetry_ingest_store_sqlite::SqliteStoreConfig;
use telemetry_ingest_store_sqlite::SqliteStoreMode;
use telemetry_ingest_store_sqlite::SqliteSyncMode;
use telemetry_ingest_store_sqlite::default_busy_timeout_ms;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "telemetry-ingest.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TELEMETRY_INGEST_CONFIG";
/// Default `SQLite` database path.
const DEFAULT_SQLITE_PATH: &str = "telemetry-ingest.db";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum Postgres pool size.
pub(crate) const MAX_POSTGRES_CONNECTIONS: u32 = 64;
/// Maximum timeout accepted for any store operation.
pub(crate) const MAX_STORE_TIMEOUT_MS: u64 = 600_000;
/// Maximum number of run type rules.
pub(crate) const MAX_RUN_TYPE_RULES: usize = 256;
/// Maximum length of a run type prefix or label.
pub(crate) const MAX_RUN_TYPE_TEXT_LENGTH: usize = 128;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Top-level ingestion configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryIngestConfig {
    /// Fact store selection.
    #[serde(default)]
    pub store: StoreConfig,
    /// Event sink selection.
    #[serde(default)]
    pub events: EventsConfig,
    /// Ordered run type rules replacing the built-in list when non-empty.
    #[serde(default)]
    pub run_types: Vec<RunTypeRule>,
    /// Conflict policy overrides keyed by fact table name.
    #[serde(default)]
    pub conflict_policies: BTreeMap<String, ConflictPolicy>,
}

impl TelemetryIngestConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated. A missing default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.events.validate()?;
        validate_run_types(&self.run_types)?;
        self.conflict_policies()?;
        Ok(())
    }

    /// Returns the run type rules, falling back to the built-in list.
    #[must_use]
    pub fn run_type_rules(&self) -> RunTypeRules {
        if self.run_types.is_empty() {
            RunTypeRules::default()
        } else {
            RunTypeRules::new(self.run_types.clone())
        }
    }

    /// Resolves the per-table conflict policy overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a key names no fact table.
    pub fn conflict_policies(&self) -> Result<ConflictPolicies, ConfigError> {
        self.conflict_policies.iter().try_fold(ConflictPolicies::new(), |policies, (name, policy)| {
            let table = FactTable::from_table_name(name).ok_or_else(|| {
                ConfigError::Invalid(format!("conflict_policies names unknown table: {name}"))
            })?;
            Ok(policies.with_override(table, *policy))
        })
    }
}

// ============================================================================
// SECTION: Store Config
// ============================================================================

/// Fact store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Keep facts in process memory for dry runs and tests.
    ///
    /// Nothing persists past the job; the report still counts every write.
    /// Takes neither `path` nor `connection`.
    Memory,
    /// Use the `SQLite`-backed durable store.
    #[default]
    Sqlite,
    /// Use the Postgres or `TimescaleDB` store.
    Postgres,
}

/// Fact store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Postgres connection string.
    #[serde(default)]
    pub connection: Option<String>,
    /// Postgres pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Postgres connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Postgres statement timeout in milliseconds, bounding each write.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    /// Provision `TimescaleDB` hypertables.
    #[serde(default = "default_timescale")]
    pub timescale: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            connection: None,
            max_connections: default_max_connections(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
            timescale: default_timescale(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() || self.connection.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path or connection".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                if self.connection.is_some() {
                    return Err(ConfigError::Invalid(
                        "sqlite store must not set connection".to_string(),
                    ));
                }
                if let Some(path) = &self.path {
                    validate_path_string("store.path", &path.to_string_lossy())?;
                }
                validate_timeout("store.busy_timeout_ms", self.busy_timeout_ms)
            }
            StoreType::Postgres => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("postgres store must not set path".to_string()));
                }
                let connection = self.connection.as_deref().map(str::trim).unwrap_or_default();
                if connection.is_empty() {
                    return Err(ConfigError::Invalid(
                        "postgres store requires connection".to_string(),
                    ));
                }
                if self.max_connections == 0 || self.max_connections > MAX_POSTGRES_CONNECTIONS {
                    return Err(ConfigError::Invalid(format!(
                        "store.max_connections must be between 1 and {MAX_POSTGRES_CONNECTIONS}"
                    )));
                }
                validate_timeout("store.connect_timeout_ms", self.connect_timeout_ms)?;
                validate_timeout("store.statement_timeout_ms", self.statement_timeout_ms)
            }
        }
    }

    /// Builds the `SQLite` store configuration.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        let path = self.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH));
        SqliteStoreConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }

    /// Builds the Postgres store configuration.
    #[must_use]
    pub fn postgres_config(&self) -> PostgresStoreConfig {
        let defaults = PostgresStoreConfig::default();
        PostgresStoreConfig {
            connection: self.connection.clone().unwrap_or(defaults.connection),
            max_connections: self.max_connections,
            connect_timeout_ms: self.connect_timeout_ms,
            statement_timeout_ms: self.statement_timeout_ms,
            timescale: self.timescale,
        }
    }
}

/// Default Postgres pool size.
fn default_max_connections() -> u32 {
    PostgresStoreConfig::default().max_connections
}

/// Default Postgres connect timeout.
fn default_connect_timeout_ms() -> u64 {
    PostgresStoreConfig::default().connect_timeout_ms
}

/// Default Postgres statement timeout.
fn default_statement_timeout_ms() -> u64 {
    PostgresStoreConfig::default().statement_timeout_ms
}

/// Hypertables are provisioned unless disabled.
const fn default_timescale() -> bool {
    true
}

// ============================================================================
// SECTION: Events Config
// ============================================================================

/// Event sink type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkType {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Event sink configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Sink type.
    #[serde(default)]
    pub sink: EventSinkType,
    /// Event log path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Lowest level written.
    #[serde(default = "default_min_level")]
    pub min_level: EventLevel,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            sink: EventSinkType::default(),
            path: None,
            min_level: default_min_level(),
        }
    }
}

impl EventsConfig {
    /// Validates event sink configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.sink {
            EventSinkType::Stderr => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "stderr event sink must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            EventSinkType::File => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("file event sink requires path".to_string())
                })?;
                validate_path_string("events.path", &path.to_string_lossy())
            }
        }
    }
}

/// Events at info and above are written by default.
const fn default_min_level() -> EventLevel {
    EventLevel::Info
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path, reporting whether it was chosen explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a timeout is positive and bounded.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_STORE_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_STORE_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Validates run type rules.
fn validate_run_types(rules: &[RunTypeRule]) -> Result<(), ConfigError> {
    if rules.len() > MAX_RUN_TYPE_RULES {
        return Err(ConfigError::Invalid("too many run_types entries".to_string()));
    }
    for rule in rules {
        if rule.prefix.trim().is_empty() || rule.label.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "run_types prefix and label must be non-empty".to_string(),
            ));
        }
        if rule.prefix.len() > MAX_RUN_TYPE_TEXT_LENGTH || rule.label.len() > MAX_RUN_TYPE_TEXT_LENGTH
        {
            return Err(ConfigError::Invalid("run_types entry exceeds max length".to_string()));
        }
    }
    Ok(())
}
