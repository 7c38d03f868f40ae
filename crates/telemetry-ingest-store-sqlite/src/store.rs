// crates/telemetry-ingest-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Fact Store
// Description: Durable RunCatalog and FactSink backed by SQLite.
// Purpose: Persist runs and per-table facts with conflict-aware upserts.
// Dependencies: telemetry-ingest-core, rusqlite, serde, thiserror, time
// ============================================================================

//! ## Overview
//! [`SqliteFactStore`] holds one connection for its whole lifetime. The
//! schema is created on open and versioned through a `store_meta` row. Every
//! run insert and every fact upsert is its own transaction, so a failed write
//! leaves no partial row. Run bounds are stored as RFC 3339 UTC text. Fact
//! `time` keys are stored as integer nanoseconds since the Unix epoch, so the
//! `(run_id, time)` index orders rows by instant for time-range retrieval.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use telemetry_ingest_core::ConflictPolicies;
use telemetry_ingest_core::FactKey;
use telemetry_ingest_core::FactSink;
use telemetry_ingest_core::FactTable;
use telemetry_ingest_core::NewRun;
use telemetry_ingest_core::Placeholder;
use telemetry_ingest_core::ReferenceTable;
use telemetry_ingest_core::RunCatalog;
use telemetry_ingest_core::RunId;
use telemetry_ingest_core::SinkError;
use telemetry_ingest_core::WriteOutcome;
use telemetry_ingest_core::WriteRequest;
use telemetry_ingest_core::format_rfc3339;
use telemetry_ingest_core::parse_rfc3339;
use telemetry_ingest_core::upsert_statement;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 2;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` fact store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
#[must_use]
pub const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Constraint violation, such as a fact without its run.
    #[error("sqlite store integrity violation: {0}")]
    Integrity(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for SinkError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Db(message)
            }
            SqliteStoreError::Integrity(message) => Self::Integrity(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps an engine error, separating constraint violations.
fn db_error(err: &rusqlite::Error) -> SqliteStoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => SqliteStoreError::Integrity(err.to_string()),
        _ => SqliteStoreError::Db(err.to_string()),
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed run catalog and fact sink.
#[derive(Debug)]
pub struct SqliteFactStore {
    /// Connection held for the store lifetime.
    connection: Mutex<Connection>,
    /// Conflict policies applied on upsert.
    policies: ConflictPolicies,
}

impl SqliteFactStore {
    /// Opens the store, creating the schema when absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid, the database
    /// cannot be opened, or an existing schema has another version.
    pub fn open(config: &SqliteStoreConfig, policies: ConflictPolicies) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            policies,
        })
    }

    /// Returns the conflict policies in effect.
    #[must_use]
    pub const fn policies(&self) -> &ConflictPolicies {
        &self.policies
    }

    /// Acquires the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Loads a run row.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or stored instants
    /// cannot be parsed.
    pub fn run(&self, run_id: RunId) -> Result<Option<NewRun>, SqliteStoreError> {
        let guard = self.lock()?;
        let row = guard
            .query_row(
                "SELECT run_name, start_time, end_time, slam_type, log_path, run_type, doc_url
                 FROM runs WHERE run_id = ?1",
                params![run_id.get()],
                |row| {
                    Ok(RunRow {
                        run_name: row.get(0)?,
                        start_time: row.get(1)?,
                        end_time: row.get(2)?,
                        slam_type: row.get(3)?,
                        log_path: row.get(4)?,
                        run_type: row.get(5)?,
                        doc_url: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(|err| db_error(&err))?;
        row.map(RunRow::into_run).transpose()
    }

    /// Returns the number of runs.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn run_count(&self) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        count(&guard, "SELECT COUNT(1) FROM runs")
    }

    /// Loads the value columns stored under a key, in table order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn fact(&self, table: FactTable, key: &FactKey) -> Result<Option<Vec<f64>>, SqliteStoreError> {
        let columns = table.value_columns();
        let mut sql = format!("SELECT {} FROM {} WHERE time = ?1 AND run_id = ?2", columns.join(", "), table.table_name());
        let mut values = vec![Value::Integer(instant_nanos(key.time)?), Value::Integer(key.run_id.get())];
        if let Some(metric) = key.metric {
            sql.push_str(" AND metric = ?3");
            values.push(Value::Text(metric.to_string()));
        }
        let guard = self.lock()?;
        guard
            .query_row(&sql, params_from_iter(values.iter()), |row| {
                (0 .. columns.len()).map(|index| row.get::<_, f64>(index)).collect::<rusqlite::Result<Vec<f64>>>()
            })
            .optional()
            .map_err(|err| db_error(&err))
    }

    /// Returns the fact instants of one run within `[from, to]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails or a stored key is
    /// not a representable instant.
    pub fn fact_times(
        &self,
        table: FactTable,
        run_id: RunId,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<OffsetDateTime>, SqliteStoreError> {
        let sql = format!(
            "SELECT time FROM {} WHERE run_id = ?1 AND time BETWEEN ?2 AND ?3 ORDER BY time",
            table.table_name()
        );
        let guard = self.lock()?;
        let mut statement = guard.prepare(&sql).map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(params![run_id.get(), instant_nanos(from)?, instant_nanos(to)?], |row| row.get::<_, i64>(0))
            .map_err(|err| db_error(&err))?;
        rows.map(|row| row.map_err(|err| db_error(&err)).and_then(nanos_instant)).collect()
    }

    /// Returns the number of rows in a fact table.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn fact_count(&self, table: FactTable) -> Result<u64, SqliteStoreError> {
        let guard = self.lock()?;
        count(&guard, &format!("SELECT COUNT(1) FROM {}", table.table_name()))
    }
}

impl RunCatalog for SqliteFactStore {
    fn create_run(&self, run: &NewRun) -> Result<RunId, SinkError> {
        let start_time = instant_text(run.start_time)?;
        let end_time = run.end_time.map(instant_text).transpose()?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        tx.execute(
            "INSERT INTO runs (run_name, start_time, end_time, slam_type, log_path, run_type, doc_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.run_name,
                start_time,
                end_time,
                run.slam_type,
                run.log_path,
                run.run_type,
                run.doc_url
            ],
        )
        .map_err(|err| db_error(&err))?;
        let run_id = tx.last_insert_rowid();
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(RunId::new(run_id))
    }
}

impl FactSink for SqliteFactStore {
    fn upsert(&self, request: &WriteRequest) -> Result<WriteOutcome, SinkError> {
        let values = request.ordered_values()?;
        let mut bound = Vec::with_capacity(values.len() + 3);
        bound.push(Value::Integer(instant_nanos(request.key.time)?));
        bound.push(Value::Integer(request.key.run_id.get()));
        if let Some(metric) = request.key.metric {
            bound.push(Value::Text(metric.to_string()));
        }
        bound.extend(values.into_iter().map(Value::Real));
        let sql = upsert_statement(request.table, self.policies.policy_for(request.table), Placeholder::Question);

        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| db_error(&err))?;
        let changed = {
            let mut statement = tx.prepare_cached(&sql).map_err(|err| db_error(&err))?;
            statement.execute(params_from_iter(bound.iter())).map_err(|err| db_error(&err))?
        };
        tx.commit().map_err(|err| db_error(&err))?;
        Ok(if changed == 0 { WriteOutcome::Ignored } else { WriteOutcome::Written })
    }
}

/// Raw run row as stored.
struct RunRow {
    /// Run name.
    run_name: String,
    /// RFC 3339 start instant.
    start_time: String,
    /// RFC 3339 end instant.
    end_time: Option<String>,
    /// SLAM label.
    slam_type: Option<String>,
    /// Source log path.
    log_path: String,
    /// Run type label.
    run_type: String,
    /// Documentation link.
    doc_url: Option<String>,
}

impl RunRow {
    /// Parses stored instants into a run.
    fn into_run(self) -> Result<NewRun, SqliteStoreError> {
        let start_time = parse_rfc3339(&self.start_time).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        let end_time = self
            .end_time
            .as_deref()
            .map(parse_rfc3339)
            .transpose()
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        Ok(NewRun {
            run_name: self.run_name,
            start_time,
            end_time,
            slam_type: self.slam_type,
            log_path: self.log_path,
            run_type: self.run_type,
            doc_url: self.doc_url,
        })
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Returns the DDL for every table and index.
#[must_use]
pub fn schema_ddl() -> String {
    let mut ddl = String::from(
        "CREATE TABLE IF NOT EXISTS runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_name TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT,
            slam_type TEXT,
            log_path TEXT NOT NULL,
            run_type TEXT NOT NULL,
            doc_url TEXT
        );\n",
    );
    for table in FactTable::ALL {
        let name = table.table_name();
        let mut columns = vec![
            "time INTEGER NOT NULL".to_string(),
            "run_id INTEGER NOT NULL REFERENCES runs(run_id)".to_string(),
        ];
        if table.is_metric_keyed() {
            columns.push("metric TEXT NOT NULL".to_string());
        }
        columns.extend(table.value_columns().iter().map(|column| format!("{column} REAL NOT NULL")));
        let _ = writeln!(
            ddl,
            "CREATE TABLE IF NOT EXISTS {name} ({}, PRIMARY KEY ({}));",
            columns.join(", "),
            table.key_columns().join(", ")
        );
        let _ = writeln!(ddl, "CREATE INDEX IF NOT EXISTS idx_{name}_run_time ON {name} (run_id, time);");
    }
    for table in ReferenceTable::ALL {
        let columns = match table {
            ReferenceTable::VehicleData => "start_time TEXT NOT NULL, end_time TEXT, vehicle_name TEXT, \
                                            gear_ratio REAL, tire_type TEXT, tire_pressure REAL"
                .to_string(),
            _ => "run_id INTEGER NOT NULL REFERENCES runs(run_id), param_1 INTEGER NOT NULL, param_2 INTEGER NOT NULL"
                .to_string(),
        };
        let _ = writeln!(
            ddl,
            "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {columns});",
            table.table_name(),
            table.id_column()
        );
    }
    ddl
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| db_error(&err))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| db_error(&err))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| db_error(&err))?;
            tx.execute_batch(&schema_ddl()).map_err(|err| db_error(&err))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!("unsupported schema version: {value}")));
        }
    }
    tx.commit().map_err(|err| db_error(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats an instant for storage.
fn instant_text(instant: OffsetDateTime) -> Result<String, SqliteStoreError> {
    format_rfc3339(instant).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Converts a fact instant to its stored nanosecond key.
fn instant_nanos(instant: OffsetDateTime) -> Result<i64, SqliteStoreError> {
    i64::try_from(instant.unix_timestamp_nanos())
        .map_err(|_| SqliteStoreError::Invalid(format!("instant out of range: {instant}")))
}

/// Converts a stored nanosecond key back to an instant.
fn nanos_instant(nanos: i64) -> Result<OffsetDateTime, SqliteStoreError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Runs a `COUNT` query.
fn count(connection: &Connection, sql: &str) -> Result<u64, SqliteStoreError> {
    let total: i64 = connection.query_row(sql, params![], |row| row.get(0)).map_err(|err| db_error(&err))?;
    u64::try_from(total).map_err(|_| SqliteStoreError::Invalid(format!("negative row count: {total}")))
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid("store path contains an overlong component".to_string()));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability and integrity.
fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| db_error(&err))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use super::*;

    #[test]
    fn schema_declares_every_table_with_index() {
        let ddl = schema_ddl();
        for table in FactTable::ALL {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table.table_name())));
            assert!(ddl.contains(&format!("idx_{}_run_time", table.table_name())));
        }
        for table in ReferenceTable::ALL {
            assert!(ddl.contains(&format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", table.id_column())));
        }
        assert!(ddl.contains("PRIMARY KEY (time, run_id, metric)"));
        assert!(ddl.contains("time INTEGER NOT NULL"));
    }

    #[test]
    fn version_mismatch_maps_to_db_sink_error() {
        let sink: SinkError = SqliteStoreError::VersionMismatch("unsupported schema version: 9".to_string()).into();
        assert!(matches!(sink, SinkError::Db(_)));
    }

    #[test]
    fn directory_path_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = validate_store_path(dir.path()).expect_err("directory");
        assert!(matches!(err, SqliteStoreError::Invalid(_)));
    }
}
