// crates/telemetry-ingest-cli/src/main.rs
// ============================================================================
// Module: Telemetry Ingest CLI Entry Point
// Description: Command dispatcher for ingestion, schema, and config workflows.
// Purpose: Run one ingestion job per invocation against the configured store.
// Dependencies: clap, telemetry-ingest-core, telemetry-ingest-config, stores
// ============================================================================

//! ## Overview
//! The `telemetry-ingest` binary loads configuration, builds the configured
//! store and event sink, and runs a single ingestion job. The job report is
//! printed as JSON on stdout. Fatal errors go to stderr with a failing exit
//! code; dropped messages are reported through the event sink and do not
//! fail the job.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use telemetry_ingest_config::EventSinkType;
use telemetry_ingest_config::EventsConfig;
use telemetry_ingest_config::StoreType;
use telemetry_ingest_config::TelemetryIngestConfig;
use telemetry_ingest_core::ConflictPolicies;
use telemetry_ingest_core::FactSink;
use telemetry_ingest_core::FileEventSink;
use telemetry_ingest_core::InMemoryFactStore;
use telemetry_ingest_core::IngestEventSink;
use telemetry_ingest_core::IngestPipeline;
use telemetry_ingest_core::IngestRequest;
use telemetry_ingest_core::McapOpener;
use telemetry_ingest_core::RunCatalog;
use telemetry_ingest_core::SchemaRegistry;
use telemetry_ingest_core::StderrEventSink;
use telemetry_ingest_store_postgres::PostgresFactStore;
use telemetry_ingest_store_sqlite::SqliteFactStore;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "telemetry-ingest", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest one recorded session into the configured store.
    Ingest(IngestCommand),
    /// Store schema utilities.
    Schema {
        /// Selected schema subcommand.
        #[command(subcommand)]
        command: SchemaCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
struct IngestCommand {
    /// Recorded session: an MCAP file or a bag directory holding one.
    #[arg(value_name = "LOG")]
    log: PathBuf,
    /// SLAM configuration label stored on the run.
    #[arg(long, value_name = "LABEL")]
    slam_type: Option<String>,
    /// Documentation link stored on the run.
    #[arg(long, value_name = "URL")]
    doc_url: Option<String>,
    /// Optional config file path (defaults to telemetry-ingest.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Schema subcommands.
#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Create missing tables, indexes, and hypertables.
    Init(ConfigArgs),
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate(ConfigArgs),
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to telemetry-ingest.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Ingest(command) => command_ingest(command),
        Commands::Schema {
            command: SchemaCommand::Init(args),
        } => command_schema_init(&args),
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
    }
}

// ============================================================================
// SECTION: Ingest Command
// ============================================================================

/// Executes the `ingest` command.
fn command_ingest(command: IngestCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let events = build_event_sink(&config.events)?;
    let request = IngestRequest {
        log_path: command.log,
        slam_type: command.slam_type,
        doc_url: command.doc_url,
    };
    let policies = config
        .conflict_policies()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    match config.store.store_type {
        StoreType::Memory => {
            ingest_into(InMemoryFactStore::with_policies(policies), events, &config, &request)
        }
        StoreType::Sqlite => {
            let store = SqliteFactStore::open(&config.store.sqlite_config(), policies)
                .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
            ingest_into(store, events, &config, &request)
        }
        StoreType::Postgres => {
            let store = PostgresFactStore::connect(&config.store.postgres_config(), policies)
                .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
            ingest_into(store, events, &config, &request)
        }
    }
}

/// Runs the pipeline over a constructed store and prints the report.
fn ingest_into<S>(
    store: S,
    events: Box<dyn IngestEventSink>,
    config: &TelemetryIngestConfig,
    request: &IngestRequest,
) -> CliResult<ExitCode>
where
    S: RunCatalog + FactSink,
{
    let registry = SchemaRegistry::vehicle_default()
        .map_err(|err| CliError::new(format!("invalid topic registry: {err}")))?;
    let pipeline = IngestPipeline::new(McapOpener::new(), store, events, registry)
        .with_run_types(config.run_type_rules());
    let report = pipeline
        .run(request)
        .map_err(|err| CliError::new(format!("ingest failed: {err}")))?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| CliError::new(format!("failed to render report: {err}")))?;
    write_stdout_line(&json).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the configured event sink.
fn build_event_sink(config: &EventsConfig) -> CliResult<Box<dyn IngestEventSink>> {
    match config.sink {
        EventSinkType::Stderr => Ok(Box::new(StderrEventSink::new(config.min_level))),
        EventSinkType::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| CliError::new("file event sink requires path"))?;
            let sink = FileEventSink::new(path, config.min_level).map_err(|err| {
                CliError::new(format!("failed to open event log {}: {err}", path.display()))
            })?;
            Ok(Box::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Schema Command
// ============================================================================

/// Executes the `schema init` command.
fn command_schema_init(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let message = match config.store.store_type {
        StoreType::Memory => "memory store needs no schema".to_string(),
        StoreType::Sqlite => {
            let sqlite = config.store.sqlite_config();
            SqliteFactStore::open(&sqlite, ConflictPolicies::new())
                .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
            format!("sqlite schema ready at {}", sqlite.path.display())
        }
        StoreType::Postgres => {
            let postgres = config.store.postgres_config();
            let store = PostgresFactStore::connect(&postgres, ConflictPolicies::new())
                .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
            store
                .provision_schema(postgres.timescale)
                .map_err(|err| CliError::new(format!("schema provisioning failed: {err}")))?;
            "postgres schema ready".to_string()
        }
    };
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = load_config(args.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<TelemetryIngestConfig> {
    TelemetryIngestConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
