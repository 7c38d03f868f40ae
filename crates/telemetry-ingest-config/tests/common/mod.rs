// crates/telemetry-ingest-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across telemetry-ingest-config test suites.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;

use tempfile::NamedTempFile;
use telemetry_ingest_config::ConfigError;
use telemetry_ingest_config::TelemetryIngestConfig;

/// Parses a TOML string into a `TelemetryIngestConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<TelemetryIngestConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<TelemetryIngestConfig, toml::de::Error> {
    config_from_toml("")
}

/// Writes bytes to a temporary file and loads it as configuration.
pub fn load_bytes(bytes: &[u8]) -> Result<TelemetryIngestConfig, ConfigError> {
    let mut file = NamedTempFile::new().map_err(|err| ConfigError::Io(err.to_string()))?;
    file.write_all(bytes).map_err(|err| ConfigError::Io(err.to_string()))?;
    TelemetryIngestConfig::load(Some(file.path()))
}

/// Checks that a result failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
