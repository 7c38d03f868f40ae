// crates/telemetry-ingest-core/src/core/sql.rs
// ============================================================================
// Module: Telemetry Ingest SQL Text
// Description: Shared upsert statement text for SQL backends.
// Purpose: Keep conflict handling identical across persistence backends.
// Dependencies: crate::core::fact
// ============================================================================

//! ## Overview
//! Both SQL backends upsert with `INSERT ... ON CONFLICT`. Only the parameter
//! placeholder syntax differs, so the statement text is generated here from
//! the table descriptor and the effective conflict policy. Parameters bind in
//! key order (`time`, `run_id`, optional `metric`) followed by the value
//! columns in table order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use crate::core::fact::ConflictPolicy;
use crate::core::fact::FactTable;

// ============================================================================
// SECTION: Placeholders
// ============================================================================

/// Positional parameter syntax of a SQL backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `$1, $2, ...` (Postgres).
    Dollar,
    /// `?1, ?2, ...` (SQLite).
    Question,
}

impl Placeholder {
    /// Renders the placeholder for a 1-based parameter index.
    #[must_use]
    pub fn render(self, index: usize) -> String {
        match self {
            Self::Dollar => format!("${index}"),
            Self::Question => format!("?{index}"),
        }
    }
}

// ============================================================================
// SECTION: Statements
// ============================================================================

/// Builds the upsert statement for a table under a conflict policy.
#[must_use]
pub fn upsert_statement(table: FactTable, policy: ConflictPolicy, placeholder: Placeholder) -> String {
    let keys = table.key_columns();
    let values = table.value_columns();
    let columns: Vec<&str> = keys.iter().chain(values.iter()).copied().collect();
    let params: Vec<String> = (1..=columns.len()).map(|index| placeholder.render(index)).collect();

    let mut sql = String::new();
    let _ = write!(
        sql,
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({})",
        table.table_name(),
        columns.join(", "),
        params.join(", "),
        keys.join(", ")
    );
    match policy {
        ConflictPolicy::Ignore => sql.push_str(" DO NOTHING"),
        ConflictPolicy::Overwrite => {
            let assignments: Vec<String> =
                values.iter().map(|column| format!("{column} = EXCLUDED.{column}")).collect();
            let _ = write!(sql, " DO UPDATE SET {}", assignments.join(", "));
        }
    }
    sql
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
    fn ignore_statement_does_nothing_on_conflict() {
        let sql = upsert_statement(FactTable::SensorData, ConflictPolicy::Ignore, Placeholder::Dollar);
        assert_eq!(
            sql,
            "INSERT INTO sensor_data (time, run_id, metric, metric_value) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (time, run_id, metric) DO NOTHING"
        );
    }

    #[test]
    fn overwrite_statement_updates_every_value_column() {
        let sql = upsert_statement(FactTable::Control, ConflictPolicy::Overwrite, Placeholder::Question);
        assert_eq!(
            sql,
            "INSERT INTO control (time, run_id, throttle, steering_angle) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (time, run_id) DO UPDATE SET throttle = EXCLUDED.throttle, \
             steering_angle = EXCLUDED.steering_angle"
        );
    }
}
