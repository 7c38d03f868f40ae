// crates/telemetry-ingest-core/src/runtime/store.rs
// ============================================================================
// Module: Telemetry Ingest In-Memory Store
// Description: In-memory run catalog and fact sink for tests and demos.
// Purpose: Provide the persistence contract without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of [`RunCatalog`] and
//! [`FactSink`]. It enforces the same contract as the SQL backends: requests
//! are validated before storage, every fact must reference an existing run,
//! and conflicts follow the per-table policy. It is not intended for
//! production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::ConflictPolicies;
use crate::core::ConflictPolicy;
use crate::core::FactKey;
use crate::core::FactTable;
use crate::core::NewRun;
use crate::core::RunId;
use crate::core::WriteOutcome;
use crate::core::WriteRequest;
use crate::interfaces::FactSink;
use crate::interfaces::RunCatalog;
use crate::interfaces::SinkError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Stored state behind the mutex.
#[derive(Debug, Default)]
struct StoreState {
    /// Last generated run identifier.
    last_run_id: i64,
    /// Runs keyed by identifier.
    runs: BTreeMap<RunId, NewRun>,
    /// Fact values in column order, keyed by table and row key.
    facts: BTreeMap<(FactTable, FactKey), Vec<f64>>,
}

/// In-memory run catalog and fact sink.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFactStore {
    /// Shared state protected by a mutex.
    state: Arc<Mutex<StoreState>>,
    /// Effective conflict policies.
    policies: ConflictPolicies,
}

impl InMemoryFactStore {
    /// Creates a store with the built-in conflict policies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with explicit conflict policies.
    #[must_use]
    pub fn with_policies(policies: ConflictPolicies) -> Self {
        Self {
            state: Arc::default(),
            policies,
        }
    }

    /// Returns a stored run.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] when the store mutex is poisoned.
    pub fn run(&self, run_id: RunId) -> Result<Option<NewRun>, SinkError> {
        Ok(self.lock()?.runs.get(&run_id).cloned())
    }

    /// Returns the number of stored runs.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] when the store mutex is poisoned.
    pub fn run_count(&self) -> Result<usize, SinkError> {
        Ok(self.lock()?.runs.len())
    }

    /// Returns the stored values of one fact row, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] when the store mutex is poisoned.
    pub fn fact(&self, table: FactTable, key: &FactKey) -> Result<Option<Vec<f64>>, SinkError> {
        Ok(self.lock()?.facts.get(&(table, key.clone())).cloned())
    }

    /// Returns the number of rows stored in a table.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] when the store mutex is poisoned.
    pub fn fact_count(&self, table: FactTable) -> Result<usize, SinkError> {
        Ok(self.lock()?.facts.keys().filter(|(stored, _)| *stored == table).count())
    }

    /// Returns the number of rows stored across all tables.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] when the store mutex is poisoned.
    pub fn total_facts(&self) -> Result<usize, SinkError> {
        Ok(self.lock()?.facts.len())
    }

    /// Locks the shared state.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, SinkError> {
        self.state.lock().map_err(|_| SinkError::Closed("fact store mutex poisoned".to_string()))
    }
}

impl RunCatalog for InMemoryFactStore {
    fn create_run(&self, run: &NewRun) -> Result<RunId, SinkError> {
        let mut guard = self.lock()?;
        let next = guard
            .last_run_id
            .checked_add(1)
            .ok_or_else(|| SinkError::Db("run id sequence exhausted".to_string()))?;
        guard.last_run_id = next;
        let run_id = RunId::new(next);
        guard.runs.insert(run_id, run.clone());
        Ok(run_id)
    }
}

impl FactSink for InMemoryFactStore {
    fn upsert(&self, request: &WriteRequest) -> Result<WriteOutcome, SinkError> {
        let values = request.ordered_values()?;
        let mut guard = self.lock()?;
        if !guard.runs.contains_key(&request.key.run_id) {
            return Err(SinkError::Integrity(format!(
                "{} references missing run {}",
                request.table, request.key.run_id
            )));
        }
        let key = (request.table, request.key.clone());
        let exists = guard.facts.contains_key(&key);
        match (exists, self.policies.policy_for(request.table)) {
            (true, ConflictPolicy::Ignore) => Ok(WriteOutcome::Ignored),
            _ => {
                guard.facts.insert(key, values);
                Ok(WriteOutcome::Written)
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
