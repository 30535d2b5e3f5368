//! Name-keyed registry of process specs and live records.

use std::collections::HashMap;
use std::sync::Arc;

use foreman_common::SupervisorResult;
use parking_lot::RwLock;
use tracing::debug;

use crate::record::{validate_process_name, ProcessRecord, ProcessSpec};

#[derive(Debug, Default)]
struct Inner {
    specs: HashMap<String, ProcessSpec>,
    records: HashMap<String, Arc<ProcessRecord>>,
}

/// Registry mapping process names to their specs and runtime records.
///
/// The registry lock is held only for map access; all per-process state
/// lives behind each record's own mutex, so registry reads never block on a
/// slow process operation.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    inner: RwLock<Inner>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec under its name, replacing any previous registration.
    ///
    /// Overwriting installs a fresh record (idle, empty output log); a live
    /// child from the replaced registration keeps running but is no longer
    /// reachable through the registry. The command is not checked for
    /// existence here, launch failures surface from `start`.
    pub fn register(&self, spec: ProcessSpec) -> SupervisorResult<()> {
        validate_process_name(&spec.name)?;

        let name = spec.name.clone();
        let mut inner = self.inner.write();
        let replaced = inner.specs.insert(name.clone(), spec).is_some();
        inner
            .records
            .insert(name.clone(), Arc::new(ProcessRecord::new(&name)));

        debug!(process = %name, replaced, "process registered");
        Ok(())
    }

    /// Snapshot of registered names. Order is insignificant.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().specs.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().specs.contains_key(name)
    }

    /// The spec and record for `name`, if registered.
    pub fn lookup(&self, name: &str) -> Option<(ProcessSpec, Arc<ProcessRecord>)> {
        let inner = self.inner.read();
        let spec = inner.specs.get(name)?.clone();
        let record = inner.records.get(name)?.clone();
        Some((spec, record))
    }
}
