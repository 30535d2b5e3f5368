//! Process specs and live per-process records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use foreman_common::{SupervisorError, SupervisorResult};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::output::OutputLog;

/// How to launch one named process. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Unique key for every supervisor operation.
    pub name: String,
    /// Executable path or name resolved via PATH.
    pub command: String,
    /// Baseline arguments; callers of `start` may append, never replace.
    pub args: Vec<String>,
    /// Working directory for the child; inherited when `None`.
    pub work_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }
}

/// Validate a process name for registration.
///
/// Names key registry maps and become directory names for process data, so
/// they are restricted to alphanumerics, hyphens, and underscores.
pub fn validate_process_name(name: &str) -> SupervisorResult<()> {
    if name.is_empty() {
        return Err(SupervisorError::invalid_name(name, "name cannot be empty"));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return Err(SupervisorError::invalid_name(
            name,
            "only alphanumeric characters, hyphens, and underscores are allowed",
        ));
    }

    Ok(())
}

/// Mutable side of a [`ProcessRecord`], guarded by the record mutex.
///
/// The mutex serializes start, stop, status, and output appends for one
/// record; operations on different records never contend.
#[derive(Debug, Default)]
pub struct RecordState {
    /// PID of the most recently spawned child. Retained after exit so status
    /// liveness checks and diagnostics can still refer to it.
    pub pid: Option<u32>,
    /// True from a successful spawn until the exit is observed (by the exit
    /// watcher, a stop call, or a status liveness probe).
    pub running: bool,
    /// Captured, tagged child output. Grows only; a fresh record starts
    /// empty, so re-registration is the only way to clear it.
    pub output: OutputLog,
    pub started_at: Option<DateTime<Utc>>,
    /// Receives `true` exactly once per launch, when the child is reaped.
    pub exit_rx: Option<watch::Receiver<bool>>,
    /// Monotonic launch counter. Background tasks capture the value at spawn
    /// and only mutate the record while it still matches, so a watcher from
    /// an earlier launch cannot clobber the state of a later one.
    pub generation: u64,
    /// Reader and watcher tasks for this record, joined or aborted by
    /// `Supervisor::release_resources`.
    pub tasks: Vec<JoinHandle<()>>,
}

/// One supervised process: a name plus lock-guarded runtime state.
///
/// Shared as `Arc<ProcessRecord>` between the registry, the supervisor, and
/// the background tasks belonging to the current launch.
#[derive(Debug)]
pub struct ProcessRecord {
    name: String,
    state: Mutex<RecordState>,
}

impl ProcessRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(RecordState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &Mutex<RecordState> {
        &self.state
    }

    /// Append one tagged line of child output.
    pub async fn append_output(&self, tag: &str, line: &str) {
        let mut state = self.state.lock().await;
        state.output.push_line(tag, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_pass() {
        for name in ["fileserver", "web-ui", "job_runner", "svc2"] {
            assert!(validate_process_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "has space", "../escape", "a/b", "dot.dot"] {
            let err = validate_process_name(name).unwrap_err();
            assert!(matches!(err, SupervisorError::InvalidName { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn fresh_record_is_idle_and_empty() {
        let record = ProcessRecord::new("webui");
        let state = record.state().lock().await;
        assert!(!state.running);
        assert!(state.pid.is_none());
        assert!(state.output.contents().is_empty());
    }

    #[tokio::test]
    async fn append_output_tags_lines() {
        let record = ProcessRecord::new("webui");
        record.append_output("[OUT] ", "ready").await;
        record.append_output("[ERR] ", "oops").await;
        let state = record.state().lock().await;
        assert_eq!(state.output.contents(), "[OUT] ready\n[ERR] oops\n");
    }
}
