//! Externally visible process status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time status of a registered process.
///
/// Only two states are externally observable: a record is either running or
/// it is not. Transitional states (a start in progress, a stop escalating)
/// are never exposed; `start` is synchronous up to either failure or
/// `Running`, so no partially-started state can be seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Stopped,
}

impl ProcessStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Running => "running",
            ProcessStatus::Stopped => "stopped",
        }
    }

    /// The legacy per-process status sentence ("Process 'x' is running").
    pub fn describe(&self, name: &str) -> String {
        format!("Process '{}' is {}", name, self.as_str())
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
