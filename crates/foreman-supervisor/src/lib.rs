//! # Foreman Supervisor
//!
//! Supervision of named external processes:
//!
//! - [`ProcessRegistry`]: name-keyed specs and live records
//! - [`Supervisor`]: start / stop / status / output operations
//! - Output capture with `[OUT]` / `[ERR]` line tagging
//! - [`LifecycleCoordinator`]: single-shot application shutdown
//! - TOML configuration with generated companion config documents

pub mod config;
pub mod lifecycle;
pub mod output;
pub mod record;
pub mod registry;
pub mod supervisor;

pub use config::{ProcessEntry, SupervisorConfig, SupervisorOptions};
pub use lifecycle::LifecycleCoordinator;
pub use record::{ProcessRecord, ProcessSpec};
pub use registry::ProcessRegistry;
pub use supervisor::Supervisor;

pub use foreman_common::{ProcessStatus, SupervisorError, SupervisorResult};
