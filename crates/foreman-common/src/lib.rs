//! # Foreman Common
//!
//! Shared types for the foreman process supervisor: the error taxonomy
//! used across every crate, result aliases, and the externally visible
//! process status.

pub mod errors;
pub mod status;

pub use errors::{SupervisorError, SupervisorResult};
pub use status::ProcessStatus;
