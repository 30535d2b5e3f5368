//! # Foreman Process
//!
//! Cross-platform low-level process operations for the foreman supervisor:
//!
//! - Spawning children in their own process group
//! - Process existence checks
//! - Graceful and forceful termination behind the [`ProcessTerminator`] seam

pub mod check;
pub mod spawn;
pub mod terminate;

#[cfg(windows)]
pub mod terminate_windows;

pub use check::process_exists;
pub use spawn::put_in_own_group;
pub use terminate::{platform_terminator, DirectTerminator, ProcessTerminator};

#[cfg(unix)]
pub use terminate::GroupTerminator;
