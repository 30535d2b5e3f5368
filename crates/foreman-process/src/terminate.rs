//! Process termination primitives.
//!
//! Termination sits behind the [`ProcessTerminator`] trait so the supervisor
//! never signals PIDs directly. The platform default ([`platform_terminator`])
//! signals the whole process group on Unix and falls back to direct-child
//! termination on Windows; tests substitute their own implementation to
//! observe which signals would have been sent.

use std::io;
use std::sync::Arc;

/// Sends termination requests to a spawned child identified by PID.
///
/// `terminate` is the polite request (SIGTERM-equivalent) and `kill` the
/// unconditional one (SIGKILL-equivalent). Both are fire-and-forget: the
/// caller is responsible for waiting on the child afterwards.
pub trait ProcessTerminator: Send + Sync {
    /// Ask the process to shut down (SIGTERM on Unix, Ctrl+Break/close on
    /// Windows).
    fn terminate(&self, pid: u32) -> io::Result<()>;

    /// Kill the process unconditionally (SIGKILL on Unix, TerminateProcess
    /// on Windows).
    fn kill(&self, pid: u32) -> io::Result<()>;

    /// Whether signals reach the whole process group rather than one PID.
    fn signals_process_group(&self) -> bool {
        false
    }
}

/// The default terminator for the current platform.
///
/// Unix: [`GroupTerminator`], reaching every descendant of a group leader.
/// Windows: [`DirectTerminator`], reaching the direct child only.
pub fn platform_terminator() -> Arc<dyn ProcessTerminator> {
    #[cfg(unix)]
    {
        Arc::new(GroupTerminator)
    }

    #[cfg(windows)]
    {
        Arc::new(DirectTerminator)
    }
}

/// Signals the process group led by `pid` (children spawned via
/// [`put_in_own_group`](crate::put_in_own_group) lead their own group).
///
/// Resolves the group id first so a child that somehow escaped into a
/// different group is still reached through its actual group. Falls back to
/// signaling the PID directly if the group lookup fails.
#[cfg(unix)]
pub struct GroupTerminator;

#[cfg(unix)]
impl GroupTerminator {
    fn signal(&self, pid: u32, signal: nix::sys::signal::Signal) -> io::Result<()> {
        use nix::sys::signal::{kill, killpg};
        use nix::unistd::{getpgid, Pid};

        let target = Pid::from_raw(pid as i32);
        match getpgid(Some(target)) {
            Ok(pgid) => killpg(pgid, signal).map_err(nix_to_io),
            // Group already gone or unreadable; try the lone PID.
            Err(_) => kill(target, signal).map_err(nix_to_io),
        }
    }
}

#[cfg(unix)]
impl ProcessTerminator for GroupTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        self.signal(pid, nix::sys::signal::Signal::SIGTERM)
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        self.signal(pid, nix::sys::signal::Signal::SIGKILL)
    }

    fn signals_process_group(&self) -> bool {
        true
    }
}

/// Signals a single PID, never its descendants.
pub struct DirectTerminator;

impl ProcessTerminator for DirectTerminator {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(nix_to_io)
        }

        #[cfg(windows)]
        {
            crate::terminate_windows::send_close_signal(pid)
        }
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            kill(Pid::from_raw(pid as i32), Signal::SIGKILL).map_err(nix_to_io)
        }

        #[cfg(windows)]
        {
            crate::terminate_windows::terminate_process(pid)
        }
    }
}

#[cfg(unix)]
fn nix_to_io(e: nix::errno::Errno) -> io::Error {
    io::Error::from_raw_os_error(e as i32)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    #[test]
    fn signaling_a_dead_pid_reports_esrch() {
        // PID far above pid_max; no such process.
        let err = DirectTerminator.terminate(2_000_000_000).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(nix::errno::Errno::ESRCH as i32));
    }

    #[tokio::test]
    async fn group_kill_takes_down_a_sleeping_child() {
        let mut cmd = Command::new("/bin/sh");
        cmd.args(["-c", "sleep 30"]).stdout(Stdio::null());
        crate::put_in_own_group(&mut cmd);

        let mut child = cmd.spawn().unwrap();
        let pid = child.id().unwrap();

        GroupTerminator.kill(pid).unwrap();
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }

    #[test]
    fn platform_default_reaches_the_group() {
        assert!(platform_terminator().signals_process_group());
    }
}
