//! Process-group spawn configuration.

use tokio::process::Command;

/// Configure `cmd` so the child starts in its own process group.
///
/// On Unix the child calls `setpgid(0, 0)` between fork and exec, making its
/// PID the group leader PID. Every descendant it spawns inherits the group,
/// so a single signal to `-pgid` later reaches the whole subtree.
///
/// On Windows the child gets `CREATE_NEW_PROCESS_GROUP`, which isolates
/// console control events; group-wide signaling is otherwise unavailable
/// there and termination degrades to killing the direct child.
pub fn put_in_own_group(cmd: &mut Command) {
    #[cfg(unix)]
    {
        unsafe {
            cmd.pre_exec(|| {
                // Async-signal-safe: plain setpgid syscall, no allocation.
                nix::unistd::setpgid(nix::unistd::Pid::from_raw(0), nix::unistd::Pid::from_raw(0))
                    .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
            });
        }
    }

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}
