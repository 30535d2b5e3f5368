//! Process existence checking.

use std::io;

/// Check if a process with the given PID exists and is running.
///
/// Non-destructive: on Unix this is `kill(pid, 0)`, which delivers no signal
/// but reports whether the target exists (EPERM counts as "exists, no
/// permission"). On Windows it attempts to open a query-only handle.
pub fn process_exists(pid: u32) -> io::Result<bool> {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(windows)]
    {
        process_exists_windows(pid)
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> io::Result<bool> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        Err(nix::errno::Errno::EPERM) => Ok(true),
        Err(e) => Err(io::Error::from_raw_os_error(e as i32)),
    }
}

#[cfg(windows)]
fn process_exists_windows(pid: u32) -> io::Result<bool> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

    unsafe {
        match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            Ok(handle) => {
                let _ = CloseHandle(handle);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}
