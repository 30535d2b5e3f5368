//! Windows-specific termination helpers.
//!
//! Console control events are global per console, so delivery is serialized
//! behind a process-wide lock. Children are spawned with
//! `CREATE_NEW_PROCESS_GROUP`, which makes them valid Ctrl+Break targets.

use std::io;
use std::sync::Mutex;

use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};
use windows::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

static CONSOLE_OPERATION_LOCK: Mutex<()> = Mutex::new(());

/// Request a graceful shutdown via Ctrl+Break delivered to the process group
/// led by `pid`.
pub fn send_close_signal(pid: u32) -> io::Result<()> {
    if pid == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid PID 0"));
    }

    let _lock = CONSOLE_OPERATION_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    unsafe {
        GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid)
            .map_err(|e| io::Error::other(format!("GenerateConsoleCtrlEvent failed: {e}")))
    }
}

/// Kill `pid` unconditionally with exit code 1.
pub fn terminate_process(pid: u32) -> io::Result<()> {
    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, false, pid)
            .map_err(|e| io::Error::other(format!("OpenProcess failed: {e}")))?;

        let result = TerminateProcess(handle, 1);
        let _ = CloseHandle(handle);

        result.map_err(|e| io::Error::other(format!("TerminateProcess failed: {e}")))
    }
}
