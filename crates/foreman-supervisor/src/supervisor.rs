//! The process supervisor: start, stop, status, and output operations.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use foreman_common::{ProcessStatus, SupervisorError, SupervisorResult};
use foreman_process::{process_exists, put_in_own_group, ProcessTerminator};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::output;
use crate::record::ProcessRecord;
use crate::registry::ProcessRegistry;

/// Default time a polite stop waits before escalating to a kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How long `release_resources` waits for a background task before aborting
/// it.
const TASK_REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Supervises the processes held by a [`ProcessRegistry`].
///
/// All operations are keyed by registered name. Failures come back as
/// [`SupervisorError`] values whose messages match the texts the legacy
/// front-end displays.
pub struct Supervisor {
    registry: Arc<ProcessRegistry>,
    terminator: Arc<dyn ProcessTerminator>,
    shutdown: CancellationToken,
    grace_period: Duration,
}

impl Supervisor {
    /// A supervisor over `registry` using the platform-default terminator
    /// and the standard grace period.
    pub fn new(registry: Arc<ProcessRegistry>, shutdown: CancellationToken) -> Self {
        Self {
            registry,
            terminator: foreman_process::platform_terminator(),
            shutdown,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Replace the termination backend. Mostly for tests observing signals.
    pub fn with_terminator(mut self, terminator: Arc<dyn ProcessTerminator>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Start the named process with `extra_args` appended to the spec's
    /// baseline arguments.
    ///
    /// The check-and-set of the running flag happens under the record lock,
    /// so two concurrent starts of the same name spawn at most one child.
    /// Once the supervisor's cancellation token fires no new children are
    /// created; already-running ones are unaffected.
    pub async fn start(&self, name: &str, extra_args: &[String]) -> SupervisorResult<String> {
        let (spec, record) = self
            .registry
            .lookup(name)
            .ok_or_else(|| SupervisorError::not_found(name))?;

        if self.shutdown.is_cancelled() {
            return Err(SupervisorError::launch_failure(
                name,
                "supervisor is shutting down",
            ));
        }

        let mut state = record.state().lock().await;

        if state.running {
            // A child that died without being observed yet (watcher still in
            // flight) must not block a restart forever; probe the PID.
            let alive = state
                .pid
                .map(|pid| process_exists(pid).unwrap_or(true))
                .unwrap_or(true);
            if alive {
                return Err(SupervisorError::already_running(name));
            }
            warn!(process = %name, pid = ?state.pid, "clearing stale running flag");
            state.running = false;
        }

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .args(extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        if let Some(dir) = &spec.work_dir {
            cmd.current_dir(dir);
        }
        put_in_own_group(&mut cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| SupervisorError::launch_failure(name, e.to_string()))?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (exit_tx, exit_rx) = watch::channel(false);

        state.generation += 1;
        let generation = state.generation;
        state.pid = pid;
        state.running = true;
        state.started_at = Some(chrono::Utc::now());
        state.exit_rx = Some(exit_rx);

        state.tasks.retain(|task| !task.is_finished());
        if let Some(out) = stdout {
            state
                .tasks
                .push(output::spawn_line_reader(record.clone(), out, output::STDOUT_TAG));
        }
        if let Some(err) = stderr {
            state
                .tasks
                .push(output::spawn_line_reader(record.clone(), err, output::STDERR_TAG));
        }
        state
            .tasks
            .push(tokio::spawn(exit_watcher(record.clone(), child, exit_tx, generation)));

        info!(process = %name, pid, "process started");
        Ok(format!("Process '{}' started successfully", name))
    }

    /// Kill the named process immediately (whole process group on Unix).
    ///
    /// The running flag is forced false even when signal delivery fails;
    /// callers historically rely on a stop leaving the record stoppable and
    /// restartable, and the exit watcher still reaps the child if it dies
    /// later. The error is returned so the failure is not silent.
    pub async fn stop(&self, name: &str) -> SupervisorResult<String> {
        let (_, record) = self
            .registry
            .lookup(name)
            .ok_or_else(|| SupervisorError::not_found(name))?;

        let mut state = record.state().lock().await;
        let Some(pid) = state.pid.filter(|_| state.running) else {
            return Err(SupervisorError::not_running(name));
        };

        state.running = false;
        match self.terminator.kill(pid) {
            Ok(()) => {
                info!(process = %name, pid, "process stopped forcefully");
                Ok(format!("Process '{}' stopped (forcefully)", name))
            }
            Err(e) => {
                warn!(process = %name, pid, error = %e, "kill signal not delivered");
                Err(SupervisorError::signal_failure(name, e.to_string()))
            }
        }
    }

    /// Stop the named process politely, escalating after the grace period.
    ///
    /// Sends the polite group signal, then waits for the exit watcher's
    /// notification racing the grace timer; on timeout (or if polite
    /// delivery failed) the group is killed. On platforms where the
    /// terminator cannot reach the whole group this degrades to an
    /// immediate forceful stop.
    pub async fn stop_gracefully(&self, name: &str) -> SupervisorResult<String> {
        let (_, record) = self
            .registry
            .lookup(name)
            .ok_or_else(|| SupervisorError::not_found(name))?;

        let mut state = record.state().lock().await;
        let Some(pid) = state.pid.filter(|_| state.running) else {
            return Err(SupervisorError::not_running(name));
        };

        if !self.terminator.signals_process_group() {
            state.running = false;
            return match self.terminator.kill(pid) {
                Ok(()) => {
                    info!(process = %name, pid, "process stopped forcefully");
                    Ok(format!("Process '{}' stopped (forcefully)", name))
                }
                Err(e) => {
                    warn!(process = %name, pid, error = %e, "kill signal not delivered");
                    Err(SupervisorError::signal_failure(name, e.to_string()))
                }
            };
        }

        let mut exit_rx = state.exit_rx.clone();
        let politely_signaled = match self.terminator.terminate(pid) {
            Ok(()) => true,
            Err(e) => {
                warn!(process = %name, pid, error = %e, "polite signal not delivered, escalating");
                false
            }
        };

        if politely_signaled {
            if let Some(rx) = exit_rx.as_mut() {
                // The watcher publishes the exit on this channel before it
                // takes the record lock, so waiting here with the lock held
                // cannot deadlock.
                let exited =
                    tokio::time::timeout(self.grace_period, rx.wait_for(|exited| *exited)).await;
                match exited {
                    Ok(_) => {
                        state.running = false;
                        info!(process = %name, pid, "process stopped gracefully");
                        return Ok(format!("Process '{}' stopped gracefully", name));
                    }
                    Err(_) => {
                        debug!(process = %name, pid, "grace period elapsed, escalating to kill");
                    }
                }
            }
        }

        state.running = false;
        match self.terminator.kill(pid) {
            Ok(()) => {
                info!(process = %name, pid, "process stopped forcefully");
                Ok(format!("Process '{}' stopped (forcefully)", name))
            }
            Err(e) => {
                warn!(process = %name, pid, error = %e, "kill signal not delivered");
                Err(SupervisorError::signal_failure(name, e.to_string()))
            }
        }
    }

    /// Point-in-time status of the named process.
    ///
    /// When the flag says running but the PID no longer exists (watcher not
    /// yet scheduled, or the flag went stale some other way), the probe
    /// corrects the record to Stopped.
    pub async fn status(&self, name: &str) -> SupervisorResult<ProcessStatus> {
        let (_, record) = self
            .registry
            .lookup(name)
            .ok_or_else(|| SupervisorError::not_found(name))?;

        let mut state = record.state().lock().await;
        if state.running {
            if let Some(pid) = state.pid {
                if !process_exists(pid).unwrap_or(true) {
                    debug!(process = %name, pid, "pid vanished, marking stopped");
                    state.running = false;
                }
            }
        }

        Ok(if state.running {
            ProcessStatus::Running
        } else {
            ProcessStatus::Stopped
        })
    }

    /// Statuses of every registered process.
    pub async fn all_statuses(&self) -> HashMap<String, ProcessStatus> {
        let mut statuses = HashMap::new();
        for name in self.registry.names() {
            if let Ok(status) = self.status(&name).await {
                statuses.insert(name, status);
            }
        }
        statuses
    }

    /// The full captured output of the named process so far, running or not.
    pub async fn output(&self, name: &str) -> SupervisorResult<String> {
        let (_, record) = self
            .registry
            .lookup(name)
            .ok_or_else(|| SupervisorError::not_found(name))?;

        let state = record.state().lock().await;
        Ok(state.output.contents())
    }

    /// Gracefully stop every registered process, concurrently. Returns only
    /// when every stop has completed; idle records are skipped silently and
    /// failures are logged, never propagated.
    pub async fn stop_all(self: &Arc<Self>) {
        let mut stops = JoinSet::new();
        for name in self.registry.names() {
            let supervisor = Arc::clone(self);
            stops.spawn(async move {
                match supervisor.stop_gracefully(&name).await {
                    Ok(msg) => info!(process = %name, "{msg}"),
                    Err(SupervisorError::NotRunning { .. }) => {}
                    Err(e) => warn!(process = %name, error = %e, "stop during shutdown failed"),
                }
            });
        }
        while stops.join_next().await.is_some() {}
    }

    /// Join every record's tracked background tasks, aborting stragglers.
    ///
    /// Best-effort teardown, called once after `stop_all`. Reader tasks end
    /// when their stream closes and the watcher ends at reap, so after a
    /// full stop these joins normally complete immediately.
    pub async fn release_resources(&self) {
        for name in self.registry.names() {
            let Some((_, record)) = self.registry.lookup(&name) else {
                continue;
            };

            // Drain outside the lock so a watcher still waiting to update
            // the record can make progress while we join it.
            let tasks: Vec<_> = {
                let mut state = record.state().lock().await;
                state.exit_rx = None;
                state.tasks.drain(..).collect()
            };

            for mut task in tasks {
                if tokio::time::timeout(TASK_REAP_TIMEOUT, &mut task)
                    .await
                    .is_err()
                {
                    debug!(process = %name, "aborting straggling background task");
                    task.abort();
                }
            }
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("grace_period", &self.grace_period)
            .field("shutting_down", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Wait for the child to exit (this is the reaper), publish the exit on the
/// watch channel, then clear the running flag.
///
/// The channel send happens before the lock is taken: a graceful stop may be
/// holding the record lock while it waits on this very channel.
async fn exit_watcher(
    record: Arc<ProcessRecord>,
    mut child: Child,
    exit_tx: watch::Sender<bool>,
    generation: u64,
) {
    let status = child.wait().await;
    let _ = exit_tx.send(true);

    let mut state = record.state().lock().await;
    if state.generation == generation {
        state.running = false;
    }

    match status {
        Ok(exit) => debug!(process = %record.name(), %exit, "process exited"),
        Err(e) => warn!(process = %record.name(), error = %e, "waiting on process failed"),
    }
}
