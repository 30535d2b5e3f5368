//! End-to-end supervision tests driving real `/bin/sh` children.
#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use foreman_supervisor::{
    LifecycleCoordinator, ProcessRegistry, ProcessSpec, ProcessStatus, Supervisor, SupervisorError,
};
use tokio_util::sync::CancellationToken;

fn supervisor_with_grace(grace: Duration) -> Arc<Supervisor> {
    Arc::new(
        Supervisor::new(Arc::new(ProcessRegistry::new()), CancellationToken::new())
            .with_grace_period(grace),
    )
}

fn sh(name: &str, script: &str) -> ProcessSpec {
    ProcessSpec::new(name, "/bin/sh").with_args(["-c", script])
}

async fn wait_for_stopped(supervisor: &Supervisor, name: &str, within: Duration) {
    let deadline = Instant::now() + within;
    loop {
        if supervisor.status(name).await.unwrap() == ProcessStatus::Stopped {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "'{name}' still running after {within:?}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn double_start_reports_already_running() {
    let sup = supervisor_with_grace(Duration::from_secs(2));
    sup.registry().register(sh("sleeper", "sleep 30")).unwrap();

    sup.start("sleeper", &[]).await.unwrap();
    let err = sup.start("sleeper", &[]).await.unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyRunning { .. }));
    assert_eq!(err.to_string(), "Process 'sleeper' is already running!");

    sup.stop("sleeper").await.unwrap();
    wait_for_stopped(&sup, "sleeper", Duration::from_secs(2)).await;
}

#[tokio::test]
async fn spontaneous_exit_is_observed_without_a_stop_call() {
    let sup = supervisor_with_grace(Duration::from_secs(2));
    sup.registry()
        .register(sh("shortlived", "sleep 0.1"))
        .unwrap();

    sup.start("shortlived", &[]).await.unwrap();
    assert_eq!(
        sup.status("shortlived").await.unwrap(),
        ProcessStatus::Running
    );

    wait_for_stopped(&sup, "shortlived", Duration::from_secs(3)).await;

    // A fresh start must work again after the exit was observed.
    sup.start("shortlived", &[]).await.unwrap();
    wait_for_stopped(&sup, "shortlived", Duration::from_secs(3)).await;
}

#[tokio::test]
async fn graceful_stop_of_cooperative_child_beats_the_grace_period() {
    let grace = Duration::from_secs(5);
    let sup = supervisor_with_grace(grace);
    sup.registry().register(sh("polite", "sleep 30")).unwrap();

    sup.start("polite", &[]).await.unwrap();
    let started = Instant::now();
    let msg = sup.stop_gracefully("polite").await.unwrap();

    assert_eq!(msg, "Process 'polite' stopped gracefully");
    assert!(started.elapsed() < grace, "took {:?}", started.elapsed());
    assert_eq!(sup.status("polite").await.unwrap(), ProcessStatus::Stopped);
}

#[tokio::test]
async fn graceful_stop_escalates_on_a_sigterm_ignoring_child() {
    let grace = Duration::from_millis(300);
    let sup = supervisor_with_grace(grace);
    sup.registry()
        .register(sh("stubborn", "trap '' TERM; sleep 30"))
        .unwrap();

    sup.start("stubborn", &[]).await.unwrap();
    // Give the shell a moment to install the trap.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let started = Instant::now();
    let msg = sup.stop_gracefully("stubborn").await.unwrap();

    assert_eq!(msg, "Process 'stubborn' stopped (forcefully)");
    assert!(
        started.elapsed() < grace + Duration::from_secs(1),
        "took {:?}",
        started.elapsed()
    );
    wait_for_stopped(&sup, "stubborn", Duration::from_secs(2)).await;
}

#[tokio::test]
async fn forceful_stop_reaches_grandchildren_through_the_group() {
    let sup = supervisor_with_grace(Duration::from_secs(2));
    // The shell forks a grandchild and waits on it.
    sup.registry()
        .register(sh("family", "sleep 30 & wait"))
        .unwrap();

    sup.start("family", &[]).await.unwrap();
    let msg = sup.stop("family").await.unwrap();
    assert_eq!(msg, "Process 'family' stopped (forcefully)");
    wait_for_stopped(&sup, "family", Duration::from_secs(2)).await;
}

#[tokio::test]
async fn extra_args_are_appended_to_spec_args() {
    let sup = supervisor_with_grace(Duration::from_secs(2));
    sup.registry()
        .register(ProcessSpec::new("echoer", "/bin/sh").with_args(["-c", "echo \"$0 $1\"", "base"]))
        .unwrap();

    sup.start("echoer", &["extra".to_string()]).await.unwrap();
    wait_for_stopped(&sup, "echoer", Duration::from_secs(3)).await;

    let output = sup.output("echoer").await.unwrap();
    assert_eq!(output, "[OUT] base extra\n");
}

#[tokio::test]
async fn stop_all_returns_only_after_every_child_is_stopped() {
    let sup = supervisor_with_grace(Duration::from_secs(2));
    for i in 0..3 {
        let name = format!("worker-{i}");
        sup.registry().register(sh(&name, "sleep 30")).unwrap();
        sup.start(&name, &[]).await.unwrap();
    }
    // One idle record mixed in; stop_all must skip it silently.
    sup.registry().register(sh("idle", "sleep 30")).unwrap();

    sup.stop_all().await;

    for (name, status) in sup.all_statuses().await {
        assert_eq!(status, ProcessStatus::Stopped, "{name}");
    }
}

#[tokio::test]
async fn coordinator_shutdown_stops_children_and_refuses_new_starts() {
    let sup = supervisor_with_grace(Duration::from_secs(2));
    sup.registry().register(sh("svc", "sleep 30")).unwrap();
    sup.start("svc", &[]).await.unwrap();

    let coordinator = LifecycleCoordinator::new(sup.clone());
    assert!(coordinator.shutdown().await);
    assert!(!coordinator.shutdown().await);

    assert_eq!(sup.status("svc").await.unwrap(), ProcessStatus::Stopped);
    let err = sup.start("svc", &[]).await.unwrap_err();
    assert!(matches!(err, SupervisorError::LaunchFailure { .. }));
}
