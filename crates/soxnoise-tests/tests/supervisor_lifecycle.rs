//! Process lifecycle tests against `/bin/sh`.
//!
//! ```bash
//! cargo test -p soxnoise-tests --test supervisor_lifecycle
//! ```

#![cfg(unix)]

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use soxnoise_supervisor::{
    OutputSink, ProcessSupervisor, Role, RoleState, SupervisorConfig, SupervisorError,
    VisualizationArtifact, VisualizationOutput,
};
use soxnoise_tests::wait_until;

fn sh(script: &str) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
}

fn collecting_supervisor(config: SupervisorConfig) -> (ProcessSupervisor, Arc<Mutex<Vec<VisualizationOutput>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let supervisor = ProcessSupervisor::with_config(config)
        .on_visualization(move |output| sink.lock().unwrap().push(output));
    (supervisor, seen)
}

#[test]
fn replace_terminates_predecessor() {
    let supervisor = ProcessSupervisor::new();
    let first = supervisor
        .start(Role::Synthesis, &sh("exec sleep 30"), OutputSink::Discard)
        .unwrap();

    let started = Instant::now();
    let second = supervisor
        .replace(Role::Synthesis, &sh("exec sleep 30"), OutputSink::Discard)
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_ne!(first, second);
    assert_eq!(supervisor.pid(Role::Synthesis), Some(second));
    assert_eq!(supervisor.generation(Role::Synthesis), 2);
    assert_eq!(supervisor.state(Role::Synthesis), RoleState::Running);

    supervisor.shutdown();
    assert!(!supervisor.is_running(Role::Synthesis));
    assert_eq!(supervisor.state(Role::Synthesis), RoleState::Idle);
}

#[test]
fn ignored_sigterm_escalates_to_kill() {
    let config = SupervisorConfig::default()
        .term_timeout(Duration::from_millis(200))
        .kill_timeout(Duration::from_secs(1));
    let supervisor = ProcessSupervisor::with_config(config);
    supervisor
        .start(
            Role::Synthesis,
            &sh("trap '' TERM; exec sleep 30"),
            OutputSink::Discard,
        )
        .unwrap();
    // let the shell install its trap before exec
    std::thread::sleep(Duration::from_millis(100));

    let started = Instant::now();
    supervisor.stop(Role::Synthesis).unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "stopped too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1500), "stop took {:?}", elapsed);
    assert!(!supervisor.is_running(Role::Synthesis));
}

#[test]
fn only_newest_visualization_is_delivered() {
    let (supervisor, seen) = collecting_supervisor(SupervisorConfig::default());
    supervisor
        .start(Role::Visualization, &sh("sleep 1; printf old"), OutputSink::Pipe)
        .unwrap();
    supervisor
        .replace(Role::Visualization, &sh("printf new"), OutputSink::Pipe)
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || !seen.lock().unwrap().is_empty()));
    std::thread::sleep(Duration::from_millis(300));

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![VisualizationOutput {
            generation: 2,
            artifact: VisualizationArtifact::Bytes(b"new".to_vec()),
        }]
    );
}

#[test]
fn file_sink_delivers_path() {
    let (supervisor, seen) = collecting_supervisor(SupervisorConfig::default());
    let path = supervisor.visualization_file().unwrap();
    let script = format!("printf IMG > '{}'", path.display());
    supervisor
        .start(Role::Visualization, &sh(&script), OutputSink::File(path.clone()))
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || !seen.lock().unwrap().is_empty()));
    let output = seen.lock().unwrap()[0].clone();
    assert_eq!(output.artifact, VisualizationArtifact::File(path.clone()));
    assert_eq!(fs::read(&path).unwrap(), b"IMG");

    supervisor.shutdown();
    assert!(!path.exists());
}

#[test]
fn failed_visualization_is_not_delivered() {
    let (supervisor, seen) = collecting_supervisor(SupervisorConfig::default());
    supervisor
        .start(Role::Visualization, &sh("printf partial; exit 2"), OutputSink::Pipe)
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || !supervisor.is_running(Role::Visualization)));
    let exits = supervisor.reap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].role, Role::Visualization);
    assert_eq!(exits[0].code, Some(2));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn synthesis_exit_is_reaped() {
    let supervisor = ProcessSupervisor::new();
    let pid = supervisor
        .start(Role::Synthesis, &sh("exit 0"), OutputSink::Discard)
        .unwrap();

    assert!(wait_until(Duration::from_secs(5), || !supervisor.is_running(Role::Synthesis)));
    let exits = supervisor.reap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].pid, pid);
    assert!(exits[0].success);
    assert!(supervisor.reap().is_empty());
}

#[test]
fn run_once_reports_failure_and_timeout() {
    let supervisor = ProcessSupervisor::new();
    let err = supervisor
        .run_once(&sh("echo boom >&2; exit 3"), None)
        .unwrap_err();
    match err {
        SupervisorError::ProcessFailed { exit_code, stderr } => {
            assert_eq!(exit_code, 3);
            assert_eq!(stderr, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }

    let started = Instant::now();
    let err = supervisor
        .run_once(&sh("exec sleep 30"), Some(Duration::from_millis(200)))
        .unwrap_err();
    assert!(matches!(err, SupervisorError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn roles_are_independent() {
    let supervisor = ProcessSupervisor::new();
    supervisor
        .start(Role::Synthesis, &sh("exec sleep 30"), OutputSink::Discard)
        .unwrap();
    supervisor
        .start(Role::Visualization, &sh("exec sleep 30"), OutputSink::Pipe)
        .unwrap();

    supervisor.stop(Role::Visualization).unwrap();
    assert!(supervisor.is_running(Role::Synthesis));
    assert!(!supervisor.is_running(Role::Visualization));
}
