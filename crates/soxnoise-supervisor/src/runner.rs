//! Bounded one-shot runs (sound renders).

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{SupervisorError, SupervisorResult};

/// Result of a successful one-shot run.
#[derive(Debug)]
pub struct RunOutput {
    /// Exit status (always success).
    pub status: ExitStatus,
    /// Captured stderr.
    pub stderr: String,
    /// Wall-clock duration.
    pub duration: Duration,
}

pub(crate) fn run_to_completion(
    program: &str,
    executable: &Path,
    args: &[String],
    timeout: Duration,
    poll_interval: Duration,
    cancel: &AtomicBool,
) -> SupervisorResult<RunOutput> {
    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| SupervisorError::SpawnFailed {
            program: program.to_string(),
            source,
        })?;

    // Drain stderr concurrently so a chatty process cannot fill the pipe and stall.
    let stderr_reader = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = err.read_to_string(&mut buf);
            buf
        })
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if cancel.load(Ordering::SeqCst) {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SupervisorError::Cancelled);
                }
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SupervisorError::Timeout {
                        timeout_secs: timeout.as_secs(),
                    });
                }
                thread::sleep(poll_interval);
            }
            Err(e) => return Err(SupervisorError::Wait(e)),
        }
    };
    let duration = start.elapsed();

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(SupervisorError::process_failed(
            status.code().unwrap_or(-1),
            stderr.trim(),
        ));
    }

    Ok(RunOutput {
        status,
        stderr,
        duration,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_run_captures_stderr() {
        let out = run_to_completion(
            "sh",
            Path::new("/bin/sh"),
            &sh("echo hello 1>&2"),
            Duration::from_secs(5),
            Duration::from_millis(10),
            &AtomicBool::new(false),
        )
        .unwrap();
        assert!(out.status.success());
        assert!(out.stderr.contains("hello"));
    }

    #[test]
    fn test_run_failure_carries_stderr() {
        let err = run_to_completion(
            "sh",
            Path::new("/bin/sh"),
            &sh("echo 'sox FAIL' 1>&2; exit 2"),
            Duration::from_secs(5),
            Duration::from_millis(10),
            &AtomicBool::new(false),
        )
        .unwrap_err();
        match err {
            SupervisorError::ProcessFailed { exit_code, stderr } => {
                assert_eq!(exit_code, 2);
                assert_eq!(stderr, "sox FAIL");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_times_out() {
        let start = Instant::now();
        let err = run_to_completion(
            "sh",
            Path::new("/bin/sh"),
            &sh("exec sleep 30"),
            Duration::from_millis(200),
            Duration::from_millis(10),
            &AtomicBool::new(false),
        )
        .unwrap_err();
        assert!(matches!(err, SupervisorError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_run_cancelled() {
        let cancel = AtomicBool::new(true);
        let start = Instant::now();
        let err = run_to_completion(
            "sh",
            Path::new("/bin/sh"),
            &sh("exec sleep 30"),
            Duration::from_secs(30),
            Duration::from_millis(10),
            &cancel,
        )
        .unwrap_err();
        assert!(matches!(err, SupervisorError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
