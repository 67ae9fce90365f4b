//! Owned handle to one live child process.

use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::role::{OutputSink, Role};

/// How a child left the supervisor's hands.
#[derive(Debug)]
pub(crate) enum Termination {
    /// The process exited and was reaped.
    Exited(ExitStatus),
    /// The process is still alive after the kill; a background thread reaps it.
    Unresponsive,
}

/// A live child owned by exactly one role slot.
#[derive(Debug)]
pub struct ChildProcessHandle {
    pub(crate) child: Child,
    pid: u32,
    role: Role,
    sink: OutputSink,
    generation: u64,
    started_at: Instant,
}

impl ChildProcessHandle {
    pub(crate) fn new(child: Child, role: Role, sink: OutputSink, generation: u64) -> Self {
        Self {
            pid: child.id(),
            child,
            role,
            sink,
            generation,
            started_at: Instant::now(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time since the process was spawned.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Asks the process to exit, escalating to a kill after `term_timeout`.
    ///
    /// Never blocks longer than `term_timeout + kill_timeout` (plus one poll).
    pub(crate) fn terminate(
        mut self,
        term_timeout: Duration,
        kill_timeout: Duration,
        poll_interval: Duration,
    ) -> Termination {
        if let Ok(Some(status)) = self.child.try_wait() {
            return Termination::Exited(status);
        }

        send_terminate(&mut self.child);
        if let Some(status) = poll_exit(&mut self.child, term_timeout, poll_interval) {
            debug!(role = %self.role, pid = self.pid, "process exited after SIGTERM");
            return Termination::Exited(status);
        }

        warn!(role = %self.role, pid = self.pid, "process ignored termination, killing");
        let _ = self.child.kill();
        if let Some(status) = poll_exit(&mut self.child, kill_timeout, poll_interval) {
            return Termination::Exited(status);
        }

        self.abandon();
        Termination::Unresponsive
    }

    /// Kills the child and leaves the reaping to a background thread, so the
    /// pid never turns into a zombie.
    pub(crate) fn abandon(self) {
        let mut child = self.child;
        let _ = child.kill();
        thread::spawn(move || {
            let _ = child.wait();
        });
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) {
    // SAFETY: the child has not been reaped yet, so its pid cannot have been reused.
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) {
    let _ = child.kill();
}

/// Polls `try_wait` until the child exits or `timeout` elapses.
pub(crate) fn poll_exit(
    child: &mut Child,
    timeout: Duration,
    poll_interval: Duration,
) -> Option<ExitStatus> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    return None;
                }
                thread::sleep(poll_interval);
            }
            Err(_) => return None,
        }
    }
}
