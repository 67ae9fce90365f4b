//! The process supervisor.
//!
//! Each [`Role`] owns one slot guarded by its own mutex. Every operation on
//! a role holds that mutex for its whole duration, so start/stop pairs for a
//! role are serialized while the two roles stay independent. A slot holds
//! at most one [`ChildProcessHandle`].

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{SupervisorError, SupervisorResult};
use crate::handle::{ChildProcessHandle, Termination};
use crate::role::{OutputSink, Role, RoleExit, RoleState, VisualizationOutput};
use crate::runner::{run_to_completion, RunOutput};
use crate::watch::Watch;

/// Default grace period between SIGTERM and SIGKILL.
pub const DEFAULT_TERM_TIMEOUT_MS: u64 = 500;

/// Default wait after SIGKILL before a process is declared unresponsive.
pub const DEFAULT_KILL_TIMEOUT_MS: u64 = 1000;

/// Default timeout for one-shot runs such as renders (5 minutes).
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 300;

/// Receives finished visualization results.
///
/// Called from a watch thread while the visualization slot is locked; it
/// must not call back into the supervisor.
pub type CompletionCallback = Arc<dyn Fn(VisualizationOutput) + Send + Sync>;

pub(crate) type SharedSlot = Arc<Mutex<Slot>>;

#[derive(Debug)]
pub(crate) struct Slot {
    pub state: RoleState,
    pub generation: u64,
    pub handle: Option<ChildProcessHandle>,
}

impl Slot {
    fn new() -> SharedSlot {
        Arc::new(Mutex::new(Slot {
            state: RoleState::Idle,
            generation: 0,
            handle: None,
        }))
    }
}

pub(crate) fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Configuration for the supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long a process gets to exit after SIGTERM.
    pub term_timeout: Duration,
    /// How long to wait after SIGKILL.
    pub kill_timeout: Duration,
    /// Polling interval for exit checks.
    pub poll_interval: Duration,
    /// Timeout for [`ProcessSupervisor::run_once`].
    pub run_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            term_timeout: Duration::from_millis(DEFAULT_TERM_TIMEOUT_MS),
            kill_timeout: Duration::from_millis(DEFAULT_KILL_TIMEOUT_MS),
            poll_interval: Duration::from_millis(20),
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }
}

impl SupervisorConfig {
    /// Sets the SIGTERM grace period.
    pub fn term_timeout(mut self, timeout: Duration) -> Self {
        self.term_timeout = timeout;
        self
    }

    /// Sets the post-SIGKILL wait.
    pub fn kill_timeout(mut self, timeout: Duration) -> Self {
        self.kill_timeout = timeout;
        self
    }

    /// Sets the one-shot run timeout in seconds.
    pub fn run_timeout_secs(mut self, secs: u64) -> Self {
        self.run_timeout = Duration::from_secs(secs);
        self
    }
}

/// Owns the synthesis and visualization child processes.
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    synthesis: SharedSlot,
    visualization: SharedSlot,
    exits: Arc<Mutex<Vec<RoleExit>>>,
    on_visualization: Option<CompletionCallback>,
    scratch: Mutex<Option<tempfile::NamedTempFile>>,
    closing: Arc<AtomicBool>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl ProcessSupervisor {
    /// Creates a supervisor with default configuration.
    pub fn new() -> Self {
        Self::with_config(SupervisorConfig::default())
    }

    /// Creates a supervisor with the given configuration.
    pub fn with_config(config: SupervisorConfig) -> Self {
        Self {
            config,
            synthesis: Slot::new(),
            visualization: Slot::new(),
            exits: Arc::new(Mutex::new(Vec::new())),
            on_visualization: None,
            scratch: Mutex::new(None),
            closing: Arc::new(AtomicBool::new(false)),
            background: Mutex::new(Vec::new()),
        }
    }

    /// Registers the callback that receives visualization results.
    pub fn on_visualization(
        mut self,
        callback: impl Fn(VisualizationOutput) + Send + Sync + 'static,
    ) -> Self {
        self.on_visualization = Some(Arc::new(callback));
        self
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    fn slot(&self, role: Role) -> &SharedSlot {
        match role {
            Role::Synthesis => &self.synthesis,
            Role::Visualization => &self.visualization,
        }
    }

    /// Spawns a process for `role`.
    ///
    /// Fails with [`SupervisorError::AlreadyRunning`] if the role is occupied;
    /// use [`ProcessSupervisor::replace`] instead. Returns the new pid.
    pub fn start(&self, role: Role, argv: &[String], sink: OutputSink) -> SupervisorResult<u32> {
        let shared = self.slot(role);
        let mut slot = lock(shared);
        if let Some(handle) = &slot.handle {
            return Err(SupervisorError::AlreadyRunning {
                role,
                pid: handle.pid(),
            });
        }
        self.spawn_into(&mut slot, shared, role, argv, sink)
    }

    /// Stops whatever runs for `role`, then starts `argv` in its place.
    ///
    /// An unresponsive predecessor is logged and abandoned; the new process
    /// starts regardless.
    pub fn replace(&self, role: Role, argv: &[String], sink: OutputSink) -> SupervisorResult<u32> {
        let shared = self.slot(role);
        let mut slot = lock(shared);
        if let Err(e) = self.stop_locked(&mut slot, role) {
            warn!("{}; starting replacement anyway", e);
        }
        self.spawn_into(&mut slot, shared, role, argv, sink)
    }

    /// Terminates the process for `role`, if any.
    ///
    /// Idempotent. Bounded by the configured term and kill timeouts.
    pub fn stop(&self, role: Role) -> SupervisorResult<()> {
        let mut slot = lock(self.slot(role));
        self.stop_locked(&mut slot, role)
    }

    fn stop_locked(&self, slot: &mut Slot, role: Role) -> SupervisorResult<()> {
        let Some(handle) = slot.handle.take() else {
            return Ok(());
        };
        slot.state = RoleState::Stopping;
        let pid = handle.pid();
        let uptime = handle.uptime();
        let termination = handle.terminate(
            self.config.term_timeout,
            self.config.kill_timeout,
            self.config.poll_interval,
        );
        slot.state = RoleState::Idle;
        match termination {
            Termination::Exited(status) => {
                debug!(role = %role, pid, ?uptime, code = ?status.code(), "process stopped");
                Ok(())
            }
            Termination::Unresponsive => {
                warn!(role = %role, pid, "process unresponsive, handle discarded");
                Err(SupervisorError::Unresponsive { role, pid })
            }
        }
    }

    fn spawn_into(
        &self,
        slot: &mut Slot,
        shared: &SharedSlot,
        role: Role,
        argv: &[String],
        sink: OutputSink,
    ) -> SupervisorResult<u32> {
        let (program, args) = argv.split_first().ok_or(SupervisorError::EmptyCommand)?;
        let executable = resolve_executable(program)?;

        let mut cmd = Command::new(&executable);
        cmd.args(args).stdin(Stdio::null());
        match &sink {
            OutputSink::Inherit => cmd.stdout(Stdio::inherit()),
            OutputSink::Pipe => cmd.stdout(Stdio::piped()),
            OutputSink::Discard | OutputSink::File(_) => cmd.stdout(Stdio::null()),
        };

        let mut child = cmd.spawn().map_err(|source| SupervisorError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

        slot.generation += 1;
        let generation = slot.generation;
        let stdout = child.stdout.take();
        let handle = ChildProcessHandle::new(child, role, sink, generation);
        let pid = handle.pid();
        info!(role = %role, pid, generation, "===> {}", argv.join(" "));

        slot.handle = Some(handle);
        slot.state = RoleState::Running;

        Watch {
            slot: Arc::clone(shared),
            role,
            pid,
            generation,
            stdout,
            exits: Arc::clone(&self.exits),
            on_visualization: self.on_visualization.clone(),
            poll_interval: self.config.poll_interval,
        }
        .spawn();

        Ok(pid)
    }

    /// Drains the exits observed by completion watches since the last call.
    pub fn reap(&self) -> Vec<RoleExit> {
        std::mem::take(&mut *self.exits.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Current lifecycle state of `role`.
    pub fn state(&self, role: Role) -> RoleState {
        lock(self.slot(role)).state
    }

    /// Returns true if `role` has a live process.
    pub fn is_running(&self, role: Role) -> bool {
        lock(self.slot(role)).handle.is_some()
    }

    /// Pid of the live process for `role`.
    pub fn pid(&self, role: Role) -> Option<u32> {
        lock(self.slot(role)).handle.as_ref().map(|h| h.pid())
    }

    /// Number of processes ever spawned for `role`.
    pub fn generation(&self, role: Role) -> u64 {
        lock(self.slot(role)).generation
    }

    /// Path of the supervisor-owned scratch image, created on first use and
    /// removed on shutdown.
    pub fn visualization_file(&self) -> SupervisorResult<PathBuf> {
        let mut scratch = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = scratch.as_ref() {
            return Ok(file.path().to_path_buf());
        }
        let file = tempfile::Builder::new()
            .prefix("sox-noise-spectrogram-")
            .suffix(".png")
            .tempfile()?;
        let path = file.path().to_path_buf();
        *scratch = Some(file);
        Ok(path)
    }

    /// Runs `argv` to completion outside the role slots, killing it after
    /// `timeout` (default: the configured run timeout).
    pub fn run_once(&self, argv: &[String], timeout: Option<Duration>) -> SupervisorResult<RunOutput> {
        let (program, args) = argv.split_first().ok_or(SupervisorError::EmptyCommand)?;
        let executable = resolve_executable(program)?;
        info!("===> {}", argv.join(" "));
        run_to_completion(
            program,
            &executable,
            args,
            timeout.unwrap_or(self.config.run_timeout),
            self.config.poll_interval,
            &self.closing,
        )
    }

    /// Like [`run_once`](Self::run_once) but on its own thread; `done`
    /// receives the result there.
    ///
    /// Resolution errors are returned directly. [`shutdown`](Self::shutdown)
    /// kills the run and joins the thread, in which case `done` sees
    /// [`SupervisorError::Cancelled`].
    pub fn run_in_background(
        &self,
        argv: &[String],
        timeout: Option<Duration>,
        done: impl FnOnce(SupervisorResult<RunOutput>) + Send + 'static,
    ) -> SupervisorResult<()> {
        let (program, args) = argv.split_first().ok_or(SupervisorError::EmptyCommand)?;
        let executable = resolve_executable(program)?;
        info!("===> {}", argv.join(" "));
        let program = program.clone();
        let args = args.to_vec();
        let timeout = timeout.unwrap_or(self.config.run_timeout);
        let poll_interval = self.config.poll_interval;
        let closing = Arc::clone(&self.closing);
        let join = thread::Builder::new()
            .name(format!("{}-run", program))
            .spawn(move || {
                done(run_to_completion(
                    &program,
                    &executable,
                    &args,
                    timeout,
                    poll_interval,
                    &closing,
                ))
            })?;
        let mut background = self.background.lock().unwrap_or_else(PoisonError::into_inner);
        background.retain(|join| !join.is_finished());
        background.push(join);
        Ok(())
    }

    /// Stops both roles and releases the scratch image.
    ///
    /// No child spawned by this supervisor outlives this call.
    pub fn shutdown(&self) {
        for role in Role::ALL {
            if let Err(e) = self.stop(role) {
                warn!("{}", e);
            }
        }
        let background: Vec<_> = self
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if !background.is_empty() {
            self.closing.store(true, Ordering::SeqCst);
            for join in background {
                if join.join().is_err() {
                    warn!("background run panicked");
                }
            }
            self.closing.store(false, Ordering::SeqCst);
        }
        let released = self
            .scratch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(file) = released {
            if let Err(e) = file.close() {
                debug!("failed to remove spectrogram scratch file: {}", e);
            }
        }
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Locates `program` on PATH (or validates it when it is a path).
pub fn resolve_executable(program: &str) -> SupervisorResult<PathBuf> {
    which::which(program).map_err(|source| SupervisorError::ExecutableNotFound {
        program: program.to_string(),
        source,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Instant;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn fast() -> SupervisorConfig {
        SupervisorConfig::default()
            .term_timeout(Duration::from_millis(300))
            .kill_timeout(Duration::from_millis(500))
    }

    #[test]
    fn test_start_then_start_again_fails() {
        let supervisor = ProcessSupervisor::with_config(fast());
        let pid = supervisor
            .start(Role::Synthesis, &argv(&["sleep", "30"]), OutputSink::Discard)
            .unwrap();
        assert_eq!(supervisor.state(Role::Synthesis), RoleState::Running);

        let err = supervisor
            .start(Role::Synthesis, &argv(&["sleep", "30"]), OutputSink::Discard)
            .unwrap_err();
        assert!(matches!(err, SupervisorError::AlreadyRunning { pid: p, .. } if p == pid));

        supervisor.stop(Role::Synthesis).unwrap();
        assert_eq!(supervisor.state(Role::Synthesis), RoleState::Idle);
        assert_eq!(supervisor.pid(Role::Synthesis), None);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let supervisor = ProcessSupervisor::with_config(fast());
        supervisor.stop(Role::Visualization).unwrap();
        supervisor.stop(Role::Visualization).unwrap();
        assert_eq!(supervisor.state(Role::Visualization), RoleState::Idle);
    }

    #[test]
    fn test_missing_executable() {
        let supervisor = ProcessSupervisor::with_config(fast());
        let err = supervisor
            .start(
                Role::Synthesis,
                &argv(&["definitely-not-a-real-sox-binary"]),
                OutputSink::Discard,
            )
            .unwrap_err();
        assert!(err.is_spawn_error());
        assert!(!supervisor.is_running(Role::Synthesis));

        let err = supervisor
            .start(Role::Synthesis, &[], OutputSink::Discard)
            .unwrap_err();
        assert!(matches!(err, SupervisorError::EmptyCommand));
    }

    #[test]
    fn test_visualization_pipe_delivery() {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let supervisor = ProcessSupervisor::with_config(fast()).on_visualization(move |out| {
            let _ = tx.lock().unwrap().send(out);
        });

        supervisor
            .start(
                Role::Visualization,
                &argv(&["sh", "-c", "printf PNGDATA"]),
                OutputSink::Pipe,
            )
            .unwrap();

        let out = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(out.generation, 1);
        assert_eq!(
            out.artifact,
            crate::role::VisualizationArtifact::Bytes(b"PNGDATA".to_vec())
        );

        let deadline = Instant::now() + Duration::from_secs(2);
        while supervisor.is_running(Role::Visualization) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!supervisor.is_running(Role::Visualization));
        let exits = supervisor.reap();
        assert_eq!(exits.len(), 1);
        assert!(exits[0].success);
    }

    #[test]
    fn test_scratch_file_released_on_shutdown() {
        let supervisor = ProcessSupervisor::with_config(fast());
        let path = supervisor.visualization_file().unwrap();
        assert_eq!(supervisor.visualization_file().unwrap(), path);
        assert!(path.exists());
        supervisor.shutdown();
        assert!(!path.exists());
    }

    #[test]
    fn test_background_run_reports_result() {
        let supervisor = ProcessSupervisor::with_config(fast());
        let (tx, rx) = mpsc::channel();
        supervisor
            .run_in_background(&argv(&["sh", "-c", "echo rendered >&2"]), None, move |result| {
                let _ = tx.send(result);
            })
            .unwrap();
        let out = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
        assert!(out.stderr.contains("rendered"));
    }

    #[test]
    fn test_shutdown_cancels_background_run() {
        let supervisor = ProcessSupervisor::with_config(fast());
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        supervisor
            .run_in_background(&argv(&["sh", "-c", "exec sleep 30"]), None, move |result| {
                let _ = tx.send(result);
            })
            .unwrap();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(rx.try_recv().is_err());

        supervisor.shutdown();
        let result = rx.try_recv().unwrap();
        assert!(matches!(result, Err(SupervisorError::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_background_run_missing_program() {
        let supervisor = ProcessSupervisor::with_config(fast());
        let err = supervisor
            .run_in_background(&argv(&["definitely-not-a-real-sox-binary"]), None, |_| {})
            .unwrap_err();
        assert!(err.is_spawn_error());
    }
}
