//! Error types for the process supervisor.

use thiserror::Error;

use crate::role::Role;

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Errors that can occur while managing child processes.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The argument vector was empty.
    #[error("cannot start a process from an empty command line")]
    EmptyCommand,

    /// The executable could not be located.
    #[error("executable '{program}' not found. Ensure SoX is installed and in PATH: {source}")]
    ExecutableNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    /// The executable was found but could not be launched.
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called while the role already has a live process.
    #[error("{role} process is already running (pid {pid})")]
    AlreadyRunning { role: Role, pid: u32 },

    /// The process survived both the termination signal and the kill.
    ///
    /// The handle has been discarded regardless.
    #[error("{role} process (pid {pid}) did not exit after being killed")]
    Unresponsive { role: Role, pid: u32 },

    /// Waiting on a child failed.
    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),

    /// A one-shot run exceeded its time limit and was killed.
    #[error("process timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// A one-shot run exited with a non-zero status.
    #[error("process exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// A one-shot run was killed because the supervisor shut down.
    #[error("process cancelled by shutdown")]
    Cancelled,

    /// IO error while preparing process resources.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Returns true for errors raised before any process existed.
    pub fn is_spawn_error(&self) -> bool {
        matches!(
            self,
            SupervisorError::EmptyCommand
                | SupervisorError::ExecutableNotFound { .. }
                | SupervisorError::SpawnFailed { .. }
        )
    }

    /// Stable identifier for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SupervisorError::EmptyCommand => "SUP_001",
            SupervisorError::ExecutableNotFound { .. } => "SUP_002",
            SupervisorError::SpawnFailed { .. } => "SUP_003",
            SupervisorError::AlreadyRunning { .. } => "SUP_004",
            SupervisorError::Unresponsive { .. } => "SUP_005",
            SupervisorError::Wait(_) => "SUP_006",
            SupervisorError::Timeout { .. } => "SUP_007",
            SupervisorError::ProcessFailed { .. } => "SUP_008",
            SupervisorError::Io(_) => "SUP_009",
            SupervisorError::Cancelled => "SUP_010",
        }
    }
}
